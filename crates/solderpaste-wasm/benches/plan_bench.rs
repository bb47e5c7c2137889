//! Criterion benchmarks for pad building and coverage planning.

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use solderpaste_wasm::geometry::{build_pads, Pad, PadShape};
use solderpaste_wasm::planner::plan;

fn board_pads() -> Vec<Pad> {
    let mut pads = Vec::new();
    for row in 0..20 {
        for col in 0..20 {
            let x = f64::from(col) * 2.54;
            let y = f64::from(row) * 2.54;
            let shape = match (row + col) % 3 {
                0 => PadShape::Rectangle {
                    width: 1.2,
                    height: 0.6,
                },
                1 => PadShape::Circle { diameter: 1.0 },
                _ => PadShape::Obround {
                    width: 0.5,
                    height: 1.6,
                },
            };
            pads.push(Pad::new(shape, x, y));
        }
    }
    pads
}

fn plan_bench(c: &mut Criterion) {
    let pads = board_pads();
    let tools = BTreeMap::from([(1, 0.8), (2, 0.5), (3, 0.3), (4, 0.2)]);
    let mut group = c.benchmark_group("plan");
    group.sample_size(10);

    group.bench_function("build_pads", |b| {
        b.iter(|| black_box(build_pads(black_box(&pads), true)))
    });

    let Ok(layer) = build_pads(&pads, true) else {
        return;
    };
    group.bench_function("plan_400_pads", |b| {
        b.iter(|| black_box(plan(black_box(&layer.regions), black_box(&tools))))
    });

    group.finish();
}

criterion_group!(benches, plan_bench);
criterion_main!(benches);
