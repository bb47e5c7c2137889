#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::indexing_slicing)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Solder-paste WASM module — pad geometry, nozzle coverage planning and
//! distance measurement.

pub mod config;
pub mod error;
pub mod geometry;
pub mod measurement;
pub mod planner;

use std::cell::RefCell;
use std::collections::BTreeMap;

use geo::LineString;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::config::{DispenseParams, JobConfig};
use crate::geometry::{build_pads, saturate_u32, BoundingBox, Pad, Point};
use crate::planner::{plan_with_config, CoveragePlan, OffsetKind, ToolId};

thread_local! {
    static LAST_PLAN: RefCell<Option<CoveragePlan>> = const { RefCell::new(None) };
}

fn store_plan(plan: CoveragePlan) {
    LAST_PLAN.with(|p| {
        *p.borrow_mut() = Some(plan);
    });
}

/// A nozzle as passed in from the host.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NozzleSpec {
    /// Tool id.
    pub id: ToolId,
    /// Nozzle diameter.
    pub diameter: f64,
}

/// Per-nozzle summary of a plan.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSummary {
    /// Representative tool id.
    pub id: ToolId,
    /// Rounded nozzle diameter.
    pub diameter: f64,
    /// Offset designation for toolpath generation.
    pub offset: OffsetKind,
    /// Number of pads this nozzle covers.
    pub line_count: u32,
    /// Total dispensing length.
    pub length: f64,
    /// Machine parameters for this nozzle's toolpath.
    pub dispense: DispenseParams,
}

/// Plan metadata returned to the host.
#[derive(Debug, Clone, Serialize)]
pub struct PlanMeta {
    /// `true` when every pad is covered.
    pub complete: bool,
    /// Nozzles that received at least one line, by ascending id.
    pub tools: Vec<ToolSummary>,
    /// Number of pad regions handed to the planner.
    pub region_count: u32,
    /// Number of regions left uncovered.
    pub residual_count: u32,
    /// Bounds of all pads.
    pub bounds: BoundingBox,
    /// Number of warnings.
    pub warning_count: u32,
    /// Warning messages from pad conversion.
    pub warnings: Vec<String>,
}

/// Initialize the WASM module. Sets up the panic hook for debugging.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Plan solder-paste coverage for a set of pads.
///
/// `pads` is an array of [`Pad`] objects, `tools` an array of
/// `{ id, diameter }`, and `config` an optional partial [`JobConfig`].
/// Returns [`PlanMeta`] as a `JsValue`; line buffers are stored internally and
/// retrieved with [`get_dispense_lines`] and [`get_residual_outlines`].
///
/// # Errors
///
/// Returns a descriptive error string if the input cannot be decoded or
/// planning fails.
#[wasm_bindgen]
pub fn plan_pads(pads: JsValue, tools: JsValue, config: JsValue) -> Result<JsValue, JsValue> {
    let pads: Vec<Pad> =
        serde_wasm_bindgen::from_value(pads).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let tools: Vec<NozzleSpec> =
        serde_wasm_bindgen::from_value(tools).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let config: JobConfig = if config.is_undefined() || config.is_null() {
        JobConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))?
    };

    let tools: BTreeMap<ToolId, f64> = tools.iter().map(|t| (t.id, t.diameter)).collect();
    let meta = plan_pads_internal(&pads, &tools, &config).map_err(|e| JsValue::from_str(&e))?;
    serde_wasm_bindgen::to_value(&meta).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Internal planning logic shared between the wasm export and native tests.
#[doc(hidden)]
pub fn plan_pads_internal(
    pads: &[Pad],
    tools: &BTreeMap<ToolId, f64>,
    config: &JobConfig,
) -> Result<PlanMeta, String> {
    config.dispense.validate().map_err(|e| e.to_string())?;
    let layer = build_pads(pads, config.merge_overlapping_pads).map_err(|e| e.to_string())?;
    let plan =
        plan_with_config(&layer.regions, tools, &config.planner).map_err(|e| e.to_string())?;

    let tools = plan
        .assignments
        .iter()
        .map(|(&id, a)| ToolSummary {
            id,
            diameter: a.diameter,
            offset: a.offset,
            line_count: saturate_u32(a.lines.len()),
            length: a.length(),
            dispense: config.dispense.clone(),
        })
        .collect();

    let meta = PlanMeta {
        complete: plan.is_complete(),
        tools,
        region_count: saturate_u32(layer.regions.len()),
        residual_count: saturate_u32(plan.residual().len()),
        bounds: layer.bounds,
        warning_count: saturate_u32(layer.warnings.len()),
        warnings: layer.warnings,
    };

    store_plan(plan);

    Ok(meta)
}

/// Retrieve the dispensing lines of the last plan.
///
/// Returns flattened segments `[x0, y0, x1, y1, ...]`, nozzles in ascending
/// id order. Returns an empty array if nothing has been planned yet.
#[wasm_bindgen]
pub fn get_dispense_lines() -> Vec<f32> {
    LAST_PLAN.with(|p| {
        p.borrow().as_ref().map_or_else(Vec::new, |plan| {
            let mut flat = Vec::new();
            for line in plan.assignments.values().flat_map(|a| &a.lines) {
                for ls in line {
                    push_segments(&mut flat, ls);
                }
            }
            flat
        })
    })
}

/// Retrieve the tool id of every segment returned by [`get_dispense_lines`].
#[wasm_bindgen]
pub fn get_dispense_tools() -> Vec<u32> {
    LAST_PLAN.with(|p| {
        p.borrow().as_ref().map_or_else(Vec::new, |plan| {
            let mut ids = Vec::new();
            for (&id, assignment) in &plan.assignments {
                let segments: usize = assignment
                    .lines
                    .iter()
                    .flat_map(|line| line.iter())
                    .map(|ls| ls.0.len().saturating_sub(1))
                    .sum();
                ids.extend(std::iter::repeat_n(id, segments));
            }
            ids
        })
    })
}

/// Retrieve the outlines of pads the last plan could not cover.
///
/// Returns flattened exterior-ring segments `[x0, y0, x1, y1, ...]`.
/// Returns an empty array if nothing has been planned or every pad is covered.
#[wasm_bindgen]
pub fn get_residual_outlines() -> Vec<f32> {
    LAST_PLAN.with(|p| {
        p.borrow().as_ref().map_or_else(Vec::new, |plan| {
            let mut flat = Vec::new();
            for pad in plan.residual() {
                push_segments(&mut flat, pad.exterior());
            }
            flat
        })
    })
}

/// Measure the distance between two points.
///
/// Returns a [`measurement::Measurement`] as a `JsValue`.
///
/// # Errors
///
/// Returns an error string if the result cannot be serialized.
#[wasm_bindgen]
pub fn measure(x0: f64, y0: f64, x1: f64, y1: f64) -> Result<JsValue, JsValue> {
    let m = measurement::measure(Point::new(x0, y0), Point::new(x1, y1));
    serde_wasm_bindgen::to_value(&m).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[allow(clippy::cast_possible_truncation)]
fn push_segments(flat: &mut Vec<f32>, ls: &LineString<f64>) {
    for seg in ls.lines() {
        flat.push(seg.start.x as f32);
        flat.push(seg.start.y as f32);
        flat.push(seg.end.x as f32);
        flat.push(seg.end.y as f32);
    }
}
