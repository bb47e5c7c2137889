//! Greedy solder-paste coverage planner.
//!
//! Nozzles are tried largest first. Each pad that gets a dispensing line from
//! the current nozzle is tagged with that nozzle's id; the rest are carried to
//! the next, smaller nozzle. Planning stops as soon as every pad is covered.

pub mod line;
pub mod tools;

use std::collections::BTreeMap;

use geo::{Euclidean, Length, MultiLineString, Polygon};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::error::PlanError;
use crate::geometry::{region_bounds, BoundingBox, Region};

pub use line::construct_dispense_line;
pub use tools::{working_tools, NozzleTable, ToolId, WorkingTool};

/// How downstream toolpath generation treats the dispensing lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OffsetKind {
    /// Follow the line itself, with no lateral offset.
    Path,
}

/// Lines produced by one nozzle, plus the descriptive fields a toolpath
/// generator expects.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageAssignment {
    /// Nozzle diameter, rounded.
    pub diameter: f64,
    /// Offset designation; always [`OffsetKind::Path`].
    pub offset: OffsetKind,
    /// Lateral offset value; always 0.
    pub offset_value: f64,
    /// Placeholder for the geometry type; empty.
    pub kind: String,
    /// Placeholder for the tool type; empty.
    pub tool_kind: String,
    /// Placeholder for processing parameters; empty.
    pub data: BTreeMap<String, String>,
    /// One entry per covered pad, in pad order.
    pub lines: Vec<MultiLineString<f64>>,
}

impl CoverageAssignment {
    fn new(diameter: f64) -> Self {
        Self {
            diameter,
            offset: OffsetKind::Path,
            offset_value: 0.0,
            kind: String::new(),
            tool_kind: String::new(),
            data: BTreeMap::new(),
            lines: Vec::new(),
        }
    }

    /// Total dispensing length across all lines.
    pub fn length(&self) -> f64 {
        self.lines.iter().map(|l| Euclidean.length(l)).sum()
    }
}

/// Outcome of a planning run.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverageStatus {
    /// Every pad received a dispensing line.
    Complete,
    /// Nozzles ran out; the listed pads are still uncovered, in input order.
    Incomplete(Vec<Polygon<f64>>),
}

/// Result of [`plan`]: per-nozzle assignments and the overall status.
#[derive(Debug, Clone, PartialEq)]
pub struct CoveragePlan {
    /// Assignments keyed by representative nozzle id.
    pub assignments: BTreeMap<ToolId, CoverageAssignment>,
    /// Whether any pad was left uncovered.
    pub status: CoverageStatus,
}

impl CoveragePlan {
    /// Returns `true` when no pad is left uncovered.
    pub const fn is_complete(&self) -> bool {
        matches!(self.status, CoverageStatus::Complete)
    }

    /// Pads left uncovered; empty on success.
    pub fn residual(&self) -> &[Polygon<f64>] {
        match &self.status {
            CoverageStatus::Complete => &[],
            CoverageStatus::Incomplete(residual) => residual,
        }
    }

    /// Number of dispensing lines over all nozzles.
    pub fn line_count(&self) -> usize {
        self.assignments.values().map(|a| a.lines.len()).sum()
    }
}

/// Plans coverage with the default [`PlannerConfig`].
///
/// # Errors
///
/// See [`plan_with_config`].
pub fn plan(
    regions: &[Region],
    tools: &BTreeMap<ToolId, f64>,
) -> Result<CoveragePlan, PlanError> {
    plan_with_config(regions, tools, &PlannerConfig::default())
}

/// Assigns every pad in `regions` to the largest nozzle that can dispense
/// inside it.
///
/// Composite regions are split into their polygons first. Running out of
/// nozzles is not an error; it yields [`CoverageStatus::Incomplete`].
///
/// # Errors
///
/// - [`PlanError::InvalidConfig`] for out-of-range precisions.
/// - [`PlanError::NoToolsAvailable`] when no nozzle has a positive diameter.
/// - [`PlanError::InvalidInputGeometry`] when a pad polygon is malformed.
pub fn plan_with_config(
    regions: &[Region],
    tools: &BTreeMap<ToolId, f64>,
    config: &PlannerConfig,
) -> Result<CoveragePlan, PlanError> {
    config.validate()?;

    let working = working_tools(tools, config.diameter_decimals);
    if working.is_empty() {
        return Err(PlanError::NoToolsAvailable);
    }

    let mut residual: Vec<(Polygon<f64>, BoundingBox)> = Region::flatten(regions)
        .into_iter()
        .map(|pad| region_bounds(&pad).map(|bounds| (pad, bounds)))
        .collect::<Result<_, _>>()?;

    let pad_count = residual.len();
    let mut assignments: BTreeMap<ToolId, CoverageAssignment> = BTreeMap::new();

    for tool in &working {
        if residual.is_empty() {
            break;
        }

        let offset = tool.offset();
        let mut deferred = Vec::with_capacity(residual.len());
        let mut covered = 0_usize;

        for (pad, bounds) in residual {
            match construct_dispense_line(&pad, &bounds, offset, config.diagonal_decimals) {
                Ok(line) => {
                    assignments
                        .entry(tool.id)
                        .or_insert_with(|| CoverageAssignment::new(tool.diameter))
                        .lines
                        .push(line);
                    covered += 1;
                }
                Err(failure) => {
                    debug!(tool = tool.id, offset, %failure, "pad deferred to smaller nozzle");
                    deferred.push((pad, bounds));
                }
            }
        }

        debug!(
            tool = tool.id,
            diameter = tool.diameter,
            covered,
            remaining = deferred.len(),
            "coverage round finished"
        );
        residual = deferred;
    }

    if residual.is_empty() {
        info!(pads = pad_count, tools = assignments.len(), "all pads covered");
        return Ok(CoveragePlan {
            assignments,
            status: CoverageStatus::Complete,
        });
    }

    warn!(
        uncovered = residual.len(),
        pads = pad_count,
        "nozzles exhausted before every pad was covered"
    );
    Ok(CoveragePlan {
        assignments,
        status: CoverageStatus::Incomplete(residual.into_iter().map(|(pad, _)| pad).collect()),
    })
}
