//! Error types for pad building and coverage planning.

use thiserror::Error;

/// Errors surfaced to the caller of the planner and the pad builder.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// No tool with a strictly positive diameter was supplied.
    #[error("no nozzle tools available: at least one positive diameter is required")]
    NoToolsAvailable,

    /// A region polygon is malformed (non-finite, degenerate or empty).
    #[error("invalid input geometry: {0}")]
    InvalidInputGeometry(String),

    /// A pad description could not be turned into a polygon.
    #[error("invalid pad: {0}")]
    InvalidPad(String),

    /// A comma-separated nozzle diameter list could not be parsed.
    #[error("invalid tool list: {0}")]
    InvalidToolList(String),

    /// Planner configuration is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Rejections from [`crate::planner::NozzleTable`] edits.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ToolTableError {
    /// Diameter is zero after rounding.
    #[error("nozzle diameter must be non-zero")]
    ZeroDiameter,

    /// Diameter is NaN or infinite.
    #[error("nozzle diameter must be finite")]
    NonFiniteDiameter,

    /// A nozzle with the same rounded diameter is already in the table.
    #[error("nozzle diameter {0} is already in the tool table")]
    Duplicate(f64),

    /// No nozzle with this id exists.
    #[error("no nozzle with id {0}")]
    UnknownTool(u32),
}

/// Why a single region could not be covered by the current nozzle.
///
/// Never surfaced on its own: the planner defers the region to the next,
/// smaller nozzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CoverageFailure {
    /// Half the nozzle diameter reaches the pad's half-width.
    #[error("offset too large for pad")]
    OffsetTooLarge,

    /// Erosion or clipping left nothing to dispense along.
    #[error("degenerate dispense geometry")]
    GeometryDegenerate,
}
