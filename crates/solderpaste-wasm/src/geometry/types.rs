//! Core geometry types shared by the pad builder and the planner.

use geo::{Area, BoundingRect, Coord, CoordsIter, MultiPolygon, Polygon, Rect, Validation};
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// 2D point in board coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Point> for Coord<f64> {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<Coord<f64>> for Point {
    fn from(c: Coord<f64>) -> Self {
        Self { x: c.x, y: c.y }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    /// Minimum X coordinate.
    pub min_x: f64,
    /// Minimum Y coordinate.
    pub min_y: f64,
    /// Maximum X coordinate.
    pub max_x: f64,
    /// Maximum Y coordinate.
    pub max_y: f64,
}

impl BoundingBox {
    /// Creates an empty bounding box that will expand with the first `update` call.
    pub const fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Expands the bounding box to include the given point.
    pub fn update(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Expands the bounding box to include another box.
    pub fn merge(&mut self, other: &Self) {
        if other.is_empty() {
            return;
        }
        self.update(other.min_x, other.min_y);
        self.update(other.max_x, other.max_y);
    }

    /// Returns `true` until at least one point has been added.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Extent along X.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Extent along Y.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        }
    }
}

/// A pad to be covered with solder paste.
///
/// Multi-part inputs are kept as `Composite` and split into their simple
/// polygons with [`Region::flatten`] before planning.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    /// One closed polygon.
    Simple(Polygon<f64>),
    /// A collection of polygons handed over as one object.
    Composite(Vec<Polygon<f64>>),
}

impl Region {
    /// Flattens a region list into its constituent simple polygons, preserving order.
    pub fn flatten(regions: &[Self]) -> Vec<Polygon<f64>> {
        let mut flat = Vec::with_capacity(regions.len());
        for region in regions {
            match region {
                Self::Simple(polygon) => flat.push(polygon.clone()),
                Self::Composite(parts) => flat.extend(parts.iter().cloned()),
            }
        }
        flat
    }
}

impl From<Polygon<f64>> for Region {
    fn from(polygon: Polygon<f64>) -> Self {
        Self::Simple(polygon)
    }
}

impl From<MultiPolygon<f64>> for Region {
    fn from(multi: MultiPolygon<f64>) -> Self {
        Self::Composite(multi.0)
    }
}

/// Converts a count to `u32`, saturating at `u32::MAX`.
pub fn saturate_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Validates a region polygon and returns its bounding box.
///
/// # Errors
///
/// Returns [`PlanError::InvalidInputGeometry`] when a coordinate is not
/// finite, the exterior ring has fewer than three distinct vertices, a ring
/// crosses itself, or the polygon encloses no area.
pub fn region_bounds(polygon: &Polygon<f64>) -> Result<BoundingBox, PlanError> {
    if polygon
        .coords_iter()
        .any(|c| !c.x.is_finite() || !c.y.is_finite())
    {
        return Err(PlanError::InvalidInputGeometry(
            "polygon has non-finite coordinates".to_string(),
        ));
    }

    let mut distinct: Vec<Coord<f64>> = Vec::new();
    for c in polygon.exterior().coords() {
        if !distinct.contains(c) {
            distinct.push(*c);
        }
    }
    if distinct.len() < 3 {
        return Err(PlanError::InvalidInputGeometry(format!(
            "polygon exterior has {} distinct vertices; need at least 3",
            distinct.len()
        )));
    }

    polygon.check_validation().map_err(|problem| {
        PlanError::InvalidInputGeometry(format!("polygon is invalid: {problem}"))
    })?;

    if polygon.unsigned_area() <= f64::EPSILON {
        return Err(PlanError::InvalidInputGeometry(
            "polygon encloses no area".to_string(),
        ));
    }

    let bounds = polygon
        .bounding_rect()
        .map(BoundingBox::from)
        .ok_or_else(|| PlanError::InvalidInputGeometry("polygon has no bounds".to_string()))?;

    if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
        return Err(PlanError::InvalidInputGeometry(
            "polygon bounding box has zero area".to_string(),
        ));
    }

    Ok(bounds)
}
