//! Pad polygon construction.
//!
//! This module turns solder-paste pad descriptions (standard aperture shapes
//! flashed at a position, or free outlines) into closed polygons using the
//! shared [`PadBuilder`].

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use geo::orient::{Direction, Orient};
use geo::{unary_union, Area, Coord, LineString, Polygon};
use serde::Deserialize;

use crate::error::PlanError;

use super::types::{saturate_u32, BoundingBox, Point, Region};

const CIRCLE_SEGMENTS: u32 = 32;
const OBROUND_ENDCAP_SEGMENTS: u32 = 16;
const POINT_EQUALITY_EPSILON: f64 = 1e-9;

/// Shape of a single pad, mirroring the standard Gerber apertures.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PadShape {
    /// Round pad.
    Circle {
        /// Outer diameter.
        diameter: f64,
    },
    /// Axis-aligned rectangular pad.
    Rectangle {
        /// Extent along X.
        width: f64,
        /// Extent along Y.
        height: f64,
    },
    /// Stadium-shaped pad; the shorter side is fully rounded.
    Obround {
        /// Extent along X.
        width: f64,
        /// Extent along Y.
        height: f64,
    },
    /// Regular polygon inscribed in a circle of `diameter`.
    Polygon {
        /// Circumscribed diameter.
        diameter: f64,
        /// Number of corners (at least 3).
        vertices: u8,
        /// Rotation in degrees, counter-clockwise.
        #[serde(default)]
        rotation: Option<f64>,
    },
    /// Free outline, vertices relative to the pad position.
    Outline {
        /// Boundary vertices; closed automatically if needed.
        points: Vec<Point>,
    },
}

/// A pad shape placed on the board.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pad {
    /// Pad geometry.
    pub shape: PadShape,
    /// Center (or outline origin) X.
    pub x: f64,
    /// Center (or outline origin) Y.
    pub y: f64,
}

impl Pad {
    /// Places `shape` at `(x, y)`.
    pub const fn new(shape: PadShape, x: f64, y: f64) -> Self {
        Self { shape, x, y }
    }
}

/// Pads converted to planner regions.
#[derive(Debug, Clone)]
pub struct PadLayer {
    /// Regions ready for planning.
    pub regions: Vec<Region>,
    /// Bounding box of all pad polygons.
    pub bounds: BoundingBox,
    /// Number of pads that produced a polygon.
    pub pad_count: u32,
    /// Warning messages generated during conversion.
    pub warnings: Vec<String>,
}

/// Accumulator for pad polygons.
///
/// Passed by mutable reference to [`flash_pad`]; recoverable input defects
/// are recorded as warnings instead of failing the whole layer.
#[derive(Debug)]
pub struct PadBuilder {
    polygons: Vec<Polygon<f64>>,
    bounds: BoundingBox,
    warnings: Vec<String>,
}

impl PadBuilder {
    /// Creates an empty builder.
    pub const fn new() -> Self {
        Self {
            polygons: Vec::new(),
            bounds: BoundingBox::new(),
            warnings: Vec::new(),
        }
    }

    /// Adds a closed polygon from its exterior ring, oriented counter-clockwise.
    pub fn push_polygon(&mut self, exterior: Vec<Coord<f64>>) {
        for c in &exterior {
            self.bounds.update(c.x, c.y);
        }
        let polygon = Polygon::new(LineString::from(exterior), Vec::new());
        self.polygons.push(polygon.orient(Direction::Default));
    }

    /// Records a warning message.
    pub fn warn(&mut self, msg: String) {
        self.warnings.push(msg);
    }

    /// Returns the number of polygons added so far.
    #[must_use]
    pub fn pad_count(&self) -> u32 {
        saturate_u32(self.polygons.len())
    }

    /// Consumes the builder and produces a [`PadLayer`].
    ///
    /// With `merge`, overlapping or touching pads are unioned into one region
    /// each, the way a Gerber paste layer presents its combined geometry.
    pub fn build(self, merge: bool) -> PadLayer {
        let pad_count = saturate_u32(self.polygons.len());
        let regions = if merge && self.polygons.len() > 1 {
            unary_union(&self.polygons)
                .0
                .into_iter()
                .map(Region::Simple)
                .collect()
        } else {
            self.polygons.into_iter().map(Region::Simple).collect()
        };

        PadLayer {
            regions,
            bounds: self.bounds,
            pad_count,
            warnings: self.warnings,
        }
    }
}

impl Default for PadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a [`PadLayer`] from a list of pads.
///
/// # Errors
///
/// Returns the first [`PlanError::InvalidPad`] raised by [`flash_pad`].
pub fn build_pads(pads: &[Pad], merge: bool) -> Result<PadLayer, PlanError> {
    let mut builder = PadBuilder::new();
    for pad in pads {
        flash_pad(&mut builder, pad)?;
    }
    Ok(builder.build(merge))
}

/// Expand one pad into a polygon.
///
/// # Errors
///
/// Returns an error when pad parameters are invalid (non-finite values, or a
/// regular polygon with fewer than three corners).
pub fn flash_pad(builder: &mut PadBuilder, pad: &Pad) -> Result<(), PlanError> {
    if !pad.x.is_finite() || !pad.y.is_finite() {
        return Err(PlanError::InvalidPad(format!(
            "pad position must be finite, got ({}, {})",
            pad.x, pad.y
        )));
    }
    let position = Point::new(pad.x, pad.y);

    match &pad.shape {
        PadShape::Circle { diameter } => flash_circle(builder, *diameter, position),
        PadShape::Rectangle { width, height } => {
            flash_rectangle(builder, *width, *height, position)
        }
        PadShape::Obround { width, height } => flash_obround(builder, *width, *height, position),
        PadShape::Polygon {
            diameter,
            vertices,
            rotation,
        } => flash_polygon(builder, *diameter, *vertices, *rotation, position),
        PadShape::Outline { points } => flash_outline(builder, points, position),
    }
}

fn normalize_dimension(
    builder: &mut PadBuilder,
    value: f64,
    label: &str,
) -> Result<Option<f64>, PlanError> {
    if !value.is_finite() {
        return Err(PlanError::InvalidPad(format!(
            "{label} must be finite, got {value}"
        )));
    }

    let mut normalized = value;
    if normalized < 0.0 {
        builder.warn(format!(
            "{label} is negative ({normalized}); using absolute value"
        ));
        normalized = normalized.abs();
    }

    if normalized <= f64::EPSILON {
        builder.warn(format!("{label} is zero; skipping pad"));
        return Ok(None);
    }

    Ok(Some(normalized))
}

fn flash_circle(builder: &mut PadBuilder, diameter: f64, position: Point) -> Result<(), PlanError> {
    let Some(diameter) = normalize_dimension(builder, diameter, "circle diameter")? else {
        return Ok(());
    };

    builder.push_polygon(ngon(position, diameter / 2.0, CIRCLE_SEGMENTS, 0.0));
    Ok(())
}

fn flash_rectangle(
    builder: &mut PadBuilder,
    width: f64,
    height: f64,
    position: Point,
) -> Result<(), PlanError> {
    let Some(width) = normalize_dimension(builder, width, "rectangle width")? else {
        return Ok(());
    };
    let Some(height) = normalize_dimension(builder, height, "rectangle height")? else {
        return Ok(());
    };

    let half_width = width / 2.0;
    let half_height = height / 2.0;
    builder.push_polygon(vec![
        Coord {
            x: position.x - half_width,
            y: position.y - half_height,
        },
        Coord {
            x: position.x + half_width,
            y: position.y - half_height,
        },
        Coord {
            x: position.x + half_width,
            y: position.y + half_height,
        },
        Coord {
            x: position.x - half_width,
            y: position.y + half_height,
        },
    ]);
    Ok(())
}

fn flash_obround(
    builder: &mut PadBuilder,
    width: f64,
    height: f64,
    position: Point,
) -> Result<(), PlanError> {
    let Some(width) = normalize_dimension(builder, width, "obround width")? else {
        return Ok(());
    };
    let Some(height) = normalize_dimension(builder, height, "obround height")? else {
        return Ok(());
    };

    if (width - height).abs() <= f64::EPSILON {
        builder.push_polygon(ngon(position, width / 2.0, CIRCLE_SEGMENTS, 0.0));
        return Ok(());
    }

    let mut ring = Vec::with_capacity(2 * (OBROUND_ENDCAP_SEGMENTS as usize + 1));
    if width > height {
        let radius = height / 2.0;
        let half_body = (width - height) / 2.0;
        push_arc(
            &mut ring,
            Point::new(position.x + half_body, position.y),
            radius,
            -FRAC_PI_2,
            FRAC_PI_2,
        );
        push_arc(
            &mut ring,
            Point::new(position.x - half_body, position.y),
            radius,
            FRAC_PI_2,
            3.0 * FRAC_PI_2,
        );
    } else {
        let radius = width / 2.0;
        let half_body = (height - width) / 2.0;
        push_arc(
            &mut ring,
            Point::new(position.x, position.y + half_body),
            radius,
            0.0,
            PI,
        );
        push_arc(
            &mut ring,
            Point::new(position.x, position.y - half_body),
            radius,
            PI,
            TAU,
        );
    }

    builder.push_polygon(ring);
    Ok(())
}

fn flash_polygon(
    builder: &mut PadBuilder,
    diameter: f64,
    vertices: u8,
    rotation: Option<f64>,
    position: Point,
) -> Result<(), PlanError> {
    let Some(diameter) = normalize_dimension(builder, diameter, "polygon diameter")? else {
        return Ok(());
    };

    if vertices < 3 {
        return Err(PlanError::InvalidPad(format!(
            "polygon has {vertices} vertices; expected at least 3"
        )));
    }

    let rotation_degrees = rotation.unwrap_or(0.0);
    if !rotation_degrees.is_finite() {
        return Err(PlanError::InvalidPad(format!(
            "polygon rotation must be finite, got {rotation_degrees}"
        )));
    }

    builder.push_polygon(ngon(
        position,
        diameter / 2.0,
        u32::from(vertices),
        rotation_degrees.to_radians(),
    ));
    Ok(())
}

fn flash_outline(
    builder: &mut PadBuilder,
    points: &[Point],
    position: Point,
) -> Result<(), PlanError> {
    if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(PlanError::InvalidPad(
            "outline contains non-finite coordinates".to_string(),
        ));
    }

    let mut distinct: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if !distinct.iter().any(|d| points_approx_equal(*d, *p)) {
            distinct.push(*p);
        }
    }
    if distinct.len() < 3 {
        builder.warn(format!(
            "outline has {} distinct point(s); need at least 3; skipping pad",
            distinct.len()
        ));
        return Ok(());
    }

    let ring: Vec<Coord<f64>> = points
        .iter()
        .map(|p| Coord {
            x: p.x + position.x,
            y: p.y + position.y,
        })
        .collect();
    let outline = Polygon::new(LineString::from(ring.clone()), Vec::new());
    if outline.unsigned_area() <= f64::EPSILON {
        builder.warn("outline encloses no area; skipping pad".to_string());
        return Ok(());
    }

    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Ok(());
    };
    if !points_approx_equal(*first, *last) {
        builder.warn(
            "outline is not closed; auto-closing by appending first point".to_string(),
        );
    }

    builder.push_polygon(ring);
    Ok(())
}

fn ngon(center: Point, radius: f64, segments: u32, rotation: f64) -> Vec<Coord<f64>> {
    (0..segments)
        .map(|i| {
            let angle = rotation + TAU * f64::from(i) / f64::from(segments);
            Coord {
                x: radius.mul_add(angle.cos(), center.x),
                y: radius.mul_add(angle.sin(), center.y),
            }
        })
        .collect()
}

fn push_arc(ring: &mut Vec<Coord<f64>>, center: Point, radius: f64, start: f64, end: f64) {
    let step = (end - start) / f64::from(OBROUND_ENDCAP_SEGMENTS);
    for i in 0..=OBROUND_ENDCAP_SEGMENTS {
        let angle = step.mul_add(f64::from(i), start);
        ring.push(Coord {
            x: radius.mul_add(angle.cos(), center.x),
            y: radius.mul_add(angle.sin(), center.y),
        });
    }
}

fn points_approx_equal(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() <= POINT_EQUALITY_EPSILON && (a.y - b.y).abs() <= POINT_EQUALITY_EPSILON
}

#[cfg(test)]
mod tests {
    use geo::BoundingRect;

    use super::*;

    const EPSILON: f64 = 1e-6;

    fn flash_and_build(shape: PadShape, x: f64, y: f64) -> PadLayer {
        let mut builder = PadBuilder::new();
        let result = flash_pad(&mut builder, &Pad::new(shape, x, y));
        assert!(result.is_ok(), "expected pad flash to succeed");
        builder.build(false)
    }

    fn only_polygon(layer: &PadLayer) -> Option<&Polygon<f64>> {
        match layer.regions.as_slice() {
            [Region::Simple(p)] => Some(p),
            _ => None,
        }
    }

    #[test]
    fn ut_pad_001_circle_vertices_are_expected_distance_from_center() {
        let layer = flash_and_build(PadShape::Circle { diameter: 2.0 }, 5.0, 3.0);
        let polygon = only_polygon(&layer);
        assert!(polygon.is_some(), "expected one polygon");
        if let Some(polygon) = polygon {
            assert_eq!(polygon.exterior().0.len(), 33);
            for c in polygon.exterior().coords() {
                let distance = (c.x - 5.0).hypot(c.y - 3.0);
                assert!((distance - 1.0).abs() < EPSILON);
            }
        }
    }

    #[test]
    fn ut_pad_002_rectangle_bounds_and_area() {
        let layer = flash_and_build(
            PadShape::Rectangle {
                width: 2.0,
                height: 1.0,
            },
            0.0,
            0.0,
        );
        assert!((layer.bounds.min_x + 1.0).abs() < EPSILON);
        assert!((layer.bounds.max_x - 1.0).abs() < EPSILON);
        assert!((layer.bounds.min_y + 0.5).abs() < EPSILON);
        assert!((layer.bounds.max_y - 0.5).abs() < EPSILON);
        let area = only_polygon(&layer).map_or(0.0, |p| p.unsigned_area());
        assert!((area - 2.0).abs() < EPSILON);
    }

    #[test]
    fn ut_pad_003_obround_horizontal_builds_expected_bounds() {
        let layer = flash_and_build(
            PadShape::Obround {
                width: 3.0,
                height: 1.0,
            },
            0.0,
            0.0,
        );
        let rect = only_polygon(&layer).and_then(|p| p.bounding_rect());
        assert!(rect.is_some());
        if let Some(rect) = rect {
            assert!((rect.min().x + 1.5).abs() < EPSILON);
            assert!((rect.max().x - 1.5).abs() < EPSILON);
            assert!((rect.min().y + 0.5).abs() < EPSILON);
            assert!((rect.max().y - 0.5).abs() < EPSILON);
        }
    }

    #[test]
    fn ut_pad_004_obround_vertical_builds_expected_bounds() {
        let layer = flash_and_build(
            PadShape::Obround {
                width: 1.0,
                height: 3.0,
            },
            0.0,
            0.0,
        );
        assert!((layer.bounds.min_x + 0.5).abs() < EPSILON);
        assert!((layer.bounds.max_x - 0.5).abs() < EPSILON);
        assert!((layer.bounds.min_y + 1.5).abs() < EPSILON);
        assert!((layer.bounds.max_y - 1.5).abs() < EPSILON);
    }

    #[test]
    fn ut_pad_005_polygon_applies_rotation() {
        let layer = flash_and_build(
            PadShape::Polygon {
                diameter: 2.0,
                vertices: 6,
                rotation: Some(30.0),
            },
            0.0,
            0.0,
        );
        let polygon = only_polygon(&layer);
        assert!(polygon.is_some());
        if let Some(polygon) = polygon {
            assert_eq!(polygon.exterior().0.len(), 7);
            let has_rotated_corner = polygon.exterior().coords().any(|c| {
                (c.x - 30.0_f64.to_radians().cos()).abs() < EPSILON
                    && (c.y - 30.0_f64.to_radians().sin()).abs() < EPSILON
            });
            assert!(has_rotated_corner);
        }
    }

    #[test]
    fn ut_pad_006_polygon_with_two_vertices_is_rejected() {
        let mut builder = PadBuilder::new();
        let result = flash_pad(
            &mut builder,
            &Pad::new(
                PadShape::Polygon {
                    diameter: 1.0,
                    vertices: 2,
                    rotation: None,
                },
                0.0,
                0.0,
            ),
        );
        assert!(matches!(result, Err(PlanError::InvalidPad(_))));
    }

    #[test]
    fn ut_pad_007_zero_diameter_circle_skips_with_warning() {
        let layer = flash_and_build(PadShape::Circle { diameter: 0.0 }, 0.0, 0.0);
        assert!(layer.regions.is_empty());
        assert_eq!(layer.pad_count, 0);
        assert!(layer.warnings.iter().any(|msg| msg.contains("zero")));
    }

    #[test]
    fn ut_pad_008_negative_rectangle_dimensions_use_abs_with_warning() {
        let layer = flash_and_build(
            PadShape::Rectangle {
                width: -2.0,
                height: -1.0,
            },
            0.0,
            0.0,
        );
        assert_eq!(layer.pad_count, 1);
        assert!((layer.bounds.min_x + 1.0).abs() < EPSILON);
        assert!((layer.bounds.max_y - 0.5).abs() < EPSILON);
        assert!(layer.warnings.iter().any(|msg| msg.contains("negative")));
    }

    #[test]
    fn ut_pad_009_non_finite_dimension_is_an_error() {
        let mut builder = PadBuilder::new();
        let result = flash_pad(
            &mut builder,
            &Pad::new(PadShape::Circle { diameter: f64::NAN }, 0.0, 0.0),
        );
        assert!(matches!(result, Err(PlanError::InvalidPad(_))));
    }

    #[test]
    fn ut_pad_010_unclosed_outline_auto_closes_with_warning() {
        let layer = flash_and_build(
            PadShape::Outline {
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(1.0, 0.0),
                    Point::new(1.0, 1.0),
                    Point::new(0.0, 1.0),
                ],
            },
            10.0,
            20.0,
        );
        assert!(layer.warnings.iter().any(|w| w.contains("auto-closing")));
        assert!((layer.bounds.min_x - 10.0).abs() < EPSILON);
        assert!((layer.bounds.max_y - 21.0).abs() < EPSILON);
        let closed = only_polygon(&layer).is_some_and(|p| p.exterior().is_closed());
        assert!(closed);
    }

    #[test]
    fn ut_pad_011_two_point_outline_skips_with_warning() {
        let layer = flash_and_build(
            PadShape::Outline {
                points: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
            },
            0.0,
            0.0,
        );
        assert!(layer.regions.is_empty());
        assert!(layer.warnings.iter().any(|w| w.contains("2 distinct point(s)")));
    }

    #[test]
    fn ut_pad_012_clockwise_outline_is_reoriented() {
        let layer = flash_and_build(
            PadShape::Outline {
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(0.0, 1.0),
                    Point::new(1.0, 1.0),
                    Point::new(1.0, 0.0),
                    Point::new(0.0, 0.0),
                ],
            },
            0.0,
            0.0,
        );
        let signed = only_polygon(&layer).map_or(0.0, |p| p.signed_area());
        assert!(signed > 0.0, "exterior should be counter-clockwise");
    }

    #[test]
    fn ut_pad_013_overlapping_pads_merge_into_one_region() {
        let pads = vec![
            Pad::new(
                PadShape::Rectangle {
                    width: 2.0,
                    height: 2.0,
                },
                0.0,
                0.0,
            ),
            Pad::new(
                PadShape::Rectangle {
                    width: 2.0,
                    height: 2.0,
                },
                1.0,
                0.0,
            ),
            Pad::new(
                PadShape::Rectangle {
                    width: 2.0,
                    height: 2.0,
                },
                10.0,
                0.0,
            ),
        ];
        let merged = build_pads(&pads, true);
        assert!(merged.is_ok());
        if let Ok(layer) = merged {
            assert_eq!(layer.pad_count, 3);
            assert_eq!(layer.regions.len(), 2);
        }

        let separate = build_pads(&pads, false);
        assert!(separate.is_ok_and(|layer| layer.regions.len() == 3));
    }

    #[test]
    fn ut_pad_014_closed_two_vertex_outline_skips_with_warning() {
        let layer = flash_and_build(
            PadShape::Outline {
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(1.0, 0.0),
                    Point::new(0.0, 0.0),
                ],
            },
            0.0,
            0.0,
        );
        assert!(layer.regions.is_empty());
        assert_eq!(layer.pad_count, 0);
        assert_eq!(layer.warnings.len(), 1);
        assert!(layer.warnings.iter().any(|w| w.contains("2 distinct point(s)")));
    }

    #[test]
    fn ut_pad_015_collinear_outline_skips_with_warning() {
        let layer = flash_and_build(
            PadShape::Outline {
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(1.0, 1.0),
                    Point::new(2.0, 2.0),
                ],
            },
            0.0,
            0.0,
        );
        assert!(layer.regions.is_empty());
        assert_eq!(layer.warnings.len(), 1);
        assert!(layer.warnings.iter().any(|w| w.contains("no area")));
    }

    #[test]
    fn ut_pad_016_repeated_outline_vertex_is_kept() {
        let layer = flash_and_build(
            PadShape::Outline {
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(2.0, 0.0),
                    Point::new(2.0, 0.0),
                    Point::new(2.0, 2.0),
                    Point::new(0.0, 0.0),
                ],
            },
            0.0,
            0.0,
        );
        assert_eq!(layer.pad_count, 1);
        assert!(layer.warnings.is_empty());
    }
}
