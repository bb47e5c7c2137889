//! Placement of one dispensing line inside one pad.

use geo::{
    BooleanOps, Buffer, Coord, Euclidean, HasDimensions, Length, LineString, MultiLineString,
    Polygon,
};

use crate::config::round_to;
use crate::error::CoverageFailure;
use crate::geometry::BoundingBox;

/// Builds the dispensing line for `pad` with a nozzle of radius `offset`.
///
/// The line follows whichever bounding-box diagonal runs longer inside the
/// pad. When both diagonals measure the same at `diagonal_decimals`, the pad
/// is box-like and the axis-aligned centerline along its long side is used
/// instead. Either candidate is then clipped to the pad eroded by `offset`, so
/// the nozzle never reaches the pad edge.
///
/// # Errors
///
/// [`CoverageFailure::OffsetTooLarge`] when the centerline fallback applies and
/// `offset` reaches half the width or height; [`CoverageFailure::GeometryDegenerate`]
/// when erosion or clipping leaves nothing of positive length.
pub fn construct_dispense_line(
    pad: &Polygon<f64>,
    bounds: &BoundingBox,
    offset: f64,
    diagonal_decimals: u32,
) -> Result<MultiLineString<f64>, CoverageFailure> {
    let rising = segment(bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y);
    let falling = segment(bounds.min_x, bounds.max_y, bounds.max_x, bounds.min_y);

    let rising_inside = pad.clip(&rising, false);
    let falling_inside = pad.clip(&falling, false);
    let rising_len = round_to(Euclidean.length(&rising_inside), diagonal_decimals);
    let falling_len = round_to(Euclidean.length(&falling_inside), diagonal_decimals);

    let candidate = if same_length(rising_len, falling_len, diagonal_decimals) {
        centerline(bounds, offset)?
    } else if rising_len > falling_len {
        rising_inside
    } else {
        falling_inside
    };

    let eroded = pad.buffer(-offset);
    if eroded.is_empty() {
        return Err(CoverageFailure::GeometryDegenerate);
    }

    let line = eroded.clip(&candidate, false);
    if line.is_empty() || Euclidean.length(&line) <= 0.0 {
        return Err(CoverageFailure::GeometryDegenerate);
    }

    Ok(line)
}

fn centerline(bounds: &BoundingBox, offset: f64) -> Result<MultiLineString<f64>, CoverageFailure> {
    let width = bounds.width();
    let height = bounds.height();

    if offset >= width / 2.0 || offset >= height / 2.0 {
        return Err(CoverageFailure::OffsetTooLarge);
    }

    if width > height {
        let y = bounds.min_y + height / 2.0;
        Ok(segment(bounds.min_x, y, bounds.min_x + width, y))
    } else {
        let x = bounds.min_x + width / 2.0;
        Ok(segment(x, bounds.min_y, x, bounds.min_y + height))
    }
}

fn segment(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiLineString<f64> {
    MultiLineString::new(vec![LineString::new(vec![
        Coord { x: x0, y: y0 },
        Coord { x: x1, y: y1 },
    ])])
}

// Both inputs are already rounded, so any real difference is at least one unit
// in the last kept decimal.
fn same_length(a: f64, b: f64, decimals: u32) -> bool {
    (a - b).abs() < 0.5 * 10_f64.powi(-i32::try_from(decimals).unwrap_or(i32::MAX))
}
