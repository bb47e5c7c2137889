//! Two-click distance measurement on the board canvas.

use serde::Serialize;

use crate::geometry::Point;

/// Grid the pointer snaps to while measuring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSnap {
    /// Grid pitch along X; non-positive disables snapping on this axis.
    pub step_x: f64,
    /// Grid pitch along Y; non-positive disables snapping on this axis.
    pub step_y: f64,
}

impl GridSnap {
    /// Creates a grid with the given pitches.
    pub const fn new(step_x: f64, step_y: f64) -> Self {
        Self { step_x, step_y }
    }

    /// Moves `point` to the nearest grid node.
    pub fn snap(&self, point: Point) -> Point {
        Point::new(snap_axis(point.x, self.step_x), snap_axis(point.y, self.step_y))
    }
}

fn snap_axis(value: f64, step: f64) -> f64 {
    if step.is_finite() && step > 0.0 {
        (value / step).round() * step
    } else {
        value
    }
}

/// Distance between two points, split per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    /// First point.
    pub start: Point,
    /// Second point.
    pub end: Point,
    /// Absolute X distance.
    pub dx: f64,
    /// Absolute Y distance.
    pub dy: f64,
    /// Euclidean distance.
    pub distance: f64,
}

/// Measures from `start` to `end`.
pub fn measure(start: Point, end: Point) -> Measurement {
    let dx = (end.x - start.x).abs();
    let dy = (end.y - start.y).abs();
    Measurement {
        start,
        end,
        dx,
        dy,
        distance: dx.hypot(dy),
    }
}

/// Where a [`MeasurementSession`] stands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasurementState {
    /// Waiting for the start point.
    Idle,
    /// Start point placed, waiting for the end point.
    Started(Point),
    /// Both points placed.
    Done(Measurement),
}

/// Interactive measurement driven by pointer events.
///
/// The first click fixes the start, pointer moves report a live measurement,
/// and the second click completes it. Later clicks are ignored until
/// [`MeasurementSession::cancel`] resets the session.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSession {
    state: MeasurementState,
    snap: Option<GridSnap>,
}

impl Default for MeasurementSession {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MeasurementSession {
    /// Starts an idle session, optionally snapping every point to a grid.
    pub const fn new(snap: Option<GridSnap>) -> Self {
        Self {
            state: MeasurementState::Idle,
            snap,
        }
    }

    /// Current state.
    pub const fn state(&self) -> &MeasurementState {
        &self.state
    }

    /// Handles a click; returns the finished measurement on the second click.
    pub fn click(&mut self, at: Point) -> Option<Measurement> {
        let at = self.snapped(at);
        match self.state {
            MeasurementState::Idle => {
                self.state = MeasurementState::Started(at);
                None
            }
            MeasurementState::Started(start) => {
                let result = measure(start, at);
                self.state = MeasurementState::Done(result);
                Some(result)
            }
            MeasurementState::Done(_) => None,
        }
    }

    /// Handles a pointer move; returns the rubber-band measurement while the
    /// start point is placed.
    pub fn hover(&self, at: Point) -> Option<Measurement> {
        match self.state {
            MeasurementState::Started(start) => Some(measure(start, self.snapped(at))),
            MeasurementState::Idle | MeasurementState::Done(_) => None,
        }
    }

    /// Drops any placed points.
    pub fn cancel(&mut self) {
        self.state = MeasurementState::Idle;
    }

    fn snapped(&self, at: Point) -> Point {
        self.snap.map_or(at, |grid| grid.snap(at))
    }
}
