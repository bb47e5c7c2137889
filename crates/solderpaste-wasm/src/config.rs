//! Planner tunables and dispensing parameters.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::geometry::Point;

/// Default rounding precision for nozzle diameters.
pub const DEFAULT_DIAMETER_DECIMALS: u32 = 4;
/// Default rounding precision for the diagonal-length tie-break.
pub const DEFAULT_DIAGONAL_DECIMALS: u32 = 2;
/// Postprocessor used when the host names none.
pub const DEFAULT_POSTPROCESSOR: &str = "Paste_1";

const MAX_DECIMALS: u32 = 10;

/// Configuration of the coverage planner itself.
///
/// Every field has a default, so a host may pass a partial object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Decimals kept when comparing nozzle diameters; equal values collapse.
    pub diameter_decimals: u32,
    /// Decimals kept when comparing the two diagonal lengths inside a pad.
    pub diagonal_decimals: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            diameter_decimals: DEFAULT_DIAMETER_DECIMALS,
            diagonal_decimals: DEFAULT_DIAGONAL_DECIMALS,
        }
    }
}

impl PlannerConfig {
    /// Checks that rounding precisions are usable.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidConfig`] when a precision exceeds ten decimals.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.diameter_decimals > MAX_DECIMALS {
            return Err(PlanError::InvalidConfig(format!(
                "diameter_decimals must be at most {MAX_DECIMALS}, got {}",
                self.diameter_decimals
            )));
        }
        if self.diagonal_decimals > MAX_DECIMALS {
            return Err(PlanError::InvalidConfig(format!(
                "diagonal_decimals must be at most {MAX_DECIMALS}, got {}",
                self.diagonal_decimals
            )));
        }
        Ok(())
    }
}

/// Machine parameters handed with each nozzle to toolpath generation.
///
/// Heights are in board units, feedrates in units per minute, dwells in
/// seconds. Speeds drive the paste dispenser motor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispenseParams {
    /// Height at which dispensing starts.
    pub z_start: f64,
    /// Height while dispensing.
    pub z_dispense: f64,
    /// Height at which dispensing stops.
    pub z_stop: f64,
    /// Height for travel between pads.
    pub z_travel: f64,
    /// Height for a nozzle change.
    pub z_toolchange: f64,
    /// X-Y position for a nozzle change.
    pub xy_toolchange: Point,
    /// Feedrate on the X-Y plane.
    pub frxy: f64,
    /// Feedrate along Z.
    pub frz: f64,
    /// Feedrate along Z while descending to the dispense height.
    pub frz_dispense: f64,
    /// Dispenser speed while pushing paste.
    pub speedfwd: f64,
    /// Pause after dispensing.
    pub dwellfwd: f64,
    /// Dispenser speed while retracting paste.
    pub speedrev: f64,
    /// Pause after retracting, for pressure to settle.
    pub dwellrev: f64,
    /// Postprocessor name.
    pub pp: String,
}

impl Default for DispenseParams {
    fn default() -> Self {
        Self {
            z_start: 0.05,
            z_dispense: 0.1,
            z_stop: 0.05,
            z_travel: 0.1,
            z_toolchange: 1.0,
            xy_toolchange: Point::new(0.0, 0.0),
            frxy: 150.0,
            frz: 100.0,
            frz_dispense: 1.0,
            speedfwd: 300.0,
            dwellfwd: 1.0,
            speedrev: 200.0,
            dwellrev: 1.0,
            pp: DEFAULT_POSTPROCESSOR.to_string(),
        }
    }
}

impl DispenseParams {
    /// Checks that every value is finite and rates, speeds and dwells are not negative.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), PlanError> {
        let heights = [
            ("z_start", self.z_start),
            ("z_dispense", self.z_dispense),
            ("z_stop", self.z_stop),
            ("z_travel", self.z_travel),
            ("z_toolchange", self.z_toolchange),
            ("xy_toolchange.x", self.xy_toolchange.x),
            ("xy_toolchange.y", self.xy_toolchange.y),
        ];
        let rates = [
            ("frxy", self.frxy),
            ("frz", self.frz),
            ("frz_dispense", self.frz_dispense),
            ("speedfwd", self.speedfwd),
            ("dwellfwd", self.dwellfwd),
            ("speedrev", self.speedrev),
            ("dwellrev", self.dwellrev),
        ];

        for (name, value) in heights.iter().chain(rates.iter()) {
            if !value.is_finite() {
                return Err(PlanError::InvalidConfig(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        for (name, value) in rates {
            if value < 0.0 {
                return Err(PlanError::InvalidConfig(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }
        if self.pp.trim().is_empty() {
            return Err(PlanError::InvalidConfig(
                "pp must name a postprocessor".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything a host passes alongside pads and nozzles.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Planner tunables.
    pub planner: PlannerConfig,
    /// Union overlapping pads before planning; read by pad building only.
    pub merge_overlapping_pads: bool,
    /// Machine parameters attached to every nozzle in the result.
    pub dispense: DispenseParams,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            planner: PlannerConfig::default(),
            merge_overlapping_pads: true,
            dispense: DispenseParams::default(),
        }
    }
}

impl JobConfig {
    /// Validates the planner and dispensing sections.
    ///
    /// # Errors
    ///
    /// Returns the first [`PlanError::InvalidConfig`] found.
    pub fn validate(&self) -> Result<(), PlanError> {
        self.planner.validate()?;
        self.dispense.validate()
    }
}

/// Rounds `value` to `decimals` places, half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10_f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tool_table_precision() {
        let config = PlannerConfig::default();
        assert_eq!(config.diameter_decimals, 4);
        assert_eq!(config.diagonal_decimals, 2);
        assert!(config.validate().is_ok());
        assert!(JobConfig::default().merge_overlapping_pads);
    }

    #[test]
    fn excessive_precision_is_rejected() {
        let config = PlannerConfig {
            diagonal_decimals: 11,
            ..PlannerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PlanError::InvalidConfig(_))
        ));
    }

    #[test]
    fn round_to_four_decimals() {
        assert!((round_to(0.123_456, 4) - 0.1235).abs() < 1e-12);
        assert!((round_to(1.0, 4) - 1.0).abs() < f64::EPSILON);
        assert!((round_to(14.142_135, 2) - 14.14).abs() < 1e-12);
    }

    #[test]
    fn dispense_defaults() {
        let params = DispenseParams::default();
        assert!((params.z_start - 0.05).abs() < f64::EPSILON);
        assert!((params.z_dispense - 0.1).abs() < f64::EPSILON);
        assert!((params.z_stop - 0.05).abs() < f64::EPSILON);
        assert!((params.z_travel - 0.1).abs() < f64::EPSILON);
        assert!((params.z_toolchange - 1.0).abs() < f64::EPSILON);
        assert_eq!(params.xy_toolchange, Point::new(0.0, 0.0));
        assert!((params.frxy - 150.0).abs() < f64::EPSILON);
        assert!((params.frz - 100.0).abs() < f64::EPSILON);
        assert!((params.frz_dispense - 1.0).abs() < f64::EPSILON);
        assert!((params.speedfwd - 300.0).abs() < f64::EPSILON);
        assert!((params.dwellfwd - 1.0).abs() < f64::EPSILON);
        assert!((params.speedrev - 200.0).abs() < f64::EPSILON);
        assert!((params.dwellrev - 1.0).abs() < f64::EPSILON);
        assert_eq!(params.pp, "Paste_1");
        assert!(params.validate().is_ok());
    }

    #[test]
    fn dispense_rejects_negative_rate_and_nan_height() {
        let negative = DispenseParams {
            frxy: -1.0,
            ..DispenseParams::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(PlanError::InvalidConfig(msg)) if msg.contains("frxy")
        ));

        let nan = DispenseParams {
            z_travel: f64::NAN,
            ..DispenseParams::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(PlanError::InvalidConfig(msg)) if msg.contains("z_travel")
        ));

        let unnamed = DispenseParams {
            pp: "  ".to_string(),
            ..DispenseParams::default()
        };
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn job_config_validates_both_sections() {
        let config = JobConfig {
            planner: PlannerConfig {
                diameter_decimals: 12,
                ..PlannerConfig::default()
            },
            ..JobConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(JobConfig::default().validate().is_ok());
    }
}
