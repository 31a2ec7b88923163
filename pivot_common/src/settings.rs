//! Robot configuration aggregate.
//!
//! [`RobotSettings`] is built once at startup and shared read-only by every
//! motion primitive. It holds the serializable part of the robot description;
//! the device handles travel separately (see `pivot_kernel::Devices`).
//!
//! # TOML Example
//!
//! ```toml
//! [electronic]
//! speed = 30.0
//! large_motors = true
//!
//! [construction]
//! wheel_diameter = 5.6
//! track_width = 12.0
//! sensor_offset = 6.0
//!
//! [error]
//! k_left_wheel = 1.0
//! k_right_wheel = -1.0
//! k_left_sensor = 1.0
//! k_right_sensor = 1.0
//! tacho_err = 5.0
//!
//! [line]
//! kp = 0.6
//! ki = 0.0
//! kd = 2.0
//! black = 10.0
//! white = 70.0
//! ```

use crate::config::ConfigError;
use crate::consts::DEFAULT_TICK_MS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_coefficient() -> f64 {
    1.0
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}

/// Drive electronics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElectronicSettings {
    /// Top drive speed used by rotations and line following [%].
    pub speed: f64,
    /// Large (true) or medium (false) drive actuators.
    #[serde(default)]
    pub large_motors: bool,
    /// Poll loop period of blocking primitives [ms].
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

/// Physical dimensions, all in the same length unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstructionSettings {
    /// Drive wheel diameter.
    pub wheel_diameter: f64,
    /// Distance between the two wheel contact points.
    pub track_width: f64,
    /// Distance from the drive axle forward to the photodetectors.
    #[serde(default)]
    pub sensor_offset: f64,
}

/// Signed per-channel calibration coefficients.
///
/// Wheel coefficients divide tacho readings and multiply speed commands;
/// sensor coefficients multiply reflectance readings. None may be zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorSettings {
    pub k_left_wheel: f64,
    pub k_right_wheel: f64,
    #[serde(default = "default_coefficient")]
    pub k_alfa_motor: f64,
    #[serde(default = "default_coefficient")]
    pub k_beta_motor: f64,
    pub k_left_sensor: f64,
    pub k_right_sensor: f64,
    #[serde(default = "default_coefficient")]
    pub k_alfa_sensor: f64,
    #[serde(default = "default_coefficient")]
    pub k_beta_sensor: f64,
    /// Tacho slack subtracted from every degree target to absorb coast.
    #[serde(default)]
    pub tacho_err: f64,
}

/// Line regulator gains and reflectance thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineSettings {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Calibrated reflectance below which a sensor sees black.
    pub black: f64,
    /// Calibrated reflectance above which a sensor sees white.
    pub white: f64,
}

impl LineSettings {
    /// Midpoint between the black and white thresholds.
    #[inline]
    pub fn edge(&self) -> f64 {
        (self.black + self.white) / 2.0
    }
}

/// Complete serializable robot description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RobotSettings {
    pub electronic: ElectronicSettings,
    pub construction: ConstructionSettings,
    pub error: ErrorSettings,
    pub line: LineSettings,
}

impl RobotSettings {
    /// Poll loop period as a `Duration`.
    #[inline]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.electronic.tick_ms)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - any calibration coefficient is zero or not finite
    /// - wheel diameter, track width, speed or tick is not positive
    /// - `tacho_err` is negative
    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.error;
        let coefficients = [
            ("k_left_wheel", e.k_left_wheel),
            ("k_right_wheel", e.k_right_wheel),
            ("k_alfa_motor", e.k_alfa_motor),
            ("k_beta_motor", e.k_beta_motor),
            ("k_left_sensor", e.k_left_sensor),
            ("k_right_sensor", e.k_right_sensor),
            ("k_alfa_sensor", e.k_alfa_sensor),
            ("k_beta_sensor", e.k_beta_sensor),
        ];
        for (name, value) in coefficients {
            if value == 0.0 || !value.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a non-zero finite number, got {value}"
                )));
            }
        }

        let positive = [
            ("wheel_diameter", self.construction.wheel_diameter),
            ("track_width", self.construction.track_width),
            ("speed", self.electronic.speed),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if self.electronic.tick_ms == 0 {
            return Err(ConfigError::ValidationError(
                "tick_ms must be positive".to_string(),
            ));
        }
        if e.tacho_err < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "tacho_err cannot be negative, got {}",
                e.tacho_err
            )));
        }
        Ok(())
    }
}
