//! Simulator configuration file.
//!
//! One TOML document describes the robot, the floor and the routine:
//!
//! ```toml
//! [shared]
//! service_name = "pivot-sim"
//!
//! [robot.electronic]
//! speed = 30.0
//! # ... remaining [robot.*] groups as in RobotSettings
//!
//! [body]
//! sensor_spacing = 4.0
//!
//! [start]
//! x = 0.0
//! y = 0.0
//! heading = 0.0
//!
//! [course]
//! [[course.strips]]
//! from = [40.0, -50.0]
//! to = [40.0, 50.0]
//! width = 2.0
//!
//! [[routine]]
//! action = "drive"
//! left = 30.0
//! right = 30.0
//! until = { kind = "black", side = "both" }
//! ```

use pivot_common::config::{ConfigError, SharedConfig};
use pivot_common::settings::RobotSettings;
use serde::{Deserialize, Serialize};

use crate::course::Course;
use crate::routine::Step;
use crate::world::{Body, Pose};

/// Which auxiliary devices the simulated robot carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuxConfig {
    /// Attach Alfa and Beta photodetectors.
    #[serde(default)]
    pub sensors: bool,
    /// Attach Alfa and Beta actuators.
    #[serde(default)]
    pub motors: bool,
}

/// Complete simulator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    pub shared: SharedConfig,
    pub robot: RobotSettings,
    #[serde(default)]
    pub body: Body,
    #[serde(default)]
    pub aux: AuxConfig,
    #[serde(default)]
    pub start: Pose,
    #[serde(default)]
    pub course: Course,
    #[serde(default)]
    pub routine: Vec<Step>,
}

impl SimConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError::ValidationError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.robot.validate()?;
        self.course.validate()?;

        let body = [
            ("sensor_spacing", self.body.sensor_spacing),
            ("aux_spacing", self.body.aux_spacing),
        ];
        for (name, value) in body {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if !self.body.aux_offset.is_finite() {
            return Err(ConfigError::ValidationError(
                "aux_offset must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
