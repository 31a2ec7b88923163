//! Pivot Common Library
//!
//! This crate provides the types shared by the motion kernel and every
//! collaborator that drives it.
//!
//! # Module Structure
//!
//! - [`side`] - Logical channel selector for wheels and photodetectors
//! - [`settings`] - `RobotSettings` and its four configuration groups
//! - [`device`] - Actuator, sensor, clock and scheduler capabilities
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - System-wide constants
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust,no_run
//! use pivot_common::prelude::*;
//! use std::path::Path;
//!
//! let settings = RobotSettings::load(Path::new("robot.toml")).unwrap();
//! settings.validate().unwrap();
//! ```

pub mod config;
pub mod consts;
pub mod device;
pub mod prelude;
pub mod settings;
pub mod side;
