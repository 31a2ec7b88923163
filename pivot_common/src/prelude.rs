//! Prelude module for common re-exports.
//!
//! ```rust
//! use pivot_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::settings::{
    ConstructionSettings, ElectronicSettings, ErrorSettings, LineSettings, RobotSettings,
};

// ─── Channels ───────────────────────────────────────────────────────
pub use crate::side::{Channel, Side};

// ─── Devices ────────────────────────────────────────────────────────
pub use crate::device::{Actuator, Clock, ReflectanceSensor, Scheduler, SystemClock, ThreadScheduler};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_TICK_MS, DEGREES_PER_REVOLUTION};
