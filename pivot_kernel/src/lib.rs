//! # Pivot Motion Kernel
//!
//! Blocking motion control for a differential-drive robot with two or four
//! downward-facing photodetectors. Turns declarative goals ("drive until a
//! line is seen", "pivot 90°", "follow the line for 30 cm") into per-tick
//! motor commands.
//!
//! ## Layers
//!
//! 1. [`transducer`] — Side-indexed, calibrated access to actuators and
//!    photodetectors
//! 2. [`control`] — PID regulator for line centering
//! 3. [`kinematics`] — Pivot rotation wheel speeds and travel
//! 4. [`predicate`] — Composable stop conditions
//! 5. [`motion`] — Blocking primitives built on the four layers above
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pivot_kernel::prelude::*;
//!
//! let mut robot = Robot::new(settings, devices, clock, scheduler)?;
//! let until = until_cm(robot.transducers(), Side::Both, 20.0)?;
//! robot.move_wheels(30.0, 30.0, until, true)?;
//! robot.rotate(Side::Right, 90.0, 0.0, true)?;
//! let until = until_black(robot.transducers(), Side::Both)?;
//! robot.move_line(25.0, until, true)?;
//! ```

pub mod control;
pub mod error;
pub mod kinematics;
pub mod motion;
pub mod predicate;
pub mod transducer;

#[cfg(test)]
mod testkit;

pub use crate::error::{KernelError, KernelResult};
pub use crate::motion::Robot;
pub use crate::transducer::{Devices, Transducers};

/// Common re-exports for routine authors.
pub mod prelude {
    pub use crate::error::{KernelError, KernelResult};
    pub use crate::kinematics::{PivotPlan, pivot_plan};
    pub use crate::motion::Robot;
    pub use crate::predicate::{
        Predicate, either, from_fn, never, until_black, until_both, until_cm, until_degrees,
        until_flag, until_time, until_white,
    };
    pub use crate::transducer::{Devices, Transducers};
    pub use pivot_common::side::Side;
}
