//! Kernel error type.
//!
//! Configuration faults are reported at the call site that first needs the
//! faulty channel. Physical faults (a wheel that never reaches its target)
//! are not errors: the primitive simply keeps polling.

use pivot_common::config::ConfigError;
use pivot_common::side::{Channel, Side};
use thiserror::Error;

/// Errors raised by the transducer layer, kinematics, predicates and
/// motion primitives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// Settings failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An auxiliary channel was used without a configured device.
    #[error("no {channel} configured for side {side}")]
    UnconfiguredChannel {
        /// Requested side.
        side: Side,
        /// Device kind.
        channel: Channel,
    },

    /// A side that does not name a single channel was used where one is
    /// required.
    #[error("side {side} is not valid for {operation}")]
    AggregateSide {
        /// Offending side.
        side: Side,
        /// Operation that rejected it.
        operation: &'static str,
    },

    /// A calibration coefficient is zero.
    #[error("calibration coefficient for {channel} {side} is zero")]
    ZeroCoefficient {
        /// Side whose coefficient is zero.
        side: Side,
        /// Device kind.
        channel: Channel,
    },

    /// Degenerate numeric input.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Convenience alias used across the kernel.
pub type KernelResult<T> = Result<T, KernelError>;
