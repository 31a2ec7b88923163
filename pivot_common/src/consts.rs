//! System-wide constants for the pivot workspace.
//!
//! Single source of truth for numeric defaults shared by the kernel and the
//! simulator.

use static_assertions::const_assert;

/// Default poll loop period of a blocking motion primitive, in milliseconds.
pub const DEFAULT_TICK_MS: u64 = 5;

/// Full wheel revolution in tacho units.
pub const DEGREES_PER_REVOLUTION: f64 = 360.0;

/// Top wheel rate of a large drive actuator at 100 % command [deg/s].
pub const LARGE_MOTOR_MAX_DPS: f64 = 1050.0;

/// Top wheel rate of a medium drive actuator at 100 % command [deg/s].
pub const MEDIUM_MOTOR_MAX_DPS: f64 = 1560.0;

/// Largest magnitude an actuator accepts as a speed command [%].
pub const MAX_SPEED_COMMAND: f64 = 100.0;

const_assert!(DEFAULT_TICK_MS > 0);
const_assert!(DEFAULT_TICK_MS < 1000);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(LARGE_MOTOR_MAX_DPS > 0.0);
        assert!(MEDIUM_MOTOR_MAX_DPS > LARGE_MOTOR_MAX_DPS);
        assert_eq!(DEGREES_PER_REVOLUTION, 360.0);
        assert!(MAX_SPEED_COMMAND > 0.0);
    }
}
