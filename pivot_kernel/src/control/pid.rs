//! Discrete PID regulator for line centering.
//!
//! One evaluation per poll tick with no time scaling: the tick period is
//! folded into the gains. The integral is unbounded and the output is not
//! clamped; callers saturate against actuator limits if they need to.

use pivot_common::settings::LineSettings;

/// Regulator gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (0 = disabled).
    pub ki: f64,
    /// Derivative gain (0 = disabled).
    pub kd: f64,
}

impl From<&LineSettings> for PidGains {
    fn from(line: &LineSettings) -> Self {
        Self {
            kp: line.kp,
            ki: line.ki,
            kd: line.kd,
        }
    }
}

/// Internal state of the regulator.
///
/// Starts zeroed and is never reset: a stale integral is only avoided by
/// building a fresh state for every motion primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidState {
    /// Sum of every error sample seen so far.
    error_sum: f64,
    /// Error sample of the previous tick.
    prev_error: f64,
}

impl PidState {
    /// Accumulated error.
    #[inline]
    pub fn error_sum(&self) -> f64 {
        self.error_sum
    }

    /// Last error sample.
    #[inline]
    pub fn prev_error(&self) -> f64 {
        self.prev_error
    }
}

/// Compute one regulator tick.
///
/// `correction = kp·e + ki·Σe + kd·(e − e_prev)`, where Σe already includes
/// the current sample.
#[inline]
pub fn pid_compute(state: &mut PidState, gains: &PidGains, error: f64) -> f64 {
    state.error_sum += error;
    let derivative = error - state.prev_error;
    state.prev_error = error;

    gains.kp * error + gains.ki * state.error_sum + gains.kd * derivative
}

/// Gains and state bundled for a single motion primitive.
#[derive(Debug, Clone)]
pub struct Pid {
    gains: PidGains,
    state: PidState,
}

impl Pid {
    /// Create a regulator with zeroed history.
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            state: PidState::default(),
        }
    }

    /// Feed one error sample, get the correction term.
    #[inline]
    pub fn update(&mut self, error: f64) -> f64 {
        pid_compute(&mut self.state, &self.gains, error)
    }

    /// Read-only view of the accumulated history.
    pub fn state(&self) -> &PidState {
        &self.state
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
