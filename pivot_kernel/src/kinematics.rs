//! Pivot rotation kinematics.
//!
//! Computes per-wheel speeds and per-wheel tacho travel for rotating the
//! robot by a given angle about a point on the wheel axis.
//!
//! The pivot is expressed in half-track-width units: −1 is the left wheel,
//! 0 the axle midpoint (spin in place), +1 the right wheel. Values outside
//! [−1, 1] put the pivot beyond a wheel, and both wheels then turn the same
//! way.
//!
//! ```text
//!   lever arms   j = [−1 − pivot, 1 − pivot]
//!   speeds       v = speed / max|j| · j
//!   arc radius   d = track / 2 · j
//!   travel       t = d · 2·degrees / wheel_diameter
//! ```
//!
//! Both speeds and both travels are finally scaled by the direction sign.

use pivot_common::settings::ConstructionSettings;
use pivot_common::side::Side;

use crate::error::{KernelError, KernelResult};

/// Output of [`pivot_plan`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotPlan {
    /// Drive speeds `[left, right]`.
    pub speeds: [f64; 2],
    /// Signed tacho travel `[left, right]` in calibrated degrees.
    pub targets: [f64; 2],
}

impl PivotPlan {
    /// Wheel that reaches its target last. Ties favour Left.
    pub fn stop_side(&self) -> Side {
        if self.targets[0].abs() >= self.targets[1].abs() {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Travel of the [`stop_side`](Self::stop_side) wheel.
    pub fn stop_target(&self) -> f64 {
        match self.stop_side() {
            Side::Left => self.targets[0],
            _ => self.targets[1],
        }
    }
}

/// Plan a pivot rotation.
///
/// # Arguments
/// - `speed`: top wheel speed; the outer wheel runs at exactly this.
/// - `construction`: wheel diameter and track width.
/// - `degrees`: rotation angle of the robot body.
/// - `pivot`: pivot point in half-track-width units.
/// - `direction`: +1 normal, −1 mirrored.
///
/// # Errors
/// `InvalidParameter` for non-finite input, a non-positive wheel diameter,
/// or a direction other than ±1. A zero lever reach is also rejected; it
/// cannot occur for a finite pivot since `max(|−1 − p|, |1 − p|) ≥ 1`, so
/// that check only guards the division.
pub fn pivot_plan(
    speed: f64,
    construction: &ConstructionSettings,
    degrees: f64,
    pivot: f64,
    direction: f64,
) -> KernelResult<PivotPlan> {
    if !degrees.is_finite() || !pivot.is_finite() || !speed.is_finite() {
        return Err(KernelError::InvalidParameter(format!(
            "non-finite rotation input: speed={speed} degrees={degrees} pivot={pivot}"
        )));
    }
    if direction != 1.0 && direction != -1.0 {
        return Err(KernelError::InvalidParameter(format!(
            "direction must be +1 or -1, got {direction}"
        )));
    }
    if construction.wheel_diameter.is_nan() || construction.wheel_diameter <= 0.0 {
        return Err(KernelError::InvalidParameter(format!(
            "wheel diameter must be positive, got {}",
            construction.wheel_diameter
        )));
    }

    let lever = [-1.0 - pivot, 1.0 - pivot];
    let reach = lever[0].abs().max(lever[1].abs());
    if reach == 0.0 {
        return Err(KernelError::InvalidParameter(
            "both lever arms are zero".to_string(),
        ));
    }

    let k = speed / reach;
    let half_track = construction.track_width / 2.0;
    let per_unit = 2.0 * degrees / construction.wheel_diameter;

    let speeds = lever.map(|j| direction * k * j);
    let targets = lever.map(|j| direction * half_track * j * per_unit);

    Ok(PivotPlan { speeds, targets })
}

// ─── Tests ──────────────────────────────────────────────────────────
