//! Device capability traits.
//!
//! This module defines the interface the kernel consumes from the outside
//! world:
//! - [`Actuator`] - A single-axis motor with a tachometer
//! - [`ReflectanceSensor`] - A downward-facing photodetector
//! - [`Clock`] - Monotonic millisecond time source
//! - [`Scheduler`] - Cooperative sleep and background task spawning
//!
//! Host implementations of the last two are provided as [`SystemClock`] and
//! [`ThreadScheduler`]. Hardware backends and the simulator provide the rest.

use std::thread;
use std::time::{Duration, Instant};

/// Single-axis motor with an accumulating tachometer.
///
/// Speeds are signed percentages of full power. Angles are raw, uncalibrated
/// tacho degrees; calibration happens one layer up.
pub trait Actuator: Send {
    /// Run continuously at `speed`.
    fn run(&mut self, speed: f64);

    /// Run at `speed` until the tacho has moved by `angle`, then stop.
    fn run_to(&mut self, speed: f64, angle: f64);

    /// Stop, honouring the current brake setting.
    fn stop(&mut self);

    /// Enable or disable closed-loop speed regulation.
    fn set_regulated(&mut self, regulated: bool);

    /// Hold position (true) or coast (false) when stopped.
    fn set_brake(&mut self, brake: bool);

    /// Zero the tachometer.
    fn reset(&mut self);

    /// Accumulated tacho angle [deg].
    fn angle(&self) -> f64;

    /// Current measured speed [%].
    fn speed(&self) -> f64;
}

/// Downward-facing reflectance photodetector.
pub trait ReflectanceSensor: Send {
    /// Raw reflected light intensity.
    fn reflected_light(&self) -> f64;
}

/// Monotonic time source.
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_millis(&self) -> f64;
}

/// Cooperative scheduling primitives.
pub trait Scheduler: Send + Sync {
    /// Suspend the calling thread of control for `period`.
    fn sleep(&self, period: Duration);

    /// Start `task` alongside the caller. The task must not touch actuators
    /// claimed by the active motion primitive.
    fn run_concurrently(&self, task: Box<dyn FnOnce() + Send + 'static>);
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Scheduler backed by OS threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn sleep(&self, period: Duration) {
        thread::sleep(period);
    }

    fn run_concurrently(&self, task: Box<dyn FnOnce() + Send + 'static>) {
        thread::spawn(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_millis();
        ThreadScheduler.sleep(Duration::from_millis(2));
        let b = clock.now_millis();
        assert!(b >= a + 1.0, "clock did not advance: {a} -> {b}");
    }

    #[test]
    fn thread_scheduler_runs_task() {
        let (tx, rx) = mpsc::channel();
        ThreadScheduler.run_concurrently(Box::new(move || {
            tx.send(42).unwrap();
        }));
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), 42);
    }
}
