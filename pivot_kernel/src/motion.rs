//! Blocking motion primitives.
//!
//! Every primitive follows the same poll cycle until its predicate holds:
//!
//! ```text
//! ┌─► poll predicate ── true ──► (stop actuators) ──► return
//! │        │ false
//! │        ▼
//! │   regulator tick (line primitives only)
//! │        │
//! └── sleep one tick
//! ```
//!
//! Only one primitive runs at a time and it owns the transducer layer for
//! its whole duration. There is no abort channel; fold one into the
//! predicate with [`either`](crate::predicate::either) and
//! [`until_flag`](crate::predicate::until_flag). Rotations build their own
//! stop condition, so their `*_until` variants take an extra predicate that
//! is OR'd with it.
//!
//! A primitive that fails mid-motion stops the actuators it was driving
//! before returning the error.

use std::sync::Arc;

use pivot_common::device::{Clock, Scheduler};
use pivot_common::settings::RobotSettings;
use pivot_common::side::Side;
use tracing::{debug, trace, warn};

use crate::control::pid::{Pid, PidGains};
use crate::error::{KernelError, KernelResult};
use crate::kinematics::{PivotPlan, pivot_plan};
use crate::predicate::{Predicate, either, never, until_black, until_both, until_degrees};
use crate::transducer::{Devices, Transducers};

/// Motion kernel of one differential-drive robot.
pub struct Robot {
    io: Transducers,
    scheduler: Arc<dyn Scheduler>,
}

impl Robot {
    /// Assemble the kernel.
    ///
    /// # Errors
    /// `KernelError::Config` if the settings fail validation.
    pub fn new(
        settings: Arc<RobotSettings>,
        devices: Devices,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn Scheduler>,
    ) -> KernelResult<Self> {
        if let Err(e) = settings.validate() {
            warn!(error = %e, "robot settings rejected");
            return Err(e.into());
        }
        debug!(
            speed = settings.electronic.speed,
            tick_ms = settings.electronic.tick_ms,
            "motion kernel ready"
        );
        Ok(Self {
            io: Transducers::new(settings, devices, clock),
            scheduler,
        })
    }

    /// Shared robot settings.
    pub fn settings(&self) -> &RobotSettings {
        self.io.settings()
    }

    /// Calibrated view for building predicates.
    pub fn transducers(&self) -> &Transducers {
        &self.io
    }

    /// Poll `until` once per tick, running `tick` between polls.
    ///
    /// On error the `involved` actuators are stopped before the error is
    /// returned; a failure of that stop is logged and dropped.
    fn run_until<P, T>(&mut self, involved: Side, until: &mut P, mut tick: T) -> KernelResult<u64>
    where
        P: Predicate + ?Sized,
        T: FnMut(&mut Transducers) -> KernelResult<()>,
    {
        let period = self.io.settings().tick();
        let mut ticks = 0u64;
        let result = loop {
            match until.poll(&self.io) {
                Ok(true) => break Ok(ticks),
                Ok(false) => {}
                Err(e) => break Err(e),
            }
            if let Err(e) = tick(&mut self.io) {
                break Err(e);
            }
            self.scheduler.sleep(period);
            ticks += 1;
        };

        if let Err(e) = &result {
            warn!(error = %e, %involved, ticks, "primitive failed, stopping actuators");
            if let Err(stop) = self.io.stop(involved) {
                warn!(error = %stop, %involved, "stop after failure failed");
            }
        }
        result
    }

    /// Drive one wheel at `speed` until `until` holds.
    pub fn move_wheel<P: Predicate>(
        &mut self,
        side: Side,
        speed: f64,
        mut until: P,
        stop: bool,
    ) -> KernelResult<()> {
        debug!(%side, speed, "move_wheel");
        self.io.drive(side, speed)?;
        let ticks = self.run_until(side, &mut until, |_| Ok(()))?;
        if stop {
            self.io.stop(side)?;
        }
        debug!(ticks, "move_wheel done");
        Ok(())
    }

    /// Drive both wheels at fixed speeds until `until` holds.
    pub fn move_wheels<P: Predicate>(
        &mut self,
        left_speed: f64,
        right_speed: f64,
        mut until: P,
        stop: bool,
    ) -> KernelResult<()> {
        debug!(left_speed, right_speed, "move_wheels");
        self.io.drive(Side::Left, left_speed)?;
        self.io.drive(Side::Right, right_speed)?;
        let ticks = self.run_until(Side::Both, &mut until, |_| Ok(()))?;
        if stop {
            self.io.stop(Side::Both)?;
        }
        debug!(ticks, "move_wheels done");
        Ok(())
    }

    /// Follow a line centred between the two primary sensors.
    ///
    /// Error is `left − right` reflectance; the correction speeds up the
    /// left wheel and slows the right one by the same amount.
    pub fn move_line<P: Predicate>(&mut self, speed: f64, mut until: P, stop: bool) -> KernelResult<()> {
        debug!(speed, "move_line");
        self.io.set_regulation(false);
        let mut pid = Pid::new(PidGains::from(&self.io.settings().line));

        let ticks = self.run_until(Side::Both, &mut until, |io| {
            let error = io.read_sensor(Side::Left)? - io.read_sensor(Side::Right)?;
            let correction = pid.update(error);
            trace!(error, correction, "line tick");
            io.drive(Side::Left, speed + correction)?;
            io.drive(Side::Right, speed - correction)
        })?;

        if stop {
            self.io.stop(Side::Both)?;
        }
        debug!(ticks, "move_line done");
        Ok(())
    }

    /// Follow one edge of a line with a single sensor.
    ///
    /// Regulates the reading of `side` toward the black/white midpoint.
    pub fn move_line_one<P: Predicate>(
        &mut self,
        side: Side,
        speed: f64,
        mut until: P,
        stop: bool,
    ) -> KernelResult<()> {
        let sign = side.follow_sign().ok_or(KernelError::AggregateSide {
            side,
            operation: "edge following",
        })?;
        // Fail before the wheels move if the sensor is missing.
        self.io.read_sensor(side)?;
        debug!(%side, speed, "move_line_one");

        self.io.set_regulation(false);
        let edge = self.io.settings().line.edge();
        let mut pid = Pid::new(PidGains::from(&self.io.settings().line));

        let ticks = self.run_until(Side::Both, &mut until, |io| {
            let error = (io.read_sensor(side)? - edge) * sign;
            let correction = pid.update(error);
            trace!(error, correction, "edge tick");
            io.drive(Side::Left, speed + correction)?;
            io.drive(Side::Right, speed - correction)
        })?;

        if stop {
            self.io.stop(Side::Both)?;
        }
        debug!(ticks, "move_line_one done");
        Ok(())
    }

    fn plan(&self, direction: Side, degrees: f64, pivot: f64) -> KernelResult<PivotPlan> {
        let sign = direction.rotation_sign().ok_or(KernelError::AggregateSide {
            side: direction,
            operation: "rotation direction",
        })?;
        let settings = self.io.settings();
        pivot_plan(
            settings.electronic.speed,
            &settings.construction,
            degrees,
            pivot,
            sign,
        )
    }

    /// Rotate the body by `degrees` about `pivot` toward `direction`.
    ///
    /// Stops on the wheel with the larger travel.
    pub fn rotate(&mut self, direction: Side, degrees: f64, pivot: f64, stop: bool) -> KernelResult<()> {
        self.rotate_until(direction, degrees, pivot, never(), stop)
    }

    /// [`rotate`](Self::rotate) that also ends when `extra` holds.
    pub fn rotate_until<E: Predicate>(
        &mut self,
        direction: Side,
        degrees: f64,
        pivot: f64,
        extra: E,
        stop: bool,
    ) -> KernelResult<()> {
        let plan = self.plan(direction, degrees, pivot)?;
        debug!(%direction, degrees, pivot, ?plan, "rotate");
        self.io.set_regulation(true);
        let until = until_degrees(&self.io, plan.stop_side(), plan.stop_target())?;
        self.move_wheels(plan.speeds[0], plan.speeds[1], either(until, extra), stop)
    }

    /// Spin in place toward `direction` until `sensor` sees black.
    pub fn rotate_line(&mut self, direction: Side, sensor: Side, stop: bool) -> KernelResult<()> {
        self.rotate_line_until(direction, sensor, never(), stop)
    }

    /// [`rotate_line`](Self::rotate_line) that also ends when `extra` holds.
    pub fn rotate_line_until<E: Predicate>(
        &mut self,
        direction: Side,
        sensor: Side,
        extra: E,
        stop: bool,
    ) -> KernelResult<()> {
        let plan = self.plan(direction, 0.0, 0.0)?;
        debug!(%direction, %sensor, "rotate_line");
        self.io.set_regulation(true);
        let until = until_black(&self.io, sensor)?;
        self.move_wheels(plan.speeds[0], plan.speeds[1], either(until, extra), stop)
    }

    /// Rotate through `degrees`, then keep turning until `sensor` sees
    /// black.
    pub fn rotate_double(
        &mut self,
        direction: Side,
        degrees: f64,
        pivot: f64,
        sensor: Side,
        stop: bool,
    ) -> KernelResult<()> {
        self.rotate_double_until(direction, degrees, pivot, sensor, never(), stop)
    }

    /// [`rotate_double`](Self::rotate_double) that also ends when `extra`
    /// holds, in either phase.
    pub fn rotate_double_until<E: Predicate>(
        &mut self,
        direction: Side,
        degrees: f64,
        pivot: f64,
        sensor: Side,
        extra: E,
        stop: bool,
    ) -> KernelResult<()> {
        let plan = self.plan(direction, degrees, pivot)?;
        debug!(%direction, degrees, pivot, %sensor, "rotate_double");
        self.io.set_regulation(true);
        let until = until_both(
            until_degrees(&self.io, plan.stop_side(), plan.stop_target())?,
            until_black(&self.io, sensor)?,
        );
        self.move_wheels(plan.speeds[0], plan.speeds[1], either(until, extra), stop)
    }

    /// Turn onto a line and follow it.
    ///
    /// Runs [`rotate_double`](Self::rotate_double) without braking, then
    /// [`move_line`](Self::move_line) at the configured speed. `follow`
    /// is called once the turn is finished so its baseline starts there.
    pub fn turn_onto_line<P, F>(
        &mut self,
        direction: Side,
        degrees: f64,
        pivot: f64,
        sensor: Side,
        follow: F,
        stop: bool,
    ) -> KernelResult<()>
    where
        P: Predicate,
        F: FnOnce(&Transducers) -> KernelResult<P>,
    {
        self.turn_onto_line_until(direction, degrees, pivot, sensor, never(), follow, stop)
    }

    /// [`turn_onto_line`](Self::turn_onto_line) whose turn also ends when
    /// `extra` holds. The follow phase only answers to `follow`.
    #[allow(clippy::too_many_arguments)]
    pub fn turn_onto_line_until<E, P, F>(
        &mut self,
        direction: Side,
        degrees: f64,
        pivot: f64,
        sensor: Side,
        extra: E,
        follow: F,
        stop: bool,
    ) -> KernelResult<()>
    where
        E: Predicate,
        P: Predicate,
        F: FnOnce(&Transducers) -> KernelResult<P>,
    {
        self.rotate_double_until(direction, degrees, pivot, sensor, extra, false)?;
        let until = follow(&self.io)?;
        let speed = self.io.settings().electronic.speed;
        self.move_line(speed, until, stop)
    }

    /// Brake every actuator.
    pub fn stop_all(&mut self) {
        self.io.stop_all();
    }
}
