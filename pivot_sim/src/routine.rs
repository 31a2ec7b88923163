//! Declarative routines.
//!
//! A routine is a list of [`Step`]s executed in order against a
//! [`Robot`]. The abort flag is folded into every step: OR'd with the
//! step's own `until`, or passed as the extra stop condition of the
//! rotation primitives.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pivot_common::side::Side;
use pivot_kernel::predicate::{
    Predicate, either, until_black, until_cm, until_degrees, until_flag, until_time, until_white,
};
use pivot_kernel::{KernelResult, Robot, Transducers};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

fn default_stop() -> bool {
    true
}

fn default_side() -> Side {
    Side::Both
}

/// Stop condition of a routine step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Until {
    Time {
        ms: f64,
    },
    Cm {
        #[serde(default = "default_side")]
        side: Side,
        cm: f64,
    },
    Degrees {
        #[serde(default = "default_side")]
        side: Side,
        degrees: f64,
    },
    Black {
        #[serde(default = "default_side")]
        side: Side,
    },
    White {
        #[serde(default = "default_side")]
        side: Side,
    },
}

impl Until {
    /// Build the predicate, capturing its baseline now.
    pub fn build(&self, io: &Transducers) -> KernelResult<Box<dyn Predicate>> {
        Ok(match *self {
            Until::Time { ms } => Box::new(until_time(io, ms)),
            Until::Cm { side, cm } => Box::new(until_cm(io, side, cm)?),
            Until::Degrees { side, degrees } => Box::new(until_degrees(io, side, degrees)?),
            Until::Black { side } => Box::new(until_black(io, side)?),
            Until::White { side } => Box::new(until_white(io, side)?),
        })
    }
}

/// One routine step. Omitted `speed` means the configured robot speed;
/// omitted `stop` means brake at the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Run a single actuator.
    Motor {
        side: Side,
        speed: f64,
        until: Until,
        #[serde(default = "default_stop")]
        stop: bool,
    },
    /// Run both drive wheels at fixed speeds.
    Drive {
        left: f64,
        right: f64,
        until: Until,
        #[serde(default = "default_stop")]
        stop: bool,
    },
    Rotate {
        direction: Side,
        degrees: f64,
        #[serde(default)]
        pivot: f64,
        #[serde(default = "default_stop")]
        stop: bool,
    },
    RotateLine {
        direction: Side,
        sensor: Side,
        #[serde(default = "default_stop")]
        stop: bool,
    },
    RotateDouble {
        direction: Side,
        degrees: f64,
        #[serde(default)]
        pivot: f64,
        sensor: Side,
        #[serde(default = "default_stop")]
        stop: bool,
    },
    /// Follow a line between the primary sensors.
    FollowLine {
        speed: Option<f64>,
        until: Until,
        #[serde(default = "default_stop")]
        stop: bool,
    },
    /// Follow a line edge with one sensor.
    FollowEdge {
        sensor: Side,
        speed: Option<f64>,
        until: Until,
        #[serde(default = "default_stop")]
        stop: bool,
    },
    TurnOntoLine {
        direction: Side,
        degrees: f64,
        #[serde(default)]
        pivot: f64,
        sensor: Side,
        until: Until,
        #[serde(default = "default_stop")]
        stop: bool,
    },
    /// Hold still.
    Wait {
        ms: f64,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Motor { .. } => "motor",
            Step::Drive { .. } => "drive",
            Step::Rotate { .. } => "rotate",
            Step::RotateLine { .. } => "rotate_line",
            Step::RotateDouble { .. } => "rotate_double",
            Step::FollowLine { .. } => "follow_line",
            Step::FollowEdge { .. } => "follow_edge",
            Step::TurnOntoLine { .. } => "turn_onto_line",
            Step::Wait { .. } => "wait",
        }
    }
}

/// Outcome of [`run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    /// Steps that ran to completion.
    pub completed: usize,
    pub aborted: bool,
}

fn abortable(until: Box<dyn Predicate>, abort: &Arc<AtomicBool>) -> impl Predicate + use<> {
    either(until, until_flag(abort.clone()))
}

fn execute(robot: &mut Robot, step: &Step, abort: &Arc<AtomicBool>) -> KernelResult<()> {
    let speed = robot.settings().electronic.speed;
    match *step {
        Step::Motor {
            side,
            speed,
            ref until,
            stop,
        } => {
            let until = abortable(until.build(robot.transducers())?, abort);
            robot.move_wheel(side, speed, until, stop)
        }
        Step::Drive {
            left,
            right,
            ref until,
            stop,
        } => {
            let until = abortable(until.build(robot.transducers())?, abort);
            robot.move_wheels(left, right, until, stop)
        }
        Step::Rotate {
            direction,
            degrees,
            pivot,
            stop,
        } => robot.rotate_until(direction, degrees, pivot, until_flag(abort.clone()), stop),
        Step::RotateLine {
            direction,
            sensor,
            stop,
        } => robot.rotate_line_until(direction, sensor, until_flag(abort.clone()), stop),
        Step::RotateDouble {
            direction,
            degrees,
            pivot,
            sensor,
            stop,
        } => robot.rotate_double_until(
            direction,
            degrees,
            pivot,
            sensor,
            until_flag(abort.clone()),
            stop,
        ),
        Step::FollowLine {
            speed: line_speed,
            ref until,
            stop,
        } => {
            let until = abortable(until.build(robot.transducers())?, abort);
            robot.move_line(line_speed.unwrap_or(speed), until, stop)
        }
        Step::FollowEdge {
            sensor,
            speed: edge_speed,
            ref until,
            stop,
        } => {
            let until = abortable(until.build(robot.transducers())?, abort);
            robot.move_line_one(sensor, edge_speed.unwrap_or(speed), until, stop)
        }
        Step::TurnOntoLine {
            direction,
            degrees,
            pivot,
            sensor,
            ref until,
            stop,
        } => robot.turn_onto_line_until(
            direction,
            degrees,
            pivot,
            sensor,
            until_flag(abort.clone()),
            |io| Ok(abortable(until.build(io)?, abort)),
            stop,
        ),
        Step::Wait { ms } => {
            let until = abortable(Box::new(until_time(robot.transducers(), ms)), abort);
            robot.move_wheels(0.0, 0.0, until, true)
        }
    }
}

/// Run `steps` in order until done, aborted or failed.
///
/// On abort every actuator is stopped and the report says how far the
/// routine got.
///
/// # Errors
///
/// The first kernel error, after stopping every actuator.
pub fn run(robot: &mut Robot, steps: &[Step], abort: &Arc<AtomicBool>) -> KernelResult<Report> {
    let mut completed = 0;
    for (index, step) in steps.iter().enumerate() {
        if abort.load(Ordering::SeqCst) {
            break;
        }
        info!(index, action = step.name(), "step");
        if let Err(e) = execute(robot, step, abort) {
            warn!(index, action = step.name(), error = %e, "step failed");
            robot.stop_all();
            return Err(e);
        }
        if abort.load(Ordering::SeqCst) {
            break;
        }
        completed += 1;
    }

    let aborted = abort.load(Ordering::SeqCst);
    if aborted {
        warn!(completed, total = steps.len(), "routine aborted");
        robot.stop_all();
    }
    Ok(Report { completed, aborted })
}
