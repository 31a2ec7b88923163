//! Rotation scenario tests through the public kernel API.
//!
//! A robot with 5.6 wheels, 12 track and speed 30 rotates in place and about
//! a wheel; stub actuators integrate commanded speed into tacho angle on
//! every scheduler tick.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pivot_common::device::{Actuator, Clock, ReflectanceSensor, Scheduler};
use pivot_common::settings::{
    ConstructionSettings, ElectronicSettings, ErrorSettings, LineSettings, RobotSettings,
};
use pivot_common::side::Side;
use pivot_kernel::kinematics::pivot_plan;
use pivot_kernel::{Devices, Robot};

#[derive(Default)]
struct Wheel {
    angle: f64,
    speed: f64,
    commands: Vec<f64>,
}

#[derive(Clone, Default)]
struct Motor(Arc<Mutex<Wheel>>);

impl Actuator for Motor {
    fn run(&mut self, speed: f64) {
        let mut w = self.0.lock().unwrap();
        w.speed = speed;
        w.commands.push(speed);
    }
    fn run_to(&mut self, speed: f64, _angle: f64) {
        self.run(speed);
    }
    fn stop(&mut self) {
        self.0.lock().unwrap().speed = 0.0;
    }
    fn set_regulated(&mut self, _regulated: bool) {}
    fn set_brake(&mut self, _brake: bool) {}
    fn reset(&mut self) {
        self.0.lock().unwrap().angle = 0.0;
    }
    fn angle(&self) -> f64 {
        self.0.lock().unwrap().angle
    }
    fn speed(&self) -> f64 {
        self.0.lock().unwrap().speed
    }
}

struct Floor(f64);

impl ReflectanceSensor for Floor {
    fn reflected_light(&self) -> f64 {
        self.0
    }
}

/// Clock and scheduler in one: each sleep integrates wheel motion.
struct Ticker {
    now: Mutex<f64>,
    wheels: Vec<Motor>,
    /// Tacho degrees per unit of speed per millisecond.
    gain: f64,
}

impl Clock for Ticker {
    fn now_millis(&self) -> f64 {
        *self.now.lock().unwrap()
    }
}

impl Scheduler for Ticker {
    fn sleep(&self, period: Duration) {
        let ms = period.as_secs_f64() * 1000.0;
        *self.now.lock().unwrap() += ms;
        for wheel in &self.wheels {
            let mut w = wheel.0.lock().unwrap();
            w.angle += w.speed * self.gain * ms;
        }
    }
    fn run_concurrently(&self, task: Box<dyn FnOnce() + Send + 'static>) {
        task();
    }
}

fn settings(k_left_wheel: f64) -> RobotSettings {
    RobotSettings {
        electronic: ElectronicSettings {
            speed: 30.0,
            large_motors: true,
            tick_ms: 1,
        },
        construction: ConstructionSettings {
            wheel_diameter: 5.6,
            track_width: 12.0,
            sensor_offset: 0.0,
        },
        error: ErrorSettings {
            k_left_wheel,
            k_right_wheel: 1.0,
            k_alfa_motor: 1.0,
            k_beta_motor: 1.0,
            k_left_sensor: 1.0,
            k_right_sensor: 1.0,
            k_alfa_sensor: 1.0,
            k_beta_sensor: 1.0,
            tacho_err: 0.0,
        },
        line: LineSettings {
            kp: 1.0,
            ki: 0.0,
            kd: 0.0,
            black: 10.0,
            white: 70.0,
        },
    }
}

fn rig(k_left_wheel: f64) -> (Robot, Motor, Motor) {
    let left = Motor::default();
    let right = Motor::default();
    let ticker = Arc::new(Ticker {
        now: Mutex::new(0.0),
        wheels: vec![left.clone(), right.clone()],
        gain: 0.01,
    });
    let devices = Devices::new(
        Box::new(left.clone()),
        Box::new(right.clone()),
        Box::new(Floor(60.0)),
        Box::new(Floor(60.0)),
    );
    let robot = Robot::new(
        Arc::new(settings(k_left_wheel)),
        devices,
        ticker.clone(),
        ticker,
    )
    .unwrap();
    (robot, left, right)
}

#[test]
fn right_spin_in_place_matches_plan() {
    let s = settings(1.0);
    let plan = pivot_plan(30.0, &s.construction, 90.0, 0.0, -1.0).unwrap();
    assert_eq!(plan.speeds, [30.0, -30.0]);
    assert!((plan.targets[0] + plan.targets[1]).abs() < 1e-9);
    assert_eq!(plan.stop_side(), Side::Left);

    let (mut robot, left, right) = rig(1.0);
    robot.rotate(Side::Right, 90.0, 0.0, true).unwrap();

    let target = 12.0 * 90.0 / 5.6;
    let l = left.0.lock().unwrap();
    let r = right.0.lock().unwrap();
    assert_eq!(l.commands, vec![30.0]);
    assert_eq!(r.commands, vec![-30.0]);
    // 0.3 deg per 1 ms tick.
    assert!(l.angle > target && l.angle <= target + 0.3 + 1e-9);
    assert!((l.angle + r.angle).abs() < 1e-9);
}

#[test]
fn pivot_on_left_wheel_moves_only_right() {
    let (mut robot, left, right) = rig(1.0);
    robot.rotate(Side::Left, 90.0, -1.0, true).unwrap();

    let target = 2.0 * 12.0 * 90.0 / 5.6;
    assert_eq!(left.0.lock().unwrap().angle, 0.0);
    let r = right.0.lock().unwrap().angle;
    assert!(r > target && r <= target + 0.3 + 1e-9, "{r}");
}

#[test]
fn inverted_left_wheel_is_commanded_negated() {
    let (mut robot, left, right) = rig(-1.0);
    robot.rotate(Side::Right, 90.0, 0.0, true).unwrap();

    // Logical [30, -30] becomes raw [-30, -30]; the calibrated left tacho
    // still counts forward so the rotation terminates.
    assert_eq!(left.0.lock().unwrap().commands, vec![-30.0]);
    assert_eq!(right.0.lock().unwrap().commands, vec![-30.0]);
    assert!(robot.transducers().read_tacho(Side::Left).unwrap() > 12.0 * 90.0 / 5.6);
}
