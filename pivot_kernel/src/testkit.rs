//! Stub devices with shared, inspectable state for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pivot_common::device::{Actuator, Clock, ReflectanceSensor, Scheduler};
use pivot_common::settings::{
    ConstructionSettings, ElectronicSettings, ErrorSettings, LineSettings, RobotSettings,
};

use crate::transducer::{Devices, Transducers};

/// Observable motor state.
#[derive(Debug, Default)]
pub struct MotorLog {
    pub angle: f64,
    pub commanded: f64,
    pub running: bool,
    pub regulated: bool,
    pub brake: bool,
    pub stops: usize,
    pub commands: Vec<f64>,
}

#[derive(Clone, Default)]
pub struct StubMotor(pub Arc<Mutex<MotorLog>>);

impl StubMotor {
    pub fn log(&self) -> std::sync::MutexGuard<'_, MotorLog> {
        self.0.lock().unwrap()
    }

    pub fn set_angle(&self, angle: f64) {
        self.log().angle = angle;
    }
}

impl Actuator for StubMotor {
    fn run(&mut self, speed: f64) {
        let mut log = self.log();
        log.commanded = speed;
        log.running = true;
        log.commands.push(speed);
    }

    fn run_to(&mut self, speed: f64, angle: f64) {
        let mut log = self.log();
        log.commands.push(speed);
        log.angle += angle.abs() * speed.signum();
    }

    fn stop(&mut self) {
        let mut log = self.log();
        log.commanded = 0.0;
        log.running = false;
        log.stops += 1;
    }

    fn set_regulated(&mut self, regulated: bool) {
        self.log().regulated = regulated;
    }

    fn set_brake(&mut self, brake: bool) {
        self.log().brake = brake;
    }

    fn reset(&mut self) {
        self.log().angle = 0.0;
    }

    fn angle(&self) -> f64 {
        self.0.lock().unwrap().angle
    }

    fn speed(&self) -> f64 {
        self.0.lock().unwrap().commanded
    }
}

#[derive(Clone, Default)]
pub struct StubSensor(pub Arc<Mutex<f64>>);

impl StubSensor {
    pub fn with(value: f64) -> Self {
        Self(Arc::new(Mutex::new(value)))
    }

    pub fn set(&self, value: f64) {
        *self.0.lock().unwrap() = value;
    }
}

impl ReflectanceSensor for StubSensor {
    fn reflected_light(&self) -> f64 {
        *self.0.lock().unwrap()
    }
}

#[derive(Clone, Default)]
pub struct StubClock(pub Arc<Mutex<f64>>);

impl StubClock {
    pub fn advance(&self, ms: f64) {
        *self.0.lock().unwrap() += ms;
    }
}

impl Clock for StubClock {
    fn now_millis(&self) -> f64 {
        *self.0.lock().unwrap()
    }
}

/// Advances the stub clock and integrates running motors on every sleep.
///
/// A running motor gains `commanded × deg_per_speed` tacho degrees per
/// tick. `on_tick` lets a test script sensor values against the tick count.
pub struct StepScheduler {
    pub clock: StubClock,
    pub motors: Vec<StubMotor>,
    pub deg_per_speed: f64,
    pub ticks: AtomicUsize,
    pub on_tick: Mutex<Option<Box<dyn FnMut(usize) + Send>>>,
}

impl StepScheduler {
    pub fn new(clock: StubClock, motors: Vec<StubMotor>) -> Self {
        Self {
            clock,
            motors,
            deg_per_speed: 0.1,
            ticks: AtomicUsize::new(0),
            on_tick: Mutex::new(None),
        }
    }

    pub fn ticks(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }
}

impl Scheduler for StepScheduler {
    fn sleep(&self, period: Duration) {
        self.clock.advance(period.as_secs_f64() * 1000.0);
        for motor in &self.motors {
            let mut log = motor.log();
            if log.running {
                log.angle += log.commanded * self.deg_per_speed;
            }
        }
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(hook) = self.on_tick.lock().unwrap().as_mut() {
            hook(tick);
        }
    }

    fn run_concurrently(&self, task: Box<dyn FnOnce() + Send + 'static>) {
        task();
    }
}

pub fn settings() -> RobotSettings {
    RobotSettings {
        electronic: ElectronicSettings {
            speed: 30.0,
            large_motors: true,
            tick_ms: 5,
        },
        construction: ConstructionSettings {
            wheel_diameter: 5.6,
            track_width: 12.0,
            sensor_offset: 6.0,
        },
        error: ErrorSettings {
            k_left_wheel: 1.0,
            k_right_wheel: 1.0,
            k_alfa_motor: 1.0,
            k_beta_motor: 1.0,
            k_left_sensor: 1.0,
            k_right_sensor: 1.0,
            k_alfa_sensor: 1.0,
            k_beta_sensor: 1.0,
            tacho_err: 5.0,
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

/// Handles kept by a test after the devices move into the kernel.
pub struct Rig {
    pub left: StubMotor,
    pub right: StubMotor,
    pub left_sensor: StubSensor,
    pub right_sensor: StubSensor,
    pub alfa_sensor: StubSensor,
    pub clock: StubClock,
}

impl Rig {
    pub fn new() -> Self {
        Self {
            left: StubMotor::default(),
            right: StubMotor::default(),
            left_sensor: StubSensor::with(50.0),
            right_sensor: StubSensor::with(50.0),
            alfa_sensor: StubSensor::with(50.0),
            clock: StubClock::default(),
        }
    }

    pub fn devices(&self) -> Devices {
        Devices::new(
            Box::new(self.left.clone()),
            Box::new(self.right.clone()),
            Box::new(self.left_sensor.clone()),
            Box::new(self.right_sensor.clone()),
        )
    }

    pub fn transducers(&self, settings: RobotSettings) -> Transducers {
        Transducers::new(
            Arc::new(settings),
            self.devices(),
            Arc::new(self.clock.clone()),
        )
    }

    pub fn scheduler(&self) -> StepScheduler {
        StepScheduler::new(
            self.clock.clone(),
            vec![self.left.clone(), self.right.clone()],
        )
    }
}
