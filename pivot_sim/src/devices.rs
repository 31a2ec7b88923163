//! Device capability implementations over a shared [`World`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use pivot_common::device::{Actuator, Clock, ReflectanceSensor, Scheduler};

use crate::world::{Port, World};

/// Shared world handle.
pub type SharedWorld = Arc<Mutex<World>>;

fn lock(world: &SharedWorld) -> MutexGuard<'_, World> {
    world.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Motor on one world port.
pub struct SimMotor {
    world: SharedWorld,
    port: Port,
}

impl SimMotor {
    pub fn new(world: SharedWorld, port: Port) -> Self {
        Self { world, port }
    }
}

impl Actuator for SimMotor {
    fn run(&mut self, speed: f64) {
        let mut world = lock(&self.world);
        let wheel = world.wheel_mut(self.port);
        wheel.command = speed;
        wheel.target = None;
    }

    fn run_to(&mut self, speed: f64, angle: f64) {
        let mut world = lock(&self.world);
        let wheel = world.wheel_mut(self.port);
        wheel.command = speed;
        wheel.target = Some(wheel.angle + angle.abs() * speed.signum());
    }

    fn stop(&mut self) {
        let mut world = lock(&self.world);
        let wheel = world.wheel_mut(self.port);
        wheel.command = 0.0;
        wheel.target = None;
    }

    fn set_regulated(&mut self, regulated: bool) {
        lock(&self.world).wheel_mut(self.port).regulated = regulated;
    }

    fn set_brake(&mut self, brake: bool) {
        lock(&self.world).wheel_mut(self.port).brake = brake;
    }

    fn reset(&mut self) {
        lock(&self.world).wheel_mut(self.port).angle = 0.0;
    }

    fn angle(&self) -> f64 {
        lock(&self.world).wheel(self.port).angle
    }

    fn speed(&self) -> f64 {
        lock(&self.world).wheel(self.port).command
    }
}

/// Photodetector on one world port.
pub struct SimSensor {
    world: SharedWorld,
    port: Port,
}

impl SimSensor {
    pub fn new(world: SharedWorld, port: Port) -> Self {
        Self { world, port }
    }
}

impl ReflectanceSensor for SimSensor {
    fn reflected_light(&self) -> f64 {
        lock(&self.world).reflectance(self.port)
    }
}

/// Simulated time source.
#[derive(Clone)]
pub struct SimClock {
    world: SharedWorld,
}

impl SimClock {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl Clock for SimClock {
    fn now_millis(&self) -> f64 {
        lock(&self.world).elapsed_ms()
    }
}

/// Scheduler whose `sleep` advances the physics instead of waiting.
#[derive(Clone)]
pub struct SimScheduler {
    world: SharedWorld,
}

impl SimScheduler {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl Scheduler for SimScheduler {
    fn sleep(&self, period: Duration) {
        lock(&self.world).advance(period);
    }

    fn run_concurrently(&self, task: Box<dyn FnOnce() + Send + 'static>) {
        thread::spawn(task);
    }
}
