//! # Pivot Simulator
//!
//! A simulated differential-drive robot for the pivot motion kernel:
//! deterministic physics, a floor of painted line strips, and a runner for
//! routines declared in TOML.
//!
//! ## Modules
//!
//! - [`world`] - Pose integration and motor ports
//! - [`course`] - Floor reflectance map
//! - [`devices`] - Actuator, sensor, clock and scheduler over the world
//! - [`config`] - Simulator configuration file
//! - [`routine`] - Declarative steps and their executor

pub mod config;
pub mod course;
pub mod devices;
pub mod routine;
pub mod world;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

use pivot_common::config::ConfigError;
use pivot_common::device::{Actuator, ReflectanceSensor};
use pivot_common::side::Side;
use pivot_kernel::{Devices, KernelError, Robot};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SimConfig;
use crate::devices::{SharedWorld, SimClock, SimMotor, SimScheduler, SimSensor};
use crate::routine::{Report, Step};
use crate::world::{Port, Pose, World};

/// Simulator failure.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

fn motor(world: &SharedWorld, port: Port) -> Box<dyn Actuator> {
    Box::new(SimMotor::new(world.clone(), port))
}

fn sensor(world: &SharedWorld, port: Port) -> Box<dyn ReflectanceSensor> {
    Box::new(SimSensor::new(world.clone(), port))
}

/// A configured robot in its world, with the routine to run.
pub struct Simulation {
    robot: Robot,
    world: SharedWorld,
    routine: Vec<Step>,
}

impl Simulation {
    /// Validate `config` and wire the simulated devices into a kernel
    /// [`Robot`].
    ///
    /// # Errors
    ///
    /// `SimError::Config` for an invalid configuration.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        if let Err(e) = config.validate() {
            warn!(error = %e, "simulator configuration rejected");
            return Err(e.into());
        }

        let world: SharedWorld = Arc::new(Mutex::new(World::new(
            &config.robot,
            config.body,
            config.course,
            config.start,
        )));

        let mut devices = Devices::new(
            motor(&world, Port::Left),
            motor(&world, Port::Right),
            sensor(&world, Port::Left),
            sensor(&world, Port::Right),
        );
        if config.aux.sensors {
            devices =
                devices.with_aux_sensors(sensor(&world, Port::Alfa), sensor(&world, Port::Beta));
        }
        if config.aux.motors {
            devices = devices
                .with_aux_motor(Side::Alfa, motor(&world, Port::Alfa))?
                .with_aux_motor(Side::Beta, motor(&world, Port::Beta))?;
        }

        let robot = Robot::new(
            Arc::new(config.robot),
            devices,
            Arc::new(SimClock::new(world.clone())),
            Arc::new(SimScheduler::new(world.clone())),
        )?;

        info!(
            service = %config.shared.service_name,
            steps = config.routine.len(),
            strips = world.lock().unwrap_or_else(PoisonError::into_inner).course().strips.len(),
            "simulation ready"
        );

        Ok(Self {
            robot,
            world,
            routine: config.routine,
        })
    }

    pub fn robot(&mut self) -> &mut Robot {
        &mut self.robot
    }

    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    pub fn pose(&self) -> Pose {
        self.world.lock().unwrap_or_else(PoisonError::into_inner).pose()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.world.lock().unwrap_or_else(PoisonError::into_inner).elapsed_ms()
    }

    /// Run the configured routine.
    pub fn run(&mut self, abort: &Arc<AtomicBool>) -> Result<Report, SimError> {
        Ok(routine::run(&mut self.robot, &self.routine, abort)?)
    }
}
