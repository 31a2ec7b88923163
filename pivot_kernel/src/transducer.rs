//! Calibrated transducer layer.
//!
//! Resolves a [`Side`] to a device and applies the signed calibration
//! coefficient for that channel:
//!
//! | Operation      | Calibration                        |
//! |----------------|------------------------------------|
//! | `read_sensor`  | raw reflectance × k_sensor         |
//! | `read_tacho`   | raw angle ÷ k_wheel (Both = mean)  |
//! | `drive`        | speed × k_wheel                    |
//!
//! Left and Right always resolve. Alfa and Beta resolve only when the
//! auxiliary device was supplied; otherwise the call fails with
//! [`KernelError::UnconfiguredChannel`]. Both never resolves to a single
//! device.

use std::sync::Arc;

use pivot_common::device::{Actuator, Clock, ReflectanceSensor};
use pivot_common::settings::RobotSettings;
use pivot_common::side::{Channel, Side};

use crate::error::{KernelError, KernelResult};

/// Physical device handles.
///
/// Together with [`RobotSettings`] this is the complete robot description.
pub struct Devices {
    pub left_motor: Box<dyn Actuator>,
    pub right_motor: Box<dyn Actuator>,
    pub left_sensor: Box<dyn ReflectanceSensor>,
    pub right_sensor: Box<dyn ReflectanceSensor>,
    pub alfa_sensor: Option<Box<dyn ReflectanceSensor>>,
    pub beta_sensor: Option<Box<dyn ReflectanceSensor>>,
    pub alfa_motor: Option<Box<dyn Actuator>>,
    pub beta_motor: Option<Box<dyn Actuator>>,
}

impl Devices {
    /// Two-wheel, two-sensor robot without auxiliary channels.
    pub fn new(
        left_motor: Box<dyn Actuator>,
        right_motor: Box<dyn Actuator>,
        left_sensor: Box<dyn ReflectanceSensor>,
        right_sensor: Box<dyn ReflectanceSensor>,
    ) -> Self {
        Self {
            left_motor,
            right_motor,
            left_sensor,
            right_sensor,
            alfa_sensor: None,
            beta_sensor: None,
            alfa_motor: None,
            beta_motor: None,
        }
    }

    /// Attach the two auxiliary photodetectors of a four-sensor robot.
    pub fn with_aux_sensors(
        mut self,
        alfa: Box<dyn ReflectanceSensor>,
        beta: Box<dyn ReflectanceSensor>,
    ) -> Self {
        self.alfa_sensor = Some(alfa);
        self.beta_sensor = Some(beta);
        self
    }

    /// Attach an auxiliary actuator on `side` (Alfa or Beta).
    pub fn with_aux_motor(mut self, side: Side, motor: Box<dyn Actuator>) -> KernelResult<Self> {
        match side {
            Side::Alfa => self.alfa_motor = Some(motor),
            Side::Beta => self.beta_motor = Some(motor),
            _ => {
                return Err(KernelError::AggregateSide {
                    side,
                    operation: "auxiliary actuator",
                });
            }
        }
        Ok(self)
    }
}

/// Calibrated access to every actuator, photodetector and the clock.
pub struct Transducers {
    settings: Arc<RobotSettings>,
    devices: Devices,
    clock: Arc<dyn Clock>,
}

impl Transducers {
    /// Wrap devices with their calibration.
    pub fn new(settings: Arc<RobotSettings>, devices: Devices, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            devices,
            clock,
        }
    }

    /// Shared robot settings.
    #[inline]
    pub fn settings(&self) -> &RobotSettings {
        &self.settings
    }

    /// Current time [ms].
    #[inline]
    pub fn now_millis(&self) -> f64 {
        self.clock.now_millis()
    }

    /// Signed calibration coefficient for a single channel.
    pub fn coefficient(&self, side: Side, channel: Channel) -> KernelResult<f64> {
        let e = &self.settings.error;
        let k = match (channel, side) {
            (_, Side::Both) => {
                return Err(KernelError::AggregateSide {
                    side,
                    operation: "calibration lookup",
                });
            }
            (Channel::Motor, Side::Left) => e.k_left_wheel,
            (Channel::Motor, Side::Right) => e.k_right_wheel,
            (Channel::Motor, Side::Alfa) => e.k_alfa_motor,
            (Channel::Motor, Side::Beta) => e.k_beta_motor,
            (Channel::Sensor, Side::Left) => e.k_left_sensor,
            (Channel::Sensor, Side::Right) => e.k_right_sensor,
            (Channel::Sensor, Side::Alfa) => e.k_alfa_sensor,
            (Channel::Sensor, Side::Beta) => e.k_beta_sensor,
        };
        if k == 0.0 {
            return Err(KernelError::ZeroCoefficient { side, channel });
        }
        Ok(k)
    }

    /// Actuator configured for `side`.
    pub fn motor(&self, side: Side) -> KernelResult<&(dyn Actuator + 'static)> {
        let d = &self.devices;
        match side {
            Side::Left => Ok(&*d.left_motor),
            Side::Right => Ok(&*d.right_motor),
            Side::Alfa => d.alfa_motor.as_deref().ok_or(unconfigured(side, Channel::Motor)),
            Side::Beta => d.beta_motor.as_deref().ok_or(unconfigured(side, Channel::Motor)),
            Side::Both => Err(KernelError::AggregateSide {
                side,
                operation: "motor lookup",
            }),
        }
    }

    /// Mutable actuator configured for `side`.
    pub fn motor_mut(&mut self, side: Side) -> KernelResult<&mut (dyn Actuator + 'static)> {
        let d = &mut self.devices;
        match side {
            Side::Left => Ok(&mut *d.left_motor),
            Side::Right => Ok(&mut *d.right_motor),
            Side::Alfa => d
                .alfa_motor
                .as_deref_mut()
                .ok_or(unconfigured(side, Channel::Motor)),
            Side::Beta => d
                .beta_motor
                .as_deref_mut()
                .ok_or(unconfigured(side, Channel::Motor)),
            Side::Both => Err(KernelError::AggregateSide {
                side,
                operation: "motor lookup",
            }),
        }
    }

    /// Photodetector configured for `side`.
    pub fn sensor(&self, side: Side) -> KernelResult<&(dyn ReflectanceSensor + 'static)> {
        let d = &self.devices;
        match side {
            Side::Left => Ok(&*d.left_sensor),
            Side::Right => Ok(&*d.right_sensor),
            Side::Alfa => d.alfa_sensor.as_deref().ok_or(unconfigured(side, Channel::Sensor)),
            Side::Beta => d.beta_sensor.as_deref().ok_or(unconfigured(side, Channel::Sensor)),
            Side::Both => Err(KernelError::AggregateSide {
                side,
                operation: "sensor lookup",
            }),
        }
    }

    /// Calibrated reflectance. Not clamped; negative with a negative
    /// coefficient.
    pub fn read_sensor(&self, side: Side) -> KernelResult<f64> {
        let raw = self.sensor(side)?.reflected_light();
        Ok(raw * self.coefficient(side, Channel::Sensor)?)
    }

    /// Calibrated tacho angle. `Both` averages Left and Right.
    pub fn read_tacho(&self, side: Side) -> KernelResult<f64> {
        if side == Side::Both {
            let left = self.read_tacho(Side::Left)?;
            let right = self.read_tacho(Side::Right)?;
            return Ok((left + right) / 2.0);
        }
        let raw = self.motor(side)?.angle();
        Ok(raw / self.coefficient(side, Channel::Motor)?)
    }

    /// Command a calibrated speed on a single actuator.
    pub fn drive(&mut self, side: Side, speed: f64) -> KernelResult<()> {
        let k = self.coefficient(side, Channel::Motor)?;
        self.motor_mut(side)?.run(speed * k);
        Ok(())
    }

    /// Brake and hold the actuator(s) of `side`. `Both` stops both wheels.
    pub fn stop(&mut self, side: Side) -> KernelResult<()> {
        if side == Side::Both {
            self.stop(Side::Left)?;
            return self.stop(Side::Right);
        }
        let motor = self.motor_mut(side)?;
        motor.set_brake(true);
        motor.stop();
        Ok(())
    }

    /// Brake both wheels and every configured auxiliary actuator.
    pub fn stop_all(&mut self) {
        let d = &mut self.devices;
        let aux = d.alfa_motor.iter_mut().chain(d.beta_motor.iter_mut());
        for motor in [&mut d.left_motor, &mut d.right_motor].into_iter().chain(aux) {
            motor.set_brake(true);
            motor.stop();
        }
    }

    /// Toggle closed-loop speed regulation on both drive actuators.
    pub fn set_regulation(&mut self, enabled: bool) {
        self.devices.left_motor.set_regulated(enabled);
        self.devices.right_motor.set_regulated(enabled);
    }
}

fn unconfigured(side: Side, channel: Channel) -> KernelError {
    KernelError::UnconfiguredChannel { side, channel }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{Rig, StubMotor, StubSensor, settings};

    #[test]
    fn sensor_reading_is_scaled_by_coefficient() {
        let rig = Rig::new();
        let mut s = settings();
        s.error.k_left_sensor = 1.5;
        s.error.k_right_sensor = -1.0;
        let io = rig.transducers(s);
        rig.left_sensor.set(40.0);
        rig.right_sensor.set(40.0);

        assert_eq!(io.read_sensor(Side::Left).unwrap(), 60.0);
        assert_eq!(io.read_sensor(Side::Right).unwrap(), -40.0);
    }

    #[test]
    fn tacho_is_divided_by_coefficient() {
        let rig = Rig::new();
        let mut s = settings();
        s.error.k_left_wheel = -1.0;
        s.error.k_right_wheel = 2.0;
        let io = rig.transducers(s);
        rig.left.set_angle(90.0);
        rig.right.set_angle(90.0);

        assert_eq!(io.read_tacho(Side::Left).unwrap(), -90.0);
        assert_eq!(io.read_tacho(Side::Right).unwrap(), 45.0);
    }

    #[test]
    fn both_tacho_is_the_mean() {
        let rig = Rig::new();
        let io = rig.transducers(settings());
        rig.left.set_angle(100.0);
        rig.right.set_angle(50.0);
        assert_eq!(io.read_tacho(Side::Both).unwrap(), 75.0);
    }

    #[test]
    fn drive_multiplies_by_coefficient() {
        let rig = Rig::new();
        let mut s = settings();
        s.error.k_left_wheel = -1.0;
        let mut io = rig.transducers(s);

        io.drive(Side::Left, 30.0).unwrap();
        io.drive(Side::Right, 30.0).unwrap();
        assert_eq!(rig.left.log().commanded, -30.0);
        assert_eq!(rig.right.log().commanded, 30.0);
    }

    #[test]
    fn both_is_rejected_for_direct_lookup() {
        let rig = Rig::new();
        let mut io = rig.transducers(settings());
        assert!(matches!(
            io.read_sensor(Side::Both),
            Err(KernelError::AggregateSide { .. })
        ));
        assert!(matches!(
            io.drive(Side::Both, 10.0),
            Err(KernelError::AggregateSide { .. })
        ));
    }

    #[test]
    fn unconfigured_aux_channel_fails() {
        let rig = Rig::new();
        let mut io = rig.transducers(settings());
        assert_eq!(
            io.read_sensor(Side::Alfa).unwrap_err(),
            KernelError::UnconfiguredChannel {
                side: Side::Alfa,
                channel: Channel::Sensor
            }
        );
        assert!(matches!(
            io.drive(Side::Beta, 10.0),
            Err(KernelError::UnconfiguredChannel { .. })
        ));
    }

    #[test]
    fn configured_aux_channels_resolve() {
        let rig = Rig::new();
        let alfa = StubSensor::with(20.0);
        let beta = StubSensor::with(30.0);
        let arm = StubMotor::default();
        let devices = rig
            .devices()
            .with_aux_sensors(Box::new(alfa.clone()), Box::new(beta))
            .with_aux_motor(Side::Alfa, Box::new(arm.clone()))
            .unwrap();
        let mut s = settings();
        s.error.k_beta_sensor = 2.0;
        let mut io = Transducers::new(Arc::new(s), devices, Arc::new(rig.clock.clone()));

        assert_eq!(io.read_sensor(Side::Alfa).unwrap(), 20.0);
        assert_eq!(io.read_sensor(Side::Beta).unwrap(), 60.0);
        io.drive(Side::Alfa, 15.0).unwrap();
        assert_eq!(arm.log().commanded, 15.0);

        io.stop_all();
        assert!(arm.log().brake);
        assert_eq!(arm.log().stops, 1);
    }

    #[test]
    fn zero_coefficient_fails_at_use() {
        let rig = Rig::new();
        let mut s = settings();
        s.error.k_right_wheel = 0.0;
        let mut io = rig.transducers(s);
        assert_eq!(
            io.drive(Side::Right, 10.0).unwrap_err(),
            KernelError::ZeroCoefficient {
                side: Side::Right,
                channel: Channel::Motor
            }
        );
        assert!(io.read_tacho(Side::Both).is_err());
        assert!(io.drive(Side::Left, 10.0).is_ok());
    }

    #[test]
    fn stop_engages_brake() {
        let rig = Rig::new();
        let mut io = rig.transducers(settings());
        io.drive(Side::Left, 20.0).unwrap();
        io.drive(Side::Right, 20.0).unwrap();

        io.stop(Side::Both).unwrap();
        for motor in [&rig.left, &rig.right] {
            let log = motor.log();
            assert!(log.brake);
            assert!(!log.running);
            assert_eq!(log.stops, 1);
        }
    }

    #[test]
    fn regulation_toggles_both_wheels() {
        let rig = Rig::new();
        let mut io = rig.transducers(settings());
        io.set_regulation(true);
        assert!(rig.left.log().regulated && rig.right.log().regulated);
        io.set_regulation(false);
        assert!(!rig.left.log().regulated && !rig.right.log().regulated);
    }
}
