//! Differential-drive physics.
//!
//! The world owns everything the simulated devices observe: body pose,
//! four motor ports (two drive wheels, two auxiliary), simulated time, and
//! the course. Devices share it behind `Arc<Mutex<World>>`; only
//! [`World::advance`] moves time forward.

use pivot_common::consts::{
    DEGREES_PER_REVOLUTION, LARGE_MOTOR_MAX_DPS, MAX_SPEED_COMMAND, MEDIUM_MOTOR_MAX_DPS,
};
use pivot_common::settings::RobotSettings;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::time::Duration;
use tracing::trace;

use crate::course::Course;

/// Speed fraction an unregulated motor reaches under load.
pub const LOAD_FACTOR: f64 = 0.9;

/// Longest physics step [ms]. Longer sleeps are split.
pub const MAX_STEP_MS: f64 = 1.0;

/// Body position and orientation. Heading is in degrees, counter-clockwise
/// from +x.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pose {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub heading: f64,
}

/// Photodetector placement beyond what the robot settings carry.
///
/// Primary sensors sit `sensor_offset` ahead of the axle (from the robot
/// settings), `sensor_spacing / 2` to either side. Auxiliary sensors sit a
/// further `aux_offset` ahead, `aux_spacing / 2` to either side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Body {
    pub sensor_spacing: f64,
    #[serde(default)]
    pub aux_offset: f64,
    #[serde(default)]
    pub aux_spacing: f64,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            sensor_spacing: 4.0,
            aux_offset: 0.0,
            aux_spacing: 0.0,
        }
    }
}

/// Single physical port, used to address motors and sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    Left,
    Right,
    Alfa,
    Beta,
}

impl Port {
    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// State of one motor port.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wheel {
    /// Accumulated tacho [deg].
    pub angle: f64,
    /// Commanded speed [%].
    pub command: f64,
    pub regulated: bool,
    pub brake: bool,
    /// Absolute tacho angle at which a `run_to` ends.
    pub target: Option<f64>,
}

impl Wheel {
    /// Integrate `dt` seconds at `max_dps`, returning the tacho delta.
    fn step(&mut self, dt: f64, max_dps: f64) -> f64 {
        let command = self.command.clamp(-MAX_SPEED_COMMAND, MAX_SPEED_COMMAND);
        let load = if self.regulated { 1.0 } else { LOAD_FACTOR };
        let delta = command / MAX_SPEED_COMMAND * max_dps * load * dt;

        if let Some(target) = self.target {
            let remaining = target - self.angle;
            if delta != 0.0 && delta.abs() >= remaining.abs() {
                self.angle = target;
                self.command = 0.0;
                self.target = None;
                return remaining;
            }
        }

        self.angle += delta;
        delta
    }
}

/// Simulated robot and floor.
#[derive(Debug, Clone)]
pub struct World {
    pose: Pose,
    wheels: [Wheel; 4],
    elapsed_ms: f64,
    max_dps: f64,
    wheel_diameter: f64,
    track_width: f64,
    sensor_offset: f64,
    body: Body,
    course: Course,
}

impl World {
    pub fn new(settings: &RobotSettings, body: Body, course: Course, start: Pose) -> Self {
        let max_dps = if settings.electronic.large_motors {
            LARGE_MOTOR_MAX_DPS
        } else {
            MEDIUM_MOTOR_MAX_DPS
        };
        Self {
            pose: start,
            wheels: Default::default(),
            elapsed_ms: 0.0,
            max_dps,
            wheel_diameter: settings.construction.wheel_diameter,
            track_width: settings.construction.track_width,
            sensor_offset: settings.construction.sensor_offset,
            body,
            course,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Simulated milliseconds since construction.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn wheel(&self, port: Port) -> &Wheel {
        &self.wheels[port.index()]
    }

    pub fn wheel_mut(&mut self, port: Port) -> &mut Wheel {
        &mut self.wheels[port.index()]
    }

    /// Floor position under a sensor.
    pub fn sensor_position(&self, port: Port) -> (f64, f64) {
        let (forward, lateral) = match port {
            Port::Left => (self.sensor_offset, self.body.sensor_spacing / 2.0),
            Port::Right => (self.sensor_offset, -self.body.sensor_spacing / 2.0),
            Port::Alfa => (
                self.sensor_offset + self.body.aux_offset,
                self.body.aux_spacing / 2.0,
            ),
            Port::Beta => (
                self.sensor_offset + self.body.aux_offset,
                -self.body.aux_spacing / 2.0,
            ),
        };
        let (sin, cos) = self.pose.heading.to_radians().sin_cos();
        (
            self.pose.x + forward * cos - lateral * sin,
            self.pose.y + forward * sin + lateral * cos,
        )
    }

    /// Raw reflectance seen by a sensor.
    pub fn reflectance(&self, port: Port) -> f64 {
        let (x, y) = self.sensor_position(port);
        self.course.reflectance(x, y)
    }

    /// Advance simulated time by `period`, in steps of at most
    /// [`MAX_STEP_MS`].
    pub fn advance(&mut self, period: Duration) {
        let total_ms = period.as_secs_f64() * 1000.0;
        if total_ms <= 0.0 {
            return;
        }
        let steps = (total_ms / MAX_STEP_MS).ceil().max(1.0);
        let dt_ms = total_ms / steps;
        for _ in 0..steps as u64 {
            self.step(dt_ms / 1000.0);
        }
        self.elapsed_ms += total_ms;
        trace!(
            x = self.pose.x,
            y = self.pose.y,
            heading = self.pose.heading,
            t = self.elapsed_ms,
            "world advanced"
        );
    }

    fn step(&mut self, dt: f64) {
        let max_dps = self.max_dps;
        let mut deltas = [0.0; 4];
        for (wheel, delta) in self.wheels.iter_mut().zip(deltas.iter_mut()) {
            *delta = wheel.step(dt, max_dps);
        }

        let per_degree = PI * self.wheel_diameter / DEGREES_PER_REVOLUTION;
        let left = deltas[Port::Left.index()] * per_degree;
        let right = deltas[Port::Right.index()] * per_degree;
        let distance = (left + right) / 2.0;
        let turn = (right - left) / self.track_width;

        let mid = self.pose.heading.to_radians() + turn / 2.0;
        self.pose.x += distance * mid.cos();
        self.pose.y += distance * mid.sin();
        self.pose.heading += turn.to_degrees();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::Strip;

    fn settings() -> RobotSettings {
        toml::from_str(
            r#"
            [electronic]
            speed = 30.0
            large_motors = true
            [construction]
            wheel_diameter = 5.6
            track_width = 12.0
            sensor_offset = 6.0
            [error]
            k_left_wheel = 1.0
            k_right_wheel = 1.0
            k_left_sensor = 1.0
            k_right_sensor = 1.0
            [line]
            kp = 1.0
            ki = 0.0
            kd = 0.0
            black = 20.0
            white = 60.0
            "#,
        )
        .unwrap()
    }

    fn world() -> World {
        World::new(&settings(), Body::default(), Course::default(), Pose::default())
    }

    #[test]
    fn regulated_wheel_runs_at_rated_speed() {
        let mut w = world();
        let wheel = w.wheel_mut(Port::Left);
        wheel.regulated = true;
        wheel.command = 50.0;
        w.advance(Duration::from_secs(1));
        assert!((w.wheel(Port::Left).angle - 525.0).abs() < 1e-6);
        assert!((w.elapsed_ms() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn unregulated_wheel_loses_to_load() {
        let mut w = world();
        w.wheel_mut(Port::Right).command = 100.0;
        w.advance(Duration::from_secs(1));
        assert!((w.wheel(Port::Right).angle - 1050.0 * LOAD_FACTOR).abs() < 1e-6);
    }

    #[test]
    fn straight_drive_moves_along_heading() {
        let mut w = world();
        for port in [Port::Left, Port::Right] {
            let wheel = w.wheel_mut(port);
            wheel.regulated = true;
            wheel.command = 100.0;
        }
        w.advance(Duration::from_secs(1));
        let travelled = 1050.0 / 360.0 * PI * 5.6;
        let pose = w.pose();
        assert!((pose.x - travelled).abs() < 1e-6);
        assert!(pose.y.abs() < 1e-9);
        assert!(pose.heading.abs() < 1e-9);
    }

    #[test]
    fn right_wheel_forward_turns_counter_clockwise() {
        let mut w = world();
        w.wheel_mut(Port::Left).command = -30.0;
        w.wheel_mut(Port::Right).command = 30.0;
        w.advance(Duration::from_millis(200));
        assert!(w.pose().heading > 0.0);
        assert!(w.pose().x.abs() < 1e-9);
    }

    #[test]
    fn spin_angle_matches_wheel_travel() {
        let mut w = world();
        w.wheel_mut(Port::Left).command = -30.0;
        w.wheel_mut(Port::Right).command = 30.0;
        w.advance(Duration::from_millis(500));
        // body degrees = wheel degrees · diameter / track
        let wheel = w.wheel(Port::Right).angle;
        assert!((w.pose().heading - wheel * 5.6 / 12.0).abs() < 1e-6);
    }

    #[test]
    fn run_to_stops_exactly_on_target() {
        let mut w = world();
        let wheel = w.wheel_mut(Port::Alfa);
        wheel.command = -40.0;
        wheel.target = Some(-90.0);
        w.advance(Duration::from_secs(2));
        let wheel = w.wheel(Port::Alfa);
        assert_eq!(wheel.angle, -90.0);
        assert_eq!(wheel.command, 0.0);
        assert!(wheel.target.is_none());
        // Auxiliary ports do not move the body.
        assert_eq!(w.pose(), Pose::default());
    }

    #[test]
    fn sensors_sit_ahead_and_aside() {
        let mut w = World::new(
            &settings(),
            Body {
                sensor_spacing: 4.0,
                aux_offset: 2.0,
                aux_spacing: 10.0,
            },
            Course::default(),
            Pose {
                x: 0.0,
                y: 0.0,
                heading: 90.0,
            },
        );
        let (x, y) = w.sensor_position(Port::Left);
        assert!((x + 2.0).abs() < 1e-9 && (y - 6.0).abs() < 1e-9);
        let (x, y) = w.sensor_position(Port::Beta);
        assert!((x - 5.0).abs() < 1e-9 && (y - 8.0).abs() < 1e-9);

        w.pose = Pose::default();
        let (x, y) = w.sensor_position(Port::Right);
        assert!((x - 6.0).abs() < 1e-9 && (y + 2.0).abs() < 1e-9);
    }

    #[test]
    fn reflectance_follows_course() {
        let course = Course {
            strips: vec![Strip {
                from: [6.0, -10.0],
                to: [6.0, 10.0],
                width: 2.0,
            }],
            ..Course::default()
        };
        let w = World::new(&settings(), Body::default(), course, Pose::default());
        assert_eq!(w.reflectance(Port::Left), 5.0);
        assert_eq!(w.reflectance(Port::Right), 5.0);
    }
}
