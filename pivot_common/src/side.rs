//! Logical channel selector.
//!
//! A [`Side`] names a drive wheel or photodetector channel. It is a lookup
//! key only; the mapping to a physical device lives in the transducer layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical drive/sensor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Left wheel or left primary photodetector.
    Left,
    /// Right wheel or right primary photodetector.
    Right,
    /// Aggregate of Left and Right. Never resolves to a single device.
    Both,
    /// First auxiliary channel.
    Alfa,
    /// Second auxiliary channel.
    Beta,
}

/// Kind of device a [`Side`] is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Drive or auxiliary actuator.
    Motor,
    /// Reflectance photodetector.
    Sensor,
}

impl Side {
    /// The two primary channels, left first.
    pub const PRIMARY: [Side; 2] = [Side::Left, Side::Right];

    /// Rotation sign when this side is used as a turn direction.
    ///
    /// Left turns counter-clockwise (+1), Right clockwise (−1).
    pub const fn rotation_sign(self) -> Option<f64> {
        match self {
            Side::Left => Some(1.0),
            Side::Right => Some(-1.0),
            _ => None,
        }
    }

    /// Steering sign for single-sensor edge following.
    ///
    /// Left-hand sensors (Left, Alfa) hug a line lying to their right and
    /// steer with +1; right-hand sensors (Right, Beta) steer with −1.
    pub const fn follow_sign(self) -> Option<f64> {
        match self {
            Side::Left | Side::Alfa => Some(1.0),
            Side::Right | Side::Beta => Some(-1.0),
            Side::Both => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Both => "both",
            Side::Alfa => "alfa",
            Side::Beta => "beta",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Motor => f.write_str("motor"),
            Channel::Sensor => f.write_str("sensor"),
        }
    }
}
