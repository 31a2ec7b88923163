//! Floor layout: straight line strips on a uniform floor.
//!
//! # TOML Example
//!
//! ```toml
//! [course]
//! floor = 80.0
//! line = 5.0
//! edge_blur = 0.5
//!
//! [[course.strips]]
//! from = [0.0, 0.0]
//! to = [100.0, 0.0]
//! width = 2.0
//! ```

use pivot_common::config::ConfigError;
use serde::{Deserialize, Serialize};

fn default_floor() -> f64 {
    80.0
}

fn default_line() -> f64 {
    5.0
}

fn default_edge_blur() -> f64 {
    0.5
}

/// One straight line segment painted on the floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Strip {
    /// Start point `[x, y]`.
    pub from: [f64; 2],
    /// End point `[x, y]`.
    pub to: [f64; 2],
    /// Full painted width.
    pub width: f64,
}

impl Strip {
    /// Shortest distance from `(x, y)` to the strip centreline.
    pub fn distance(&self, x: f64, y: f64) -> f64 {
        let [ax, ay] = self.from;
        let [bx, by] = self.to;
        let (dx, dy) = (bx - ax, by - ay);
        let len2 = dx * dx + dy * dy;
        let t = if len2 > 0.0 {
            (((x - ax) * dx + (y - ay) * dy) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (px, py) = (ax + t * dx, ay + t * dy);
        ((x - px).powi(2) + (y - py).powi(2)).sqrt()
    }
}

/// Reflectance map of the floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Course {
    /// Raw reading over bare floor.
    #[serde(default = "default_floor")]
    pub floor: f64,
    /// Raw reading fully over a strip.
    #[serde(default = "default_line")]
    pub line: f64,
    /// Half-width of the linear transition band at a strip edge.
    #[serde(default = "default_edge_blur")]
    pub edge_blur: f64,
    #[serde(default)]
    pub strips: Vec<Strip>,
}

impl Default for Course {
    fn default() -> Self {
        Self {
            floor: default_floor(),
            line: default_line(),
            edge_blur: default_edge_blur(),
            strips: Vec::new(),
        }
    }
}

impl Course {
    /// Fraction of the sensor spot covered by a strip, 0 (floor) to 1 (line).
    pub fn coverage(&self, x: f64, y: f64) -> f64 {
        self.strips
            .iter()
            .map(|strip| {
                let from_edge = strip.width / 2.0 - strip.distance(x, y);
                if self.edge_blur > 0.0 {
                    ((from_edge + self.edge_blur) / (2.0 * self.edge_blur)).clamp(0.0, 1.0)
                } else if from_edge >= 0.0 {
                    1.0
                } else {
                    0.0
                }
            })
            .fold(0.0, f64::max)
    }

    /// Raw reflectance at `(x, y)`.
    pub fn reflectance(&self, x: f64, y: f64) -> f64 {
        self.floor + (self.line - self.floor) * self.coverage(x, y)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` on a negative blur, a
    /// non-positive strip width or a non-finite coordinate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.edge_blur.is_finite() || self.edge_blur < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "edge_blur must be a non-negative number, got {}",
                self.edge_blur
            )));
        }
        for (i, strip) in self.strips.iter().enumerate() {
            if strip.width.is_nan() || strip.width <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "strip {i}: width must be positive, got {}",
                    strip.width
                )));
            }
            if strip.from.iter().chain(&strip.to).any(|v| !v.is_finite()) {
                return Err(ConfigError::ValidationError(format!(
                    "strip {i}: coordinates must be finite"
                )));
            }
        }
        Ok(())
    }
}
