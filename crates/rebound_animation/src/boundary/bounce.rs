//! Bounce collisions
//!
//! Discrete collision response against an axis-aligned box, applied on
//! every integration tick. Only the first two components are spatial axes;
//! anything after them passes through untouched.

use serde::{Deserialize, Serialize};

/// Inclusive range on one axis
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Unbounded range
    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// Clamp into the range; tolerates a deserialized range with `min > max`
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

impl From<std::ops::RangeInclusive<f64>> for AxisRange {
    fn from(range: std::ops::RangeInclusive<f64>) -> Self {
        Self::new(*range.start(), *range.end())
    }
}

/// Bounce configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounce {
    pub x: AxisRange,
    pub y: AxisRange,
    restitution: f64,
    #[serde(default)]
    friction: f64,
}

impl Bounce {
    /// Bounce inside the given ranges, losing no energy on impact
    pub fn new(x: impl Into<AxisRange>, y: impl Into<AxisRange>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            restitution: 1.0,
            friction: 0.0,
        }
    }

    /// Fraction of normal velocity kept after an impact, in `[0, 1]`
    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    /// Fraction of velocity lost to the wall on impact, in `[0, 1]`
    pub fn with_friction(mut self, friction: f64) -> Self {
        self.friction = friction;
        self
    }

    pub fn restitution(&self) -> f64 {
        clamp_unit(self.restitution)
    }

    pub fn friction(&self) -> f64 {
        clamp_unit(self.friction)
    }

    fn range(&self, axis: usize) -> AxisRange {
        if axis == 0 {
            self.x
        } else {
            self.y
        }
    }

    /// Resolve collisions for a proposed position and velocity in place
    ///
    /// Only velocity heading out of the range is reflected: a value already
    /// outside but moving back inward is clamped and keeps its velocity.
    ///
    /// Returns whether any axis collided. Callers must supply at least two
    /// components.
    pub fn resolve(&self, position: &mut [f64], velocity: &mut [f64]) -> bool {
        debug_assert!(
            position.len() >= 2 && velocity.len() >= 2,
            "bounce needs two spatial axes"
        );
        let axes = position.len().min(velocity.len()).min(2);
        let restitution = self.restitution();
        let mut collided = false;

        for axis in 0..axes {
            let range = self.range(axis);
            let p = position[axis];
            if p < range.min {
                position[axis] = range.min;
                if velocity[axis] < 0.0 {
                    velocity[axis] = -velocity[axis] * restitution;
                }
                collided = true;
            } else if p > range.max {
                position[axis] = range.max;
                if velocity[axis] > 0.0 {
                    velocity[axis] = -velocity[axis] * restitution;
                }
                collided = true;
            }
        }

        if collided {
            let keep = 1.0 - self.friction();
            for v in velocity.iter_mut().take(axes) {
                *v *= keep;
            }
        }

        collided
    }

    /// Clamp a target into the box so a resting position exists
    pub fn adjust_target(&self, target: &mut [f64]) {
        for (axis, value) in target.iter_mut().take(2).enumerate() {
            *value = self.range(axis).clamp(*value);
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
