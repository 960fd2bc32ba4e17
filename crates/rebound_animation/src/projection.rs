//! Release projection
//!
//! Converts gesture output into a resting value for the integrator to aim
//! at. All functions are pure.

use rebound_core::values::{add, scale, sub};
use rebound_core::{Animatable, Components};
use std::f64::consts::TAU;

/// Seconds of travel assumed when only a velocity is known
pub const DEFAULT_FALLBACK_TIME: f64 = 0.25;

/// Deceleration rate of a normal scroll view, per millisecond
pub const DECELERATION_NORMAL: f64 = 0.998;

/// Deceleration rate of a fast scroll view, per millisecond
pub const DECELERATION_FAST: f64 = 0.99;

const MAX_DECELERATION_RATE: f64 = 0.999;

/// Options shared by the scalar and vector projections
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionOptions {
    /// Largest allowed displacement magnitude, per axis
    pub max_distance: Option<f64>,
    /// Travel time used to turn a velocity into a displacement
    pub fallback_time: f64,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            max_distance: None,
            fallback_time: DEFAULT_FALLBACK_TIME,
        }
    }
}

impl ProjectionOptions {
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    pub fn with_fallback_time(mut self, fallback_time: f64) -> Self {
        self.fallback_time = fallback_time;
        self
    }

    fn limit(&self, delta: f64) -> f64 {
        let delta = if delta.is_finite() { delta } else { 0.0 };
        match self.max_distance {
            Some(max) if max.is_finite() => {
                let max = max.abs();
                delta.clamp(-max, max)
            }
            _ => delta,
        }
    }

    fn fallback_time(&self) -> f64 {
        if self.fallback_time.is_finite() {
            self.fallback_time.max(0.0)
        } else {
            DEFAULT_FALLBACK_TIME
        }
    }
}

/// Resting value of a scalar after release
///
/// Uses `predicted_delta` when the gesture system supplies one, otherwise
/// `velocity * fallback_time`.
pub fn project_scalar(
    current: f64,
    predicted_delta: Option<f64>,
    velocity: f64,
    options: &ProjectionOptions,
) -> f64 {
    let delta = predicted_delta.unwrap_or(velocity * options.fallback_time());
    current + options.limit(delta)
}

/// Resting value of a vector after release, clamped independently per axis
pub fn project_value<V: Animatable>(
    current: &V,
    predicted_delta: Option<&V>,
    velocity: &V,
    options: &ProjectionOptions,
) -> V {
    let delta = match predicted_delta {
        Some(delta) => delta.components(),
        None => scale(&velocity.components(), options.fallback_time()),
    };
    let limited: Components = delta.iter().map(|d| options.limit(*d)).collect();
    V::from_components(&add(&current.components(), &limited))
}

/// Resting angle (radians) after a horizontal drag
///
/// `angle_scale` converts horizontal units into radians. `max_wraps` caps
/// the rotation at that many full turns in either direction.
pub fn project_angle(
    current: f64,
    predicted_horizontal_delta: f64,
    angle_scale: f64,
    max_wraps: Option<f64>,
) -> f64 {
    let mut delta = predicted_horizontal_delta * angle_scale;
    if !delta.is_finite() {
        return current;
    }
    if let Some(wraps) = max_wraps.filter(|w| w.is_finite()) {
        let max = wraps.abs() * TAU;
        delta = delta.clamp(-max, max);
    }
    current + delta
}

/// Distance travelled by a decelerating scroll released at `velocity`
///
/// `velocity` is in units per second and `deceleration_rate` is the
/// per-millisecond multiplier applied to it.
pub fn decay_distance(velocity: f64, deceleration_rate: f64) -> f64 {
    let rate = if deceleration_rate.is_finite() {
        deceleration_rate.clamp(0.0, MAX_DECELERATION_RATE)
    } else {
        DECELERATION_NORMAL
    };
    velocity / 1000.0 * rate / (1.0 - rate)
}

/// Resting value after momentum scrolling, per component
pub fn project_with_deceleration<V: Animatable>(
    current: &V,
    velocity: &V,
    deceleration_rate: f64,
) -> V {
    let distance: Components = velocity
        .components()
        .iter()
        .map(|v| decay_distance(*v, deceleration_rate))
        .collect();
    V::from_components(&add(&current.components(), &distance))
}

/// Time for a decelerating scroll to fall below `threshold` units per second
pub fn decay_duration(velocity: f64, deceleration_rate: f64, threshold: f64) -> f64 {
    let rate = deceleration_rate.clamp(f64::MIN_POSITIVE, MAX_DECELERATION_RATE);
    let speed = velocity.abs();
    let threshold = threshold.abs().max(f64::MIN_POSITIVE);
    if !speed.is_finite() || speed <= threshold {
        return 0.0;
    }
    // velocity * rate^ms = threshold
    let ms = (threshold / speed).log10() / rate.log10();
    ms / 1000.0
}

/// Displacement still to come between two values
pub fn remaining<V: Animatable>(current: &V, target: &V) -> V {
    V::from_components(&sub(&target.components(), &current.components()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebound_core::Point;

    #[test]
    fn test_scalar_prefers_prediction() {
        let options = ProjectionOptions::default();
        assert_eq!(project_scalar(10.0, Some(5.0), 1000.0, &options), 15.0);
        assert_eq!(project_scalar(10.0, None, 100.0, &options), 35.0);
    }

    #[test]
    fn test_scalar_max_distance() {
        let options = ProjectionOptions::default().with_max_distance(20.0);
        assert_eq!(project_scalar(0.0, Some(50.0), 0.0, &options), 20.0);
        assert_eq!(project_scalar(0.0, Some(-50.0), 0.0, &options), -20.0);
        assert_eq!(project_scalar(0.0, Some(5.0), 0.0, &options), 5.0);
    }

    #[test]
    fn test_value_clamps_per_axis() {
        let options = ProjectionOptions::default().with_max_distance(100.0);
        let projected = project_value(
            &Point::new(0.0, 0.0),
            None,
            &Point::new(1000.0, -200.0),
            &options,
        );
        assert_eq!(projected, Point::new(100.0, -50.0));

        let projected = project_value(
            &Point::new(10.0, 10.0),
            Some(&Point::new(-300.0, 30.0)),
            &Point::ZERO,
            &options,
        );
        assert_eq!(projected, Point::new(-90.0, 40.0));
    }

    #[test]
    fn test_fallback_time() {
        let options = ProjectionOptions::default().with_fallback_time(0.5);
        assert_eq!(project_scalar(0.0, None, 10.0, &options), 5.0);
    }

    #[test]
    fn test_angle_wrap_cap() {
        let angle = project_angle(0.0, 100.0, 0.01, None);
        assert!((angle - 1.0).abs() < 1e-12);

        let capped = project_angle(1.0, 10_000.0, 0.01, Some(2.0));
        assert!((capped - (1.0 + 2.0 * TAU)).abs() < 1e-12);

        let capped = project_angle(0.0, -10_000.0, 0.01, Some(1.0));
        assert!((capped + TAU).abs() < 1e-12);
    }

    #[test]
    fn test_decay_distance() {
        // 1000 px/s at the normal rate travels 499 px
        assert!((decay_distance(1000.0, DECELERATION_NORMAL) - 499.0).abs() < 1e-6);
        assert!(decay_distance(-1000.0, DECELERATION_FAST) < 0.0);
        assert_eq!(decay_distance(1000.0, 0.0), 0.0);
        // Rate is capped below 1
        assert!(decay_distance(1000.0, 1.5).is_finite());
    }

    #[test]
    fn test_project_with_deceleration() {
        let projected =
            project_with_deceleration(&Point::new(10.0, 0.0), &Point::new(1000.0, 0.0), 0.99);
        assert!((projected.x - 109.0).abs() < 1e-6);
        assert_eq!(projected.y, 0.0);
    }

    #[test]
    fn test_decay_duration() {
        let t = decay_duration(1000.0, DECELERATION_NORMAL, 1.0);
        // 1000 * 0.998^ms = 1
        let expected = (1e-3f64).ln() / DECELERATION_NORMAL.ln() / 1000.0;
        assert!((t - expected).abs() < 1e-9);
        assert_eq!(decay_duration(0.5, DECELERATION_NORMAL, 1.0), 0.0);
    }

    #[test]
    fn test_remaining() {
        assert_eq!(
            remaining(&Point::new(1.0, 2.0), &Point::new(4.0, 0.0)),
            Point::new(3.0, -2.0)
        );
    }
}
