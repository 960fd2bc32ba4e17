//! Gesture velocity tracking
//!
//! A bounded window of `(delta, dt)` samples produces a trailing average
//! rate per axis. The tracker lives for one gesture and is reset between
//! gestures.

use rebound_core::values::zeros;
use rebound_core::{Animatable, Components};
use std::collections::VecDeque;
use std::marker::PhantomData;

/// Samples kept by default
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// Smallest useful window
pub const MIN_HISTORY_WINDOW: usize = 2;

/// Floor applied to time deltas before dividing by them, in seconds
pub const MIN_SAMPLE_DT: f64 = 1e-6;

#[derive(Clone, Debug)]
struct Sample {
    delta: Components,
    dt: f64,
}

/// Trailing-window velocity estimator
#[derive(Clone, Debug)]
pub struct VelocityTracker<V: Animatable> {
    window: usize,
    samples: VecDeque<Sample>,
    last_position: Option<(Components, f64)>,
    last_sign: Components,
    _value: PhantomData<fn() -> V>,
}

impl<V: Animatable> Default for VelocityTracker<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Animatable> VelocityTracker<V> {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_HISTORY_WINDOW)
    }

    /// Tracker keeping at most `window` samples (at least 2)
    pub fn with_window(window: usize) -> Self {
        let window = window.max(MIN_HISTORY_WINDOW);
        Self {
            window,
            samples: VecDeque::with_capacity(window),
            last_position: None,
            last_sign: zeros(V::arity()),
            _value: PhantomData,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Forget everything from the previous gesture
    pub fn reset(&mut self) {
        self.samples.clear();
        self.last_position = None;
        self.last_sign = zeros(V::arity());
    }

    /// Record an absolute position at `timestamp` seconds
    ///
    /// Timestamps are expected to increase; the first call only anchors the
    /// position.
    pub fn record_position(&mut self, position: &V, timestamp: f64) {
        let position = position.components();
        if let Some((previous, previous_time)) = self.last_position.take() {
            let delta = rebound_core::values::sub(&position, &previous);
            self.push(delta, timestamp - previous_time);
        }
        self.last_position = Some((position, timestamp));
    }

    /// Record a movement of `delta` over `dt` seconds
    pub fn record_delta(&mut self, delta: &V, dt: f64) {
        self.push(delta.components(), dt);
    }

    fn push(&mut self, delta: Components, dt: f64) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        let dt = if dt.is_finite() { dt.max(MIN_SAMPLE_DT) } else { MIN_SAMPLE_DT };
        self.samples.push_back(Sample { delta, dt });
    }

    /// Current velocity estimate, in units per second
    ///
    /// `predicted_remaining` is the displacement the gesture system predicts
    /// is still to come; it only decides direction when an axis moved but
    /// its samples cancel out exactly.
    pub fn velocity(&mut self, predicted_remaining: Option<&V>) -> V {
        let predicted = predicted_remaining.map(Animatable::components);
        let total_dt: f64 = self
            .samples
            .iter()
            .map(|s| s.dt)
            .sum::<f64>()
            .max(MIN_SAMPLE_DT);
        let arity = self
            .samples
            .iter()
            .map(|s| s.delta.len())
            .max()
            .unwrap_or(0)
            .max(V::arity());

        let mut velocity = zeros(arity);
        for (axis, out) in velocity.iter_mut().enumerate() {
            let delta_at = |s: &Sample| s.delta.get(axis).copied().unwrap_or(0.0);
            let net: f64 = self.samples.iter().map(delta_at).sum();

            let rate = if net != 0.0 {
                net / total_dt
            } else {
                // Samples cancel out; use the latest movement's speed
                let Some(latest) = self.samples.iter().rev().find(|s| delta_at(*s) != 0.0) else {
                    continue;
                };
                let speed = delta_at(latest).abs() / latest.dt;
                let predicted_sign = predicted
                    .as_ref()
                    .and_then(|p| p.get(axis).copied())
                    .filter(|p| *p != 0.0)
                    .map(f64::signum);
                let remembered_sign = self
                    .last_sign
                    .get(axis)
                    .copied()
                    .filter(|s| *s != 0.0);
                match predicted_sign.or(remembered_sign) {
                    Some(sign) => sign * speed,
                    None => 0.0,
                }
            };

            if rate != 0.0 {
                if self.last_sign.len() <= axis {
                    self.last_sign.resize(axis + 1, 0.0);
                }
                self.last_sign[axis] = rate.signum();
            }
            *out = rate;
        }

        V::from_components(&velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebound_core::Point;

    #[test]
    fn test_trailing_average() {
        let mut tracker = VelocityTracker::<f64>::new();
        tracker.record_delta(&10.0, 0.01);
        tracker.record_delta(&20.0, 0.01);
        tracker.record_delta(&30.0, 0.02);
        // 60 units over 40 ms
        assert!((tracker.velocity(None) - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut tracker = VelocityTracker::<f64>::with_window(2);
        tracker.record_delta(&1000.0, 0.01);
        tracker.record_delta(&1.0, 0.01);
        tracker.record_delta(&1.0, 0.01);
        assert_eq!(tracker.len(), 2);
        assert!((tracker.velocity(None) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_minimum() {
        let tracker = VelocityTracker::<f64>::with_window(0);
        assert_eq!(tracker.window(), MIN_HISTORY_WINDOW);
    }

    #[test]
    fn test_positions_become_deltas() {
        let mut tracker = VelocityTracker::<Point>::new();
        tracker.record_position(&Point::new(0.0, 0.0), 1.00);
        tracker.record_position(&Point::new(10.0, -5.0), 1.01);
        tracker.record_position(&Point::new(20.0, -10.0), 1.02);
        let v = tracker.velocity(None);
        assert!((v.x - 1000.0).abs() < 1e-6);
        assert!((v.y + 500.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_dt_is_floored() {
        let mut tracker = VelocityTracker::<f64>::new();
        tracker.record_position(&0.0, 2.0);
        tracker.record_position(&1.0, 2.0);
        let v = tracker.velocity(None);
        assert!(v.is_finite());
        assert!((v - 1.0 / MIN_SAMPLE_DT).abs() < 1e-3);
    }

    #[test]
    fn test_ambiguous_direction_uses_prediction() {
        let mut tracker = VelocityTracker::<f64>::new();
        tracker.record_delta(&5.0, 0.01);
        tracker.record_delta(&-5.0, 0.01);

        // Latest movement was 500/s; prediction says we are heading up
        assert!((tracker.velocity(Some(&3.0)) - 500.0).abs() < 1e-9);
        // Without a prediction the last reported sign wins
        assert!((tracker.velocity(None) - 500.0).abs() < 1e-9);
        assert!((tracker.velocity(Some(&-1.0)) + 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_ambiguous_direction_without_history() {
        let mut tracker = VelocityTracker::<f64>::new();
        tracker.record_delta(&5.0, 0.01);
        tracker.record_delta(&-5.0, 0.01);
        assert_eq!(tracker.velocity(None), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut tracker = VelocityTracker::<f64>::new();
        tracker.record_position(&0.0, 0.0);
        tracker.record_position(&10.0, 0.1);
        tracker.reset();
        assert!(tracker.is_empty());
        assert_eq!(tracker.velocity(None), 0.0);
        // First sample after reset only anchors
        tracker.record_position(&50.0, 1.0);
        assert!(tracker.is_empty());
    }
}
