//! Spring model
//!
//! A spring is described by its damping ratio, its response time and the
//! threshold below which motion counts as settled. The angular frequency
//! `ω = 2π / response` is derived once and reused every tick.

use rebound_core::{MotionError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::{LN_10, TAU};

/// Smallest accepted response, in seconds
pub const MIN_RESPONSE: f64 = 0.001;

/// Smallest accepted settle threshold
pub const MIN_SETTLE_THRESHOLD: f64 = 1e-6;

/// Settle threshold used by presets
pub const DEFAULT_SETTLE_THRESHOLD: f64 = 0.001;

const SMOOTH_DAMPING_RATIO: f64 = 1.0;
const SMOOTH_RESPONSE: f64 = 0.5;

/// Immutable spring constants
///
/// Construct with [`SpringModel::new`] (clamps) or [`SpringModel::try_new`]
/// (rejects non-finite input). Replacing the model on a running animation
/// keeps its position and velocity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SpringParams", into = "SpringParams")]
pub struct SpringModel {
    damping_ratio: f64,
    response: f64,
    settle_threshold: f64,
    omega: f64,
}

/// Serialized form of a spring model
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct SpringParams {
    damping_ratio: f64,
    response: f64,
    #[serde(default = "default_settle_threshold")]
    settle_threshold: f64,
}

fn default_settle_threshold() -> f64 {
    DEFAULT_SETTLE_THRESHOLD
}

impl TryFrom<SpringParams> for SpringModel {
    type Error = MotionError;

    fn try_from(params: SpringParams) -> Result<Self> {
        SpringModel::try_new(params.damping_ratio, params.response, params.settle_threshold)
    }
}

impl From<SpringModel> for SpringParams {
    fn from(model: SpringModel) -> Self {
        Self {
            damping_ratio: model.damping_ratio,
            response: model.response,
            settle_threshold: model.settle_threshold,
        }
    }
}

impl SpringModel {
    /// Create a spring, clamping every parameter into its valid range
    ///
    /// Non-finite values fall back to the `smooth` preset's value for that
    /// parameter.
    pub fn new(damping_ratio: f64, response: f64, settle_threshold: f64) -> Self {
        let damping_ratio = if damping_ratio.is_finite() {
            damping_ratio.max(0.0)
        } else {
            SMOOTH_DAMPING_RATIO
        };
        let response = if response.is_finite() {
            response.max(MIN_RESPONSE)
        } else {
            SMOOTH_RESPONSE
        };
        let settle_threshold = if settle_threshold.is_finite() {
            settle_threshold.max(MIN_SETTLE_THRESHOLD)
        } else {
            DEFAULT_SETTLE_THRESHOLD
        };

        Self {
            damping_ratio,
            response,
            settle_threshold,
            omega: TAU / response,
        }
    }

    /// Create a spring, rejecting NaN and infinite parameters
    pub fn try_new(damping_ratio: f64, response: f64, settle_threshold: f64) -> Result<Self> {
        MotionError::check_finite("damping_ratio", damping_ratio)?;
        MotionError::check_finite("response", response)?;
        MotionError::check_finite("settle_threshold", settle_threshold)?;
        Ok(Self::new(damping_ratio, response, settle_threshold))
    }

    /// Create a spring with the default settle threshold
    pub fn with_response(damping_ratio: f64, response: f64) -> Self {
        Self::new(damping_ratio, response, DEFAULT_SETTLE_THRESHOLD)
    }

    /// Convert classic stiffness/damping/mass parameters
    pub fn from_physical(stiffness: f64, damping: f64, mass: f64) -> Self {
        let mass = mass.max(f64::EPSILON);
        let stiffness = stiffness.max(f64::EPSILON);
        let omega = (stiffness / mass).sqrt();
        let damping_ratio = damping / (2.0 * (stiffness * mass).sqrt());
        Self::with_response(damping_ratio, TAU / omega)
    }

    /// Same spring with a different settle threshold
    pub fn with_settle_threshold(self, settle_threshold: f64) -> Self {
        Self::new(self.damping_ratio, self.response, settle_threshold)
    }

    // ========================================================================
    // Presets
    // ========================================================================

    /// Critically damped, half-second response
    pub fn smooth() -> Self {
        Self::with_response(SMOOTH_DAMPING_RATIO, SMOOTH_RESPONSE)
    }

    /// Fast and slightly underdamped
    pub fn snappy() -> Self {
        Self::from_physical(600.0, 40.0, 1.0)
    }

    /// Visible overshoot, medium speed
    pub fn bouncy() -> Self {
        Self::with_response(0.7, 0.5)
    }

    /// A gentle, slow spring (good for page transitions)
    pub fn gentle() -> Self {
        Self::from_physical(120.0, 14.0, 1.0)
    }

    /// A wobbly spring with overshoot (good for playful UI)
    pub fn wobbly() -> Self {
        Self::from_physical(180.0, 12.0, 1.0)
    }

    /// A stiff spring (good for buttons)
    pub fn stiff() -> Self {
        Self::from_physical(400.0, 30.0, 1.0)
    }

    /// A slow spring with no overshoot (critically damped)
    pub fn molasses() -> Self {
        Self::from_physical(100.0, 20.0, 1.0)
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "smooth" => Some(Self::smooth()),
            "snappy" => Some(Self::snappy()),
            "bouncy" => Some(Self::bouncy()),
            "gentle" => Some(Self::gentle()),
            "wobbly" => Some(Self::wobbly()),
            "stiff" => Some(Self::stiff()),
            "molasses" => Some(Self::molasses()),
            _ => None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn damping_ratio(&self) -> f64 {
        self.damping_ratio
    }

    pub fn response(&self) -> f64 {
        self.response
    }

    pub fn settle_threshold(&self) -> f64 {
        self.settle_threshold
    }

    /// Angular frequency `2π / response`
    pub fn omega(&self) -> f64 {
        self.omega
    }

    /// Equivalent stiffness for unit mass
    pub fn stiffness(&self) -> f64 {
        self.omega * self.omega
    }

    /// Equivalent damping coefficient for unit mass
    pub fn damping(&self) -> f64 {
        2.0 * self.damping_ratio * self.omega
    }

    /// Check if the spring is underdamped (will oscillate)
    pub fn is_underdamped(&self) -> bool {
        self.damping_ratio < 1.0 - 1e-3
    }

    /// Check if the spring is critically damped (no oscillation, fastest settling)
    pub fn is_critically_damped(&self) -> bool {
        (self.damping_ratio - 1.0).abs() <= 1e-3
    }

    /// Check if the spring is overdamped (slow settling, no oscillation)
    pub fn is_overdamped(&self) -> bool {
        self.damping_ratio > 1.0 + 1e-3
    }

    /// Time for the decay envelope of a unit displacement to fall below the
    /// settle threshold. Infinite for an undamped spring.
    pub fn settling_duration(&self) -> f64 {
        let zeta = self.damping_ratio;
        if zeta <= 0.0 {
            return f64::INFINITY;
        }
        // Slowest pole: ζω when underdamped, ω(ζ - √(ζ²-1)) otherwise
        let decay_rate = if zeta < 1.0 {
            zeta * self.omega
        } else {
            self.omega * (zeta - (zeta * zeta - 1.0).sqrt())
        };
        let decades = -self.settle_threshold.log10();
        decades * LN_10 / decay_rate
    }
}

impl Default for SpringModel {
    fn default() -> Self {
        Self::smooth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_omega_is_derived_from_response() {
        let spring = SpringModel::with_response(1.0, 0.5);
        assert!((spring.omega() - TAU / 0.5).abs() < 1e-12);
        assert!((spring.stiffness() - spring.omega().powi(2)).abs() < 1e-9);
    }

    #[test]
    fn test_parameters_are_clamped() {
        let spring = SpringModel::new(-1.0, 0.0, 0.0);
        assert_eq!(spring.damping_ratio(), 0.0);
        assert_eq!(spring.response(), MIN_RESPONSE);
        assert_eq!(spring.settle_threshold(), MIN_SETTLE_THRESHOLD);
    }

    #[test]
    fn test_non_finite_parameters() {
        let spring = SpringModel::new(f64::NAN, f64::INFINITY, f64::NAN);
        assert_eq!(spring, SpringModel::smooth());
        assert!(SpringModel::try_new(1.0, f64::NAN, 0.01).is_err());
        assert!(SpringModel::try_new(1.0, 0.3, 0.01).is_ok());
    }

    #[test]
    fn test_every_constructor_returns() {
        let smooth = SpringModel::smooth();
        assert_eq!(smooth.damping_ratio(), 1.0);
        assert_eq!(smooth.response(), 0.5);
        assert_eq!(SpringModel::default(), smooth);
        assert_eq!(SpringModel::new(1.0, 0.5, DEFAULT_SETTLE_THRESHOLD), smooth);
        assert_eq!(SpringModel::new(f64::NAN, 0.5, f64::NAN), smooth);
        for name in ["smooth", "snappy", "bouncy", "gentle", "wobbly", "stiff", "molasses"] {
            let spring = SpringModel::preset(name).unwrap();
            assert!(spring.omega().is_finite() && spring.omega() > 0.0, "{name}");
        }
    }

    #[test]
    fn test_spring_presets() {
        assert!(SpringModel::wobbly().is_underdamped());
        assert!(SpringModel::gentle().is_underdamped());
        assert!(SpringModel::stiff().is_underdamped());
        assert!(SpringModel::molasses().is_critically_damped());
        assert!(SpringModel::smooth().is_critically_damped());
        assert!(SpringModel::with_response(1.5, 0.3).is_overdamped());
        assert_eq!(SpringModel::preset("bouncy"), Some(SpringModel::bouncy()));
        assert_eq!(SpringModel::preset("nope"), None);
    }

    #[test]
    fn test_from_physical() {
        // k = 400, c = 30, m = 1  =>  ω = 20, ζ = 0.75
        let spring = SpringModel::stiff();
        assert!((spring.omega() - 20.0).abs() < 1e-9);
        assert!((spring.damping_ratio() - 0.75).abs() < 1e-9);
        assert!((spring.damping() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_settling_duration() {
        assert_eq!(
            SpringModel::with_response(0.0, 0.5).settling_duration(),
            f64::INFINITY
        );
        let fast = SpringModel::with_response(1.0, 0.2).settling_duration();
        let slow = SpringModel::with_response(1.0, 0.8).settling_duration();
        assert!(fast < slow);
    }

    #[test]
    fn test_serde_round_trip_applies_defaults() {
        let spring: SpringModel =
            toml::from_str("damping_ratio = 0.8\nresponse = 0.4\n").unwrap();
        assert_eq!(spring, SpringModel::with_response(0.8, 0.4));

        let bad = toml::from_str::<SpringModel>("damping_ratio = nan\nresponse = 0.4\n");
        assert!(bad.is_err());
    }
}
