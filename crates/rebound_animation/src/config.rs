//! Motion configuration (rebound.toml)
//!
//! ```toml
//! [scheduler]
//! target_fps = 120
//! max_frame_delta = 0.033
//!
//! [springs.card]
//! damping_ratio = 0.8
//! response = 0.35
//! ```

use crate::integrator::DEFAULT_SETTLE_FRAMES;
use crate::spring::SpringModel;
use indexmap::IndexMap;
use rebound_core::{MotionError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Frame scheduler settings
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Preferred frame rate of the self-driven frame loop
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    /// Largest delta handed to integrators, in seconds
    #[serde(default = "default_max_frame_delta")]
    pub max_frame_delta: f64,
    /// Consecutive settled ticks before an animation completes
    #[serde(default = "default_settle_frames")]
    pub settle_frames: u32,
}

fn default_target_fps() -> u32 {
    120
}

fn default_max_frame_delta() -> f64 {
    1.0 / 30.0
}

fn default_settle_frames() -> u32 {
    DEFAULT_SETTLE_FRAMES
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            max_frame_delta: default_max_frame_delta(),
            settle_frames: default_settle_frames(),
        }
    }
}

impl SchedulerConfig {
    /// Nominal duration of one frame
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps.max(1) as f64)
    }

    /// Frame delta clamp, never below one nominal frame
    pub fn max_delta(&self) -> f64 {
        let period = self.frame_period().as_secs_f64();
        if self.max_frame_delta.is_finite() {
            self.max_frame_delta.max(period)
        } else {
            period
        }
    }
}

/// Top-level motion configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct MotionConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Named springs, in declaration order
    #[serde(default)]
    pub springs: IndexMap<String, SpringModel>,
}

impl MotionConfig {
    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: MotionConfig =
            toml::from_str(source).map_err(|e| MotionError::Config(e.to_string()))?;
        MotionError::check_finite("scheduler.max_frame_delta", config.scheduler.max_frame_delta)?;
        Ok(config)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| MotionError::Config(e.to_string()))
    }

    /// Named spring, falling back to the preset of the same name
    pub fn spring(&self, name: &str) -> Option<SpringModel> {
        self.springs
            .get(name)
            .copied()
            .or_else(|| SpringModel::preset(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MotionConfig::from_toml_str("").unwrap();
        assert_eq!(config.scheduler, SchedulerConfig::default());
        assert_eq!(config.scheduler.target_fps, 120);
        assert!((config.scheduler.max_delta() - 1.0 / 30.0).abs() < 1e-12);
        assert!(config.springs.is_empty());
    }

    #[test]
    fn test_named_springs() {
        let config = MotionConfig::from_toml_str(
            r#"
            [scheduler]
            target_fps = 60

            [springs.card]
            damping_ratio = 0.8
            response = 0.35

            [springs.sheet]
            damping_ratio = 1.0
            response = 0.5
            settle_threshold = 0.01
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduler.target_fps, 60);
        assert_eq!(config.scheduler.settle_frames, 3);
        assert_eq!(
            config.springs.keys().collect::<Vec<_>>(),
            vec!["card", "sheet"]
        );
        assert_eq!(config.spring("card"), Some(SpringModel::with_response(0.8, 0.35)));
        assert_eq!(config.spring("sheet").unwrap().settle_threshold(), 0.01);
        assert_eq!(config.spring("wobbly"), Some(SpringModel::wobbly()));
        assert_eq!(config.spring("missing"), None);
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            MotionConfig::from_toml_str("[scheduler]\ntarget_fps = \"fast\""),
            Err(MotionError::Config(_))
        ));
        assert!(matches!(
            MotionConfig::from_toml_str("[springs.a]\ndamping_ratio = 1.0\nresponse = inf"),
            Err(MotionError::Config(_))
        ));
        assert!(matches!(
            MotionConfig::from_toml_str("[scheduler]\nmax_frame_delta = nan"),
            Err(MotionError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_round_trip() {
        let mut config = MotionConfig::default();
        config
            .springs
            .insert("button".to_string(), SpringModel::snappy());
        let text = config.to_toml_string().unwrap();
        let parsed = MotionConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.scheduler, config.scheduler);
        let button = parsed.spring("button").unwrap();
        assert!((button.response() - SpringModel::snappy().response()).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_scheduler_values() {
        let config = SchedulerConfig {
            target_fps: 0,
            max_frame_delta: 0.0,
            settle_frames: 3,
        };
        assert_eq!(config.frame_period(), Duration::from_secs(1));
        assert_eq!(config.max_delta(), 1.0);
    }
}
