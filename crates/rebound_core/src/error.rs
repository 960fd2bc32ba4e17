//! Error types shared by the rebound crates

use thiserror::Error;

/// Errors raised while configuring motion
///
/// The simulation loop itself never fails; these only surface from
/// fallible constructors and configuration loading.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// A numeric parameter was NaN or infinite
    #[error("Invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// A resolver needs more components than the value type provides
    #[error("Value has {found} components, resolver needs at least {needed}")]
    ArityMismatch { needed: usize, found: usize },

    /// Malformed configuration document
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MotionError {
    /// Reject NaN and infinities, passing finite values through
    pub fn check_finite(name: &'static str, value: f64) -> Result<f64> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(MotionError::InvalidParameter { name, value })
        }
    }
}

/// Result type for motion configuration
pub type Result<T> = std::result::Result<T, MotionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_finite() {
        assert_eq!(MotionError::check_finite("response", 0.3), Ok(0.3));
        assert!(matches!(
            MotionError::check_finite("response", f64::NAN),
            Err(MotionError::InvalidParameter { name: "response", .. })
        ));
        assert!(MotionError::check_finite("x", f64::INFINITY).is_err());
    }

    #[test]
    fn test_display() {
        let err = MotionError::ArityMismatch {
            needed: 2,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "Value has 1 components, resolver needs at least 2"
        );
    }
}
