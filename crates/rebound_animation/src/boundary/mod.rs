//! Boundary resolvers
//!
//! - **Rubber band**: continuous resistance used for presentation and for
//!   rewriting release targets
//! - **Bounce**: collision response applied on every integration tick

pub mod bounce;
pub mod rubber_band;

pub use bounce::{AxisRange, Bounce};
pub use rubber_band::{ResistanceCurve, RubberBand, RubberBandAxis, RubberBandMode};

use rebound_core::{Components, MotionError, Result};
use serde::{Deserialize, Serialize};

/// Boundary attached to an animator
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Boundary {
    #[default]
    None,
    RubberBand(RubberBand),
    Bounce(Bounce),
}

impl Boundary {
    /// Check that a value type has the axes this boundary manipulates
    pub fn check_arity(&self, arity: usize) -> Result<()> {
        match self {
            Boundary::Bounce(_) if arity < 2 => Err(MotionError::ArityMismatch {
                needed: 2,
                found: arity,
            }),
            _ => Ok(()),
        }
    }

    /// Per-tick correction of a proposed position and velocity
    ///
    /// Only bounce acts here; a rubber band never alters the stored value.
    pub fn resolve(&self, position: &mut Components, velocity: &mut Components) {
        if let Boundary::Bounce(bounce) = self {
            bounce.resolve(position, velocity);
        }
    }

    /// Rewrite an animation target so the animation can come to rest
    pub fn adjust_target(&self, target: &[f64]) -> Components {
        match self {
            Boundary::None => target.iter().copied().collect(),
            Boundary::RubberBand(band) => band.release_target(target),
            Boundary::Bounce(bounce) => {
                let mut adjusted: Components = target.iter().copied().collect();
                bounce.adjust_target(&mut adjusted);
                adjusted
            }
        }
    }

    /// Value as it should be displayed
    pub fn present(&self, value: &[f64]) -> Components {
        match self {
            Boundary::RubberBand(band) => band.map(value),
            _ => value.iter().copied().collect(),
        }
    }
}

impl From<RubberBand> for Boundary {
    fn from(band: RubberBand) -> Self {
        Boundary::RubberBand(band)
    }
}

impl From<Bounce> for Boundary {
    fn from(bounce: Bounce) -> Self {
        Boundary::Bounce(bounce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounce_requires_two_axes() {
        let boundary = Boundary::from(Bounce::new(0.0..=1.0, 0.0..=1.0));
        assert_eq!(
            boundary.check_arity(1),
            Err(MotionError::ArityMismatch {
                needed: 2,
                found: 1
            })
        );
        assert!(boundary.check_arity(2).is_ok());
        assert!(Boundary::None.check_arity(1).is_ok());
    }

    #[test]
    fn test_rubber_band_never_touches_stored_value() {
        let boundary = Boundary::from(RubberBand::single(RubberBandAxis::outside(0.0, 10.0)));
        let mut position: Components = smallvec::smallvec![25.0];
        let mut velocity: Components = smallvec::smallvec![100.0];
        boundary.resolve(&mut position, &mut velocity);
        assert_eq!(position[0], 25.0);
        assert_eq!(velocity[0], 100.0);

        assert!(boundary.present(&position)[0] < 25.0);
        assert_eq!(boundary.adjust_target(&position)[0], 10.0);
    }

    #[test]
    fn test_boundary_from_toml() {
        let boundary: Boundary = toml::from_str(
            r#"
            kind = "bounce"
            restitution = 0.5
            x = { min = 0.0, max = 320.0 }
            y = { min = 0.0, max = 480.0 }
            "#,
        )
        .unwrap();
        match boundary {
            Boundary::Bounce(bounce) => {
                assert_eq!(bounce.restitution(), 0.5);
                assert_eq!(bounce.friction(), 0.0);
                assert_eq!(bounce.y.max, 480.0);
            }
            other => panic!("unexpected boundary {other:?}"),
        }
    }
}
