//! Rubber-band resistance
//!
//! A continuous mapping that compresses motion past a limit. The stored
//! value of an animator is never mapped; only presented values and release
//! targets go through the band.

use rebound_core::Components;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::f64::consts::LN_10;

/// Classic scroll-view resistance constant
pub const DEFAULT_SOFTNESS: f64 = 0.55;

/// Resistance curve family
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResistanceCurve {
    /// `c·x·d / (d + c·x)`, asymptotic to `d`
    #[default]
    Rational,
    /// `(d / ln10) · ln(1 + x·c·ln10 / d)`, with slope `c` at the origin
    NormalizedLog,
}

impl ResistanceCurve {
    /// Resisted distance for an excess `x ≥ 0`
    pub fn apply(self, x: f64, softness: f64, dimension: f64) -> f64 {
        let c = softness;
        let d = dimension;
        match self {
            ResistanceCurve::Rational => c * x * d / (d + c * x),
            ResistanceCurve::NormalizedLog => (d / LN_10) * (1.0 + x * c * LN_10 / d).ln(),
        }
    }
}

/// Where resistance applies on one axis
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubberBandMode {
    /// Free inside `[lower - overshoot, upper + overshoot]`, resisted beyond
    Outside {
        lower: f64,
        upper: f64,
        #[serde(default)]
        free_overshoot: f64,
    },
    /// Resisted within `band_radius` of `anchor`, free beyond it
    Inside {
        anchor: f64,
        band_radius: f64,
        #[serde(default)]
        snap_inside_on_release: bool,
    },
}

/// Rubber-band configuration for a single axis
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RubberBandAxis {
    mode: RubberBandMode,
    #[serde(default = "default_softness")]
    softness: f64,
    #[serde(default = "default_dimension")]
    dimension: f64,
    #[serde(default)]
    curve: ResistanceCurve,
}

fn default_softness() -> f64 {
    DEFAULT_SOFTNESS
}

fn default_dimension() -> f64 {
    1.0
}

impl RubberBandAxis {
    /// Resist outside `lower..=upper`
    pub fn outside(lower: f64, upper: f64) -> Self {
        Self::with_mode(RubberBandMode::Outside {
            lower,
            upper,
            free_overshoot: 0.0,
        })
    }

    /// Resist within `band_radius` of `anchor`
    pub fn inside(anchor: f64, band_radius: f64) -> Self {
        Self::with_mode(RubberBandMode::Inside {
            anchor,
            band_radius,
            snap_inside_on_release: false,
        })
    }

    pub fn with_mode(mode: RubberBandMode) -> Self {
        Self {
            mode,
            softness: DEFAULT_SOFTNESS,
            dimension: default_dimension(),
            curve: ResistanceCurve::default(),
        }
    }

    pub fn with_softness(mut self, softness: f64) -> Self {
        self.softness = softness;
        self
    }

    /// Reference dimension, usually the viewport extent on this axis
    pub fn with_dimension(mut self, dimension: f64) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_curve(mut self, curve: ResistanceCurve) -> Self {
        self.curve = curve;
        self
    }

    /// Distance past the bounds that stays unresisted (outside mode only)
    pub fn with_free_overshoot(mut self, overshoot: f64) -> Self {
        if let RubberBandMode::Outside { free_overshoot, .. } = &mut self.mode {
            *free_overshoot = overshoot;
        }
        self
    }

    /// Snap to the anchor on release while inside the band (inside mode only)
    pub fn with_snap_inside_on_release(mut self, snap: bool) -> Self {
        if let RubberBandMode::Inside {
            snap_inside_on_release,
            ..
        } = &mut self.mode
        {
            *snap_inside_on_release = snap;
        }
        self
    }

    pub fn mode(&self) -> RubberBandMode {
        self.mode
    }

    pub fn curve(&self) -> ResistanceCurve {
        self.curve
    }

    /// Softness constant, always positive
    pub fn softness(&self) -> f64 {
        if self.softness.is_finite() {
            self.softness.max(1e-6)
        } else {
            DEFAULT_SOFTNESS
        }
    }

    /// Reference dimension, at least 1
    pub fn dimension(&self) -> f64 {
        if self.dimension.is_finite() {
            self.dimension.max(1.0)
        } else {
            1.0
        }
    }

    fn resist(&self, x: f64) -> f64 {
        self.curve.apply(x, self.softness(), self.dimension())
    }

    /// Map a raw coordinate through the band
    pub fn map(&self, value: f64) -> f64 {
        match self.mode {
            RubberBandMode::Outside {
                lower,
                upper,
                free_overshoot,
            } => {
                let (lower, upper) = ordered(lower, upper);
                let overshoot = free_overshoot.max(0.0);
                let low_pivot = lower - overshoot;
                let high_pivot = upper + overshoot;
                if value > high_pivot {
                    high_pivot + self.resist(value - high_pivot)
                } else if value < low_pivot {
                    low_pivot - self.resist(low_pivot - value)
                } else {
                    value
                }
            }
            RubberBandMode::Inside {
                anchor,
                band_radius,
                ..
            } => {
                let radius = band_radius.max(0.0);
                let offset = value - anchor;
                let distance = offset.abs();
                let mapped = if distance <= radius {
                    self.resist(distance)
                } else {
                    // Continue freely from the resisted band edge
                    self.resist(radius) + (distance - radius)
                };
                anchor + mapped.copysign(offset)
            }
        }
    }

    /// Where an animation should head once the gesture lets go
    pub fn release_target(&self, value: f64) -> f64 {
        match self.mode {
            RubberBandMode::Outside { lower, upper, .. } => {
                let (lower, upper) = ordered(lower, upper);
                value.max(lower).min(upper)
            }
            RubberBandMode::Inside {
                anchor,
                band_radius,
                snap_inside_on_release,
            } => {
                if snap_inside_on_release && (value - anchor).abs() <= band_radius.max(0.0) {
                    anchor
                } else {
                    value
                }
            }
        }
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Per-axis rubber band; components without an axis pass through
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RubberBand {
    axes: SmallVec<[Option<RubberBandAxis>; 2]>,
}

impl RubberBand {
    /// Band on the first component only
    pub fn single(axis: RubberBandAxis) -> Self {
        Self {
            axes: smallvec::smallvec![Some(axis)],
        }
    }

    /// Bands for x and y; `None` leaves that axis free
    pub fn xy(x: Option<RubberBandAxis>, y: Option<RubberBandAxis>) -> Self {
        Self {
            axes: smallvec::smallvec![x, y],
        }
    }

    /// Bands for an arbitrary number of leading components
    pub fn per_axis(axes: impl IntoIterator<Item = Option<RubberBandAxis>>) -> Self {
        Self {
            axes: axes.into_iter().collect(),
        }
    }

    pub fn axis(&self, index: usize) -> Option<&RubberBandAxis> {
        self.axes.get(index).and_then(Option::as_ref)
    }

    fn apply(&self, value: &[f64], f: impl Fn(&RubberBandAxis, f64) -> f64) -> Components {
        value
            .iter()
            .enumerate()
            .map(|(i, &v)| match self.axis(i) {
                Some(axis) => f(axis, v),
                None => v,
            })
            .collect()
    }

    /// Resistance-map a value for presentation
    pub fn map(&self, value: &[f64]) -> Components {
        self.apply(value, RubberBandAxis::map)
    }

    /// Rewrite a release target into the bounds
    pub fn release_target(&self, value: &[f64]) -> Components {
        self.apply(value, RubberBandAxis::release_target)
    }
}
