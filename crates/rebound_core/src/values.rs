//! Animatable vector values
//!
//! Every animatable quantity is decomposed into an ordered list of `f64`
//! components so scalars, points, sizes and rectangles share one math path.
//! Arithmetic between component lists of different length pads the shorter
//! one with zeros.

use smallvec::SmallVec;

/// Component list of an animatable value (inline up to rectangle arity)
pub type Components = SmallVec<[f64; 4]>;

/// A value that can be driven by a spring
///
/// Implementations must report a stable arity and must tolerate
/// `from_components` being handed fewer components than that arity
/// (missing components read as zero).
pub trait Animatable: Clone + Send + 'static {
    /// Number of scalar components of this type
    fn arity() -> usize;

    /// Decompose into components
    fn components(&self) -> Components;

    /// Rebuild from components
    fn from_components(components: &[f64]) -> Self;

    /// The all-zero value
    fn zero() -> Self {
        Self::from_components(&[])
    }
}

#[inline]
fn component(components: &[f64], index: usize) -> f64 {
    components.get(index).copied().unwrap_or(0.0)
}

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle (origin + size)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }
}

impl Animatable for f64 {
    fn arity() -> usize {
        1
    }

    fn components(&self) -> Components {
        smallvec::smallvec![*self]
    }

    fn from_components(components: &[f64]) -> Self {
        component(components, 0)
    }
}

impl Animatable for f32 {
    fn arity() -> usize {
        1
    }

    fn components(&self) -> Components {
        smallvec::smallvec![*self as f64]
    }

    fn from_components(components: &[f64]) -> Self {
        component(components, 0) as f32
    }
}

impl<const N: usize> Animatable for [f64; N] {
    fn arity() -> usize {
        N
    }

    fn components(&self) -> Components {
        self.iter().copied().collect()
    }

    fn from_components(components: &[f64]) -> Self {
        std::array::from_fn(|i| component(components, i))
    }
}

impl Animatable for (f64, f64) {
    fn arity() -> usize {
        2
    }

    fn components(&self) -> Components {
        smallvec::smallvec![self.0, self.1]
    }

    fn from_components(components: &[f64]) -> Self {
        (component(components, 0), component(components, 1))
    }
}

impl Animatable for Point {
    fn arity() -> usize {
        2
    }

    fn components(&self) -> Components {
        smallvec::smallvec![self.x, self.y]
    }

    fn from_components(components: &[f64]) -> Self {
        Point::new(component(components, 0), component(components, 1))
    }
}

impl Animatable for Size {
    fn arity() -> usize {
        2
    }

    fn components(&self) -> Components {
        smallvec::smallvec![self.width, self.height]
    }

    fn from_components(components: &[f64]) -> Self {
        Size::new(component(components, 0), component(components, 1))
    }
}

impl Animatable for Rect {
    fn arity() -> usize {
        4
    }

    fn components(&self) -> Components {
        smallvec::smallvec![self.origin.x, self.origin.y, self.size.width, self.size.height]
    }

    fn from_components(components: &[f64]) -> Self {
        Rect::new(
            component(components, 0),
            component(components, 1),
            component(components, 2),
            component(components, 3),
        )
    }
}

// ============================================================================
// Component arithmetic
// ============================================================================

/// Apply `op` pairwise, padding the shorter side with zeros
pub fn zip_with(a: &[f64], b: &[f64], op: impl Fn(f64, f64) -> f64) -> Components {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| op(component(a, i), component(b, i)))
        .collect()
}

/// `a + b`
pub fn add(a: &[f64], b: &[f64]) -> Components {
    zip_with(a, b, |x, y| x + y)
}

/// `a - b`
pub fn sub(a: &[f64], b: &[f64]) -> Components {
    zip_with(a, b, |x, y| x - y)
}

/// `a * factor`
pub fn scale(a: &[f64], factor: f64) -> Components {
    a.iter().map(|x| x * factor).collect()
}

/// Largest absolute component (0 for an empty list)
pub fn max_abs(a: &[f64]) -> f64 {
    a.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

/// Sum of squared components
pub fn sum_squares(a: &[f64]) -> f64 {
    a.iter().map(|x| x * x).sum()
}

/// Zero list with the given length
pub fn zeros(len: usize) -> Components {
    smallvec::smallvec![0.0; len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_is_stable() {
        assert_eq!(f64::arity(), 1);
        assert_eq!(Point::arity(), 2);
        assert_eq!(Size::arity(), 2);
        assert_eq!(Rect::arity(), 4);
        assert_eq!(<[f64; 3]>::arity(), 3);
        assert_eq!(Rect::new(1.0, 2.0, 3.0, 4.0).components().len(), 4);
    }

    #[test]
    fn test_missing_components_read_as_zero() {
        let rect = Rect::from_components(&[5.0, 6.0]);
        assert_eq!(rect, Rect::new(5.0, 6.0, 0.0, 0.0));
        assert_eq!(Point::zero(), Point::ZERO);
        assert_eq!(f64::from_components(&[]), 0.0);
    }

    #[test]
    fn test_arithmetic_pads_shorter_operand() {
        let sum = add(&[1.0, 2.0], &[10.0, 20.0, 30.0, 40.0]);
        assert_eq!(sum.as_slice(), &[11.0, 22.0, 30.0, 40.0]);

        let diff = sub(&[1.0, 2.0, 3.0], &[1.0]);
        assert_eq!(diff.as_slice(), &[0.0, 2.0, 3.0]);
    }

    #[test]
    fn test_norm_helpers() {
        assert_eq!(max_abs(&[1.0, -4.0, 3.0]), 4.0);
        assert_eq!(max_abs(&[]), 0.0);
        assert_eq!(sum_squares(&[3.0, 4.0]), 25.0);
        assert_eq!(scale(&[1.0, -2.0], 0.5).as_slice(), &[0.5, -1.0]);
    }

    #[test]
    fn test_f32_round_trips_through_f64() {
        let v = 0.25f32;
        assert_eq!(f32::from_components(&v.components()), 0.25);
    }
}
