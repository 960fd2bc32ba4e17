//! Rebound Core
//!
//! Foundational types for the rebound motion engine:
//!
//! - **Animatable values**: scalars, points, sizes and rectangles exposed as
//!   component lists so one spring integrator drives all of them
//! - **Errors**: the shared `MotionError` type
//!
//! # Example
//!
//! ```rust
//! use rebound_core::{Animatable, Point};
//!
//! let p = Point::new(3.0, 4.0);
//! assert_eq!(p.components().as_slice(), &[3.0, 4.0]);
//! assert_eq!(Point::from_components(&[3.0]), Point::new(3.0, 0.0));
//! ```

pub mod error;
pub mod values;

pub use error::{MotionError, Result};
pub use values::{Animatable, Components, Point, Rect, Size};
