//! Rebound Animation System
//!
//! Spring motion engine for interactive UI values.
//!
//! # Features
//!
//! - **Spring Physics**: semi-implicit Euler springs described by damping ratio and response
//! - **Settling**: per-axis and energy tests over several consecutive frames
//! - **Boundaries**: rubber-band resistance and bounce with restitution and friction
//! - **Frame Scheduler**: every active animation advances with the same clamped delta
//! - **Interruptible**: retargeting and gesture hand-off keep the current velocity
//! - **Projection**: gesture velocity tracking and release target projection

pub mod animator;
pub mod boundary;
pub mod config;
pub mod events;
pub mod integrator;
pub mod projection;
pub mod scheduler;
pub mod spring;
pub mod velocity;

pub use animator::SpringAnimator;
pub use boundary::{
    AxisRange, Bounce, Boundary, ResistanceCurve, RubberBand, RubberBandAxis, RubberBandMode,
};
pub use config::{MotionConfig, SchedulerConfig};
pub use events::{AnimationOutcome, Completion, MotionState, MotionUpdate, RawUpdate};
pub use integrator::SpringIntegrator;
pub use projection::{
    decay_distance, project_angle, project_scalar, project_value, project_with_deceleration,
    ProjectionOptions,
};
pub use scheduler::{AnimationScheduler, AnimatorId, ListenerId};
pub use spring::SpringModel;
pub use velocity::VelocityTracker;

pub use rebound_core::{Animatable, MotionError, Point, Rect, Result, Size};
