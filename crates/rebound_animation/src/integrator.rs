//! Spring integrator
//!
//! Owns one simulation: position, velocity and target as component lists,
//! the spring constants, the attached boundary and the lifecycle state.
//! Integration is semi-implicit Euler (velocity first, then position), which
//! stays stable at UI frame rates and is deterministic for a given sequence
//! of time deltas.
//!
//! Every mutating operation returns the updates it committed; the scheduler
//! hands them to listeners once its lock is released.

use crate::boundary::Boundary;
use crate::events::{AnimationOutcome, Completion, MotionState, RawUpdate, Waiters};
use crate::spring::SpringModel;
use rebound_core::values::{max_abs, sub, sum_squares, zeros};
use rebound_core::Components;
use smallvec::SmallVec;

/// Consecutive settled ticks needed before an animation completes
pub const DEFAULT_SETTLE_FRAMES: u32 = 3;

/// Updates committed by a single operation
pub type Updates = SmallVec<[RawUpdate; 2]>;

#[derive(Debug)]
pub struct SpringIntegrator {
    spring: SpringModel,
    boundary: Boundary,
    current: Components,
    target: Components,
    velocity: Components,
    state: MotionState,
    elapsed: f64,
    settled_frames: u32,
    settle_frames_needed: u32,
    waiters: Waiters,
}

impl SpringIntegrator {
    pub fn new(initial: Components, spring: SpringModel) -> Self {
        let len = initial.len();
        Self {
            spring,
            boundary: Boundary::None,
            target: initial.clone(),
            current: initial,
            velocity: zeros(len),
            state: MotionState::Idle,
            elapsed: 0.0,
            settled_frames: 0,
            settle_frames_needed: DEFAULT_SETTLE_FRAMES,
            waiters: Waiters::default(),
        }
    }

    pub fn with_settle_frames(mut self, frames: u32) -> Self {
        self.settle_frames_needed = frames.max(1);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn is_animating(&self) -> bool {
        self.state.is_animating()
    }

    pub fn value(&self) -> &Components {
        &self.current
    }

    /// Current value mapped through the boundary for display
    pub fn presented_value(&self) -> Components {
        self.boundary.present(&self.current)
    }

    pub fn target(&self) -> &Components {
        &self.target
    }

    pub fn velocity(&self) -> &Components {
        &self.velocity
    }

    pub fn spring(&self) -> SpringModel {
        self.spring
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn settled_frames(&self) -> u32 {
        self.settled_frames
    }

    fn snapshot(&self) -> RawUpdate {
        RawUpdate {
            state: self.state,
            value: self.current.clone(),
            target: self.target.clone(),
            velocity: self.velocity.clone(),
            spring: self.spring,
            elapsed: self.elapsed,
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Replace the spring constants in place
    pub fn update_spring(&mut self, spring: SpringModel) {
        self.spring = spring;
    }

    /// Swap the boundary and re-apply its target adjustment
    pub fn set_boundary(&mut self, boundary: Boundary) {
        self.boundary = boundary;
        self.target = self.boundary.adjust_target(&self.target);
    }

    /// Retarget without starting; a running animation picks it up next tick
    pub fn set_target(&mut self, target: &[f64]) {
        self.target = self.boundary.adjust_target(target);
    }

    /// Wait for the current session to end
    pub fn completion(&mut self) -> Completion {
        if self.is_animating() {
            self.waiters.install()
        } else {
            Completion::ready(AnimationOutcome::Completed)
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Begin animating toward the target
    ///
    /// No-op while animating. Already within tolerance: reports a single
    /// `Completed` update and stays idle.
    pub fn start(&mut self) -> Updates {
        let mut updates = Updates::new();
        if self.is_animating() {
            return updates;
        }

        // Nothing from a previous session may linger into this one
        self.waiters.resolve(AnimationOutcome::Cancelled);
        self.elapsed = 0.0;
        self.settled_frames = 0;

        if self.is_settled() {
            self.snap_to_target();
            self.state = MotionState::Completed;
            updates.push(self.snapshot());
            self.state = MotionState::Idle;
            tracing::debug!("spring start: already settled");
            return updates;
        }

        self.state = MotionState::Animating;
        updates.push(self.snapshot());
        tracing::debug!(
            response = self.spring.response(),
            damping_ratio = self.spring.damping_ratio(),
            "spring start"
        );
        updates
    }

    /// Cancel the running animation; idempotent
    pub fn stop(&mut self) -> Updates {
        let mut updates = Updates::new();
        if self.state == MotionState::Idle {
            return updates;
        }

        self.state = MotionState::Cancelled;
        self.velocity = zeros(self.current.len());
        self.settled_frames = 0;
        updates.push(self.snapshot());
        self.waiters.resolve(AnimationOutcome::Cancelled);
        self.state = MotionState::Idle;
        tracing::debug!(elapsed = self.elapsed, "spring cancelled");
        updates
    }

    /// Set a new target (and optionally velocity), then start
    pub fn animate_to(&mut self, target: &[f64], velocity: Option<&[f64]>) -> Updates {
        self.set_target(target);
        if let Some(velocity) = velocity {
            self.velocity = velocity.iter().copied().collect();
        }
        self.start()
    }

    /// Hard-set the value, discarding any in-flight animation
    ///
    /// The velocity, if given, seeds the next animation session.
    pub fn set_value(&mut self, value: &[f64], velocity: Option<&[f64]>) -> Updates {
        if self.is_animating() {
            self.waiters.resolve(AnimationOutcome::Cancelled);
        }

        self.current = value.iter().copied().collect();
        self.velocity = match velocity {
            Some(velocity) => velocity.iter().copied().collect(),
            None => zeros(self.current.len()),
        };
        self.state = MotionState::Idle;
        self.elapsed = 0.0;
        self.settled_frames = 0;
        tracing::trace!("spring hard-set");

        let mut updates = Updates::new();
        updates.push(self.snapshot());
        updates
    }

    /// Tear down: any waiter sees `Cancelled`
    pub(crate) fn dispose(&mut self) {
        self.waiters.resolve(AnimationOutcome::Cancelled);
        self.state = MotionState::Idle;
    }

    // ========================================================================
    // Integration
    // ========================================================================

    /// Advance by `dt` seconds
    ///
    /// Returns the tick update, followed by a `Completed` update when this
    /// tick finished the animation.
    pub fn advance(&mut self, dt: f64) -> Updates {
        let mut updates = Updates::new();
        if !self.is_animating() || !(dt > 0.0) || !dt.is_finite() {
            return updates;
        }

        let omega = self.spring.omega();
        let zeta = self.spring.damping_ratio();
        let len = self.current.len().max(self.target.len());
        let displacement = sub(&self.current, &self.target);

        let mut position = Components::with_capacity(len);
        let mut velocity = Components::with_capacity(len);
        for i in 0..len {
            let x = displacement[i];
            let v = self.velocity.get(i).copied().unwrap_or(0.0);
            let spring_accel = -omega * omega * x;
            let damping_accel = -2.0 * zeta * omega * v;
            let v = v + (spring_accel + damping_accel) * dt;
            velocity.push(v);
            position.push(self.current.get(i).copied().unwrap_or(0.0) + v * dt);
        }

        self.boundary.resolve(&mut position, &mut velocity);

        self.current = position;
        self.velocity = velocity;
        self.elapsed += dt;
        updates.push(self.snapshot());

        if self.is_settled() {
            self.settled_frames += 1;
        } else {
            self.settled_frames = 0;
        }

        if self.settled_frames >= self.settle_frames_needed {
            self.snap_to_target();
            self.state = MotionState::Completed;
            updates.push(self.snapshot());
            self.waiters.resolve(AnimationOutcome::Completed);
            self.state = MotionState::Idle;
            self.settled_frames = 0;
            tracing::debug!(elapsed = self.elapsed, "spring completed");
        }

        updates
    }

    fn snap_to_target(&mut self) {
        self.current = self.target.clone();
        self.velocity = zeros(self.current.len());
    }

    /// Whether the current state counts as settled for one tick
    ///
    /// Either every axis is within the threshold in both displacement and
    /// velocity, or the combined spring and kinetic energy has fallen below
    /// `0.5·threshold²`.
    pub fn is_settled(&self) -> bool {
        let threshold = self.spring.settle_threshold();
        let displacement = sub(&self.current, &self.target);

        if max_abs(&displacement) < threshold && max_abs(&self.velocity) < threshold {
            return true;
        }

        let omega = self.spring.omega();
        let energy =
            0.5 * omega * omega * sum_squares(&displacement) + 0.5 * sum_squares(&self.velocity);
        energy < 0.5 * threshold * threshold
    }
}
