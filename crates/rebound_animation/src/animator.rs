//! Typed spring animator
//!
//! `SpringAnimator<V>` is the owner-facing handle of one integrator living in
//! an [`AnimationScheduler`]. It converts between `V` and component lists at
//! the edges; the integrator itself stays value-type agnostic. Dropping the
//! handle deregisters the integrator.
//!
//! # Example
//!
//! ```rust
//! use rebound_animation::{AnimationScheduler, MotionState, SpringAnimator, SpringModel};
//!
//! let scheduler = AnimationScheduler::new();
//! let offset = SpringAnimator::in_scheduler(&scheduler, 0.0_f64, SpringModel::snappy());
//!
//! offset.animate_to(240.0, None);
//! while scheduler.tick(1.0 / 120.0) {}
//!
//! assert_eq!(offset.state(), MotionState::Idle);
//! assert_eq!(offset.value(), 240.0);
//! ```

use crate::boundary::Boundary;
use crate::events::{AnimationOutcome, Completion, MotionState, MotionUpdate};
use crate::integrator::SpringIntegrator;
use crate::scheduler::{AnimationScheduler, AnimatorId, ListenerId};
use crate::spring::SpringModel;
use rebound_core::{Animatable, Components, Result};
use std::marker::PhantomData;

pub struct SpringAnimator<V: Animatable> {
    scheduler: AnimationScheduler,
    id: AnimatorId,
    _value: PhantomData<fn() -> V>,
}

impl<V: Animatable> SpringAnimator<V> {
    /// Create an idle animator on the shared scheduler
    pub fn new(initial: V, spring: SpringModel) -> Self {
        Self::in_scheduler(&AnimationScheduler::shared(), initial, spring)
    }

    /// Create an idle animator on a specific scheduler
    pub fn in_scheduler(scheduler: &AnimationScheduler, initial: V, spring: SpringModel) -> Self {
        let id = scheduler.insert(SpringIntegrator::new(initial.components(), spring));
        Self {
            scheduler: scheduler.clone(),
            id,
            _value: PhantomData,
        }
    }

    /// Attach a boundary at construction time
    pub fn with_boundary(self, boundary: impl Into<Boundary>) -> Result<Self> {
        self.set_boundary(boundary)?;
        Ok(self)
    }

    /// Registration token inside the scheduler
    pub fn id(&self) -> AnimatorId {
        self.id
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    fn read<R: Default>(&self, f: impl FnOnce(&SpringIntegrator) -> R) -> R {
        self.scheduler.read(self.id, f).unwrap_or_default()
    }

    fn read_value(&self, f: impl FnOnce(&SpringIntegrator) -> Components) -> V {
        self.scheduler
            .read(self.id, |i| V::from_components(&f(i)))
            .unwrap_or_else(V::zero)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Begin animating from the current value toward the target
    pub fn start(&self) {
        self.scheduler.commit(self.id, SpringIntegrator::start);
    }

    /// Cancel any running animation
    pub fn stop(&self) {
        self.scheduler.commit(self.id, SpringIntegrator::stop);
    }

    /// Retarget (through the boundary) and start; `velocity` overrides the
    /// current velocity
    pub fn animate_to(&self, target: V, velocity: Option<V>) {
        let target = target.components();
        let velocity = velocity.map(|v| v.components());
        self.scheduler.commit(self.id, |integrator| {
            integrator.animate_to(&target, velocity.as_deref())
        });
    }

    /// Drive the value directly, discarding any animation
    pub fn set_value(&self, value: V, velocity: Option<V>) {
        let value = value.components();
        let velocity = velocity.map(|v| v.components());
        self.scheduler.commit(self.id, |integrator| {
            integrator.set_value(&value, velocity.as_deref())
        });
    }

    /// Move the target without starting; a running animation follows it
    pub fn set_target(&self, target: V) {
        let target = target.components();
        self.scheduler
            .configure(self.id, |integrator| integrator.set_target(&target));
    }

    /// Replace the spring constants without resetting motion
    pub fn update_spring(&self, spring: SpringModel) {
        self.scheduler
            .configure(self.id, |integrator| integrator.update_spring(spring));
    }

    /// Replace the boundary
    ///
    /// Fails if the boundary needs more axes than `V` has.
    pub fn set_boundary(&self, boundary: impl Into<Boundary>) -> Result<()> {
        let boundary = boundary.into();
        boundary.check_arity(V::arity())?;
        self.scheduler
            .configure(self.id, |integrator| integrator.set_boundary(boundary));
        Ok(())
    }

    /// Future resolving when the current session ends
    pub fn completion(&self) -> Completion {
        self.scheduler
            .configure(self.id, SpringIntegrator::completion)
            .unwrap_or_else(|| Completion::ready(AnimationOutcome::Cancelled))
    }

    /// Animate to `target` and wait for the session to end
    pub async fn animate_to_and_wait(&self, target: V, velocity: Option<V>) -> AnimationOutcome {
        self.animate_to(target, velocity);
        self.completion().await
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn value(&self) -> V {
        self.read_value(|i| i.value().clone())
    }

    /// Value as displayed, after rubber-band resistance
    pub fn presented_value(&self) -> V {
        self.read_value(SpringIntegrator::presented_value)
    }

    pub fn target(&self) -> V {
        self.read_value(|i| i.target().clone())
    }

    pub fn velocity(&self) -> V {
        self.read_value(|i| i.velocity().clone())
    }

    pub fn state(&self) -> MotionState {
        self.read(SpringIntegrator::state)
    }

    pub fn is_animating(&self) -> bool {
        self.state().is_animating()
    }

    pub fn spring(&self) -> SpringModel {
        self.read(SpringIntegrator::spring)
    }

    pub fn boundary(&self) -> Boundary {
        self.read(|i| i.boundary().clone())
    }

    pub fn elapsed(&self) -> f64 {
        self.read(SpringIntegrator::elapsed)
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Receive an update on every committed state change
    pub fn subscribe(
        &self,
        mut listener: impl FnMut(&MotionUpdate<V>) + Send + 'static,
    ) -> Option<ListenerId> {
        self.scheduler.add_listener(
            self.id,
            Box::new(move |update: &MotionUpdate<Components>| listener(&update.typed())),
        )
    }

    pub fn unsubscribe(&self, listener: ListenerId) -> bool {
        self.scheduler.remove_listener(self.id, listener)
    }
}

impl<V: Animatable + std::fmt::Debug> std::fmt::Debug for SpringAnimator<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpringAnimator")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("value", &self.value())
            .field("target", &self.target())
            .finish()
    }
}

impl<V: Animatable> Drop for SpringAnimator<V> {
    fn drop(&mut self) {
        self.scheduler.remove(self.id);
    }
}
