//! Lifecycle states, update events and completion signalling

use crate::spring::SpringModel;
use rebound_core::{Animatable, Components};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Lifecycle state of an animator
///
/// `Completed` and `Cancelled` are transient: they are reported in one
/// update and the animator is back to `Idle` by the time the call returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MotionState {
    #[default]
    Idle,
    Animating,
    Completed,
    Cancelled,
}

impl MotionState {
    pub fn is_animating(self) -> bool {
        self == MotionState::Animating
    }
}

/// Snapshot delivered to listeners on every committed state change
#[derive(Clone, Debug, PartialEq)]
pub struct MotionUpdate<V> {
    pub state: MotionState,
    pub value: V,
    pub target: V,
    pub velocity: V,
    pub spring: SpringModel,
    /// Seconds since the current animation session started
    pub elapsed: f64,
}

/// Update carrying raw component lists
pub type RawUpdate = MotionUpdate<Components>;

impl RawUpdate {
    /// Rebuild the typed values
    pub fn typed<V: Animatable>(&self) -> MotionUpdate<V> {
        MotionUpdate {
            state: self.state,
            value: V::from_components(&self.value),
            target: V::from_components(&self.target),
            velocity: V::from_components(&self.velocity),
            spring: self.spring,
            elapsed: self.elapsed,
        }
    }
}

/// How an animation session ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationOutcome {
    Completed,
    Cancelled,
}

/// Future resolving when the current animation session ends
///
/// Resolves exactly once. If the animator is dropped before the session
/// ends the outcome is `Cancelled`.
#[derive(Debug)]
pub struct Completion {
    inner: CompletionInner,
}

#[derive(Debug)]
enum CompletionInner {
    Ready(Option<AnimationOutcome>),
    Waiting(oneshot::Receiver<AnimationOutcome>),
}

impl Completion {
    pub(crate) fn ready(outcome: AnimationOutcome) -> Self {
        Self {
            inner: CompletionInner::Ready(Some(outcome)),
        }
    }

    pub(crate) fn waiting(receiver: oneshot::Receiver<AnimationOutcome>) -> Self {
        Self {
            inner: CompletionInner::Waiting(receiver),
        }
    }
}

impl Future for Completion {
    type Output = AnimationOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.inner {
            CompletionInner::Ready(outcome) => {
                Poll::Ready(outcome.take().unwrap_or(AnimationOutcome::Cancelled))
            }
            CompletionInner::Waiting(receiver) => Pin::new(receiver)
                .poll(cx)
                .map(|result| result.unwrap_or(AnimationOutcome::Cancelled)),
        }
    }
}

/// Pending completion senders of one session
#[derive(Debug, Default)]
pub(crate) struct Waiters {
    senders: Vec<oneshot::Sender<AnimationOutcome>>,
}

impl Waiters {
    pub(crate) fn install(&mut self) -> Completion {
        let (sender, receiver) = oneshot::channel();
        self.senders.push(sender);
        Completion::waiting(receiver)
    }

    pub(crate) fn resolve(&mut self, outcome: AnimationOutcome) {
        for sender in self.senders.drain(..) {
            // Receiver may already be gone
            let _ = sender.send(outcome);
        }
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
