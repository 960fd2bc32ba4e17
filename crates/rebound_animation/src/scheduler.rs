//! Animation scheduler
//!
//! Owns the arena of spring integrators and advances every animating one by
//! the same clamped delta once per frame. Frames come either from the host
//! (`tick`, `tick_frame`, `tick_at`) or from a self-driven tokio frame loop
//! that is spawned lazily when the first animation starts and exits once
//! nothing is animating.
//!
//! Listeners are invoked after the scheduler lock is released, so they may
//! query and drive animators freely, including their own. Updates committed
//! from inside a listener are queued and delivered once the current
//! listener returns.

use crate::config::SchedulerConfig;
use crate::events::RawUpdate;
use crate::integrator::{SpringIntegrator, Updates};
use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

new_key_type! {
    /// Registration token of an integrator
    pub struct AnimatorId;
    /// Handle of an update listener
    pub struct ListenerId;
}

/// Update listener over raw component lists
pub type Listener = Box<dyn FnMut(&RawUpdate) + Send>;

type SharedListener = Arc<Mutex<Listener>>;

/// Listeners of one animator
pub(crate) type ListenerSet = Arc<Mutex<SlotMap<ListenerId, SharedListener>>>;

struct AnimatorSlot {
    integrator: SpringIntegrator,
    listeners: ListenerSet,
}

struct SchedulerInner {
    animators: SlotMap<AnimatorId, AnimatorSlot>,
    config: SchedulerConfig,
    last_frame: Option<Instant>,
    frame_loop_running: bool,
    frame_loop_generation: u64,
    warned_no_runtime: bool,
}

impl SchedulerInner {
    fn active_count(&self) -> usize {
        self.animators
            .values()
            .filter(|slot| slot.integrator.is_animating())
            .count()
    }
}

/// Pending listener notifications, delivered outside the lock
type Dispatch = Vec<(ListenerSet, Updates)>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

thread_local! {
    /// Deliveries queued on this thread while a listener is running
    static PENDING: RefCell<Option<VecDeque<(ListenerSet, Updates)>>> = const { RefCell::new(None) };
}

/// Ends the delivery pass of this thread, even if a listener panics
struct DeliveryPass;

impl Drop for DeliveryPass {
    fn drop(&mut self) {
        PENDING.with(|pending| pending.borrow_mut().take());
    }
}

fn deliver(dispatch: Dispatch) {
    if dispatch.is_empty() {
        return;
    }
    let nested = PENDING.with(|pending| {
        let mut pending = pending.borrow_mut();
        match pending.as_mut() {
            Some(queue) => {
                queue.extend(dispatch);
                true
            }
            None => {
                *pending = Some(dispatch.into());
                false
            }
        }
    });
    if nested {
        return;
    }

    let _pass = DeliveryPass;
    while let Some((set, updates)) =
        PENDING.with(|pending| pending.borrow_mut().as_mut().and_then(VecDeque::pop_front))
    {
        let listeners: Vec<SharedListener> = lock(&set).values().cloned().collect();
        for update in &updates {
            for listener in &listeners {
                let mut guard = lock(listener);
                let listener: &mut Listener = &mut guard;
                listener(update);
            }
        }
    }
}

/// The animation scheduler that ticks all active animations
///
/// Cloning yields another handle to the same scheduler.
#[derive(Clone)]
pub struct AnimationScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
}

static SHARED_SCHEDULER: OnceLock<AnimationScheduler> = OnceLock::new();

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                animators: SlotMap::with_key(),
                config,
                last_frame: None,
                frame_loop_running: false,
                frame_loop_generation: 0,
                warned_no_runtime: false,
            })),
        }
    }

    /// The process-wide scheduler
    pub fn shared() -> AnimationScheduler {
        SHARED_SCHEDULER.get_or_init(AnimationScheduler::new).clone()
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerInner> {
        lock(&self.inner)
    }

    pub fn config(&self) -> SchedulerConfig {
        self.lock().config
    }

    pub fn set_target_fps(&self, fps: u32) {
        self.lock().config.target_fps = fps.max(1);
    }

    // ========================================================================
    // Registry
    // ========================================================================

    pub(crate) fn insert(&self, integrator: SpringIntegrator) -> AnimatorId {
        let mut inner = self.lock();
        let integrator = integrator.with_settle_frames(inner.config.settle_frames);
        inner.animators.insert(AnimatorSlot {
            integrator,
            listeners: Arc::new(Mutex::new(SlotMap::with_key())),
        })
    }

    /// Deregister and drop an integrator; pending waiters see `Cancelled`
    pub(crate) fn remove(&self, id: AnimatorId) {
        let removed = self.lock().animators.remove(id);
        if let Some(mut slot) = removed {
            slot.integrator.dispose();
        }
    }

    /// Read an integrator
    pub(crate) fn read<R>(&self, id: AnimatorId, f: impl FnOnce(&SpringIntegrator) -> R) -> Option<R> {
        self.lock().animators.get(id).map(|slot| f(&slot.integrator))
    }

    /// Mutate an integrator without notifying listeners
    pub(crate) fn configure<R>(
        &self,
        id: AnimatorId,
        f: impl FnOnce(&mut SpringIntegrator) -> R,
    ) -> Option<R> {
        self.lock()
            .animators
            .get_mut(id)
            .map(|slot| f(&mut slot.integrator))
    }

    /// Run a lifecycle operation and deliver the updates it committed
    pub(crate) fn commit(&self, id: AnimatorId, f: impl FnOnce(&mut SpringIntegrator) -> Updates) {
        let (dispatch, frame_loop) = {
            let mut inner = self.lock();
            let Some(slot) = inner.animators.get_mut(id) else {
                return;
            };
            let updates = f(&mut slot.integrator);
            let listeners = slot.listeners.clone();
            let frame_loop = if slot.integrator.is_animating() {
                self.ensure_frame_loop(&mut inner)
            } else {
                None
            };
            (vec![(listeners, updates)], frame_loop)
        };
        // Spawned unlocked: a closing runtime drops the task, and its guard, on the spot
        if let Some(frame_loop) = frame_loop {
            frame_loop.spawn();
        }
        deliver(dispatch);
    }

    pub(crate) fn add_listener(&self, id: AnimatorId, listener: Listener) -> Option<ListenerId> {
        let listeners = self.lock().animators.get(id)?.listeners.clone();
        let key = lock(&listeners).insert(Arc::new(Mutex::new(listener)));
        Some(key)
    }

    pub(crate) fn remove_listener(&self, id: AnimatorId, listener: ListenerId) -> bool {
        let Some(listeners) = self
            .lock()
            .animators
            .get(id)
            .map(|slot| slot.listeners.clone())
        else {
            return false;
        };
        let removed = lock(&listeners).remove(listener).is_some();
        removed
    }

    // ========================================================================
    // Ticking
    // ========================================================================

    /// Advance every animating integrator by `dt` seconds
    ///
    /// `dt` is clamped to the configured maximum frame delta. Returns whether
    /// any animation is still running once listeners have run.
    pub fn tick(&self, dt: f64) -> bool {
        let dispatch = {
            let mut inner = self.lock();
            let mut dispatch = Dispatch::new();
            let max_delta = inner.config.max_delta();
            if dt > max_delta {
                tracing::debug!(dt, max_delta, "clamping frame delta");
            }
            let dt = dt.min(max_delta);
            if dt > 0.0 && dt.is_finite() {
                for (_, slot) in inner.animators.iter_mut() {
                    if !slot.integrator.is_animating() {
                        continue;
                    }
                    let updates = slot.integrator.advance(dt);
                    if !updates.is_empty() {
                        dispatch.push((slot.listeners.clone(), updates));
                    }
                }
            }
            tracing::trace!(dt, active = inner.active_count(), "animation frame");
            dispatch
        };
        deliver(dispatch);
        self.has_active_animations()
    }

    /// Tick with the wall-clock delta since the previous frame
    pub fn tick_frame(&self) -> bool {
        self.tick_at(Instant::now())
    }

    /// Tick with the delta between `now` and the previous frame
    ///
    /// The first frame of a burst uses one nominal frame period. Like every
    /// tick, the delta is clamped so a suspended host does not make springs
    /// jump.
    pub fn tick_at(&self, now: Instant) -> bool {
        let dt = {
            let mut inner = self.lock();
            let dt = match inner.last_frame {
                Some(last) => now.saturating_duration_since(last).as_secs_f64(),
                None => inner.config.frame_period().as_secs_f64(),
            };
            inner.last_frame = Some(now);
            dt
        };

        let active = self.tick(dt);
        if !active {
            self.lock().last_frame = None;
        }
        active
    }

    /// Claim the frame loop if none is running and a tokio runtime is available
    ///
    /// The returned loop must be spawned after the scheduler lock is released.
    fn ensure_frame_loop(&self, inner: &mut SchedulerInner) -> Option<PendingFrameLoop> {
        if inner.frame_loop_running {
            return None;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                inner.frame_loop_running = true;
                inner.frame_loop_generation += 1;
                inner.last_frame = None;
                Some(PendingFrameLoop {
                    handle,
                    period: inner.config.frame_period(),
                    guard: FrameLoopGuard {
                        inner: Arc::downgrade(&self.inner),
                        generation: inner.frame_loop_generation,
                    },
                })
            }
            Err(_) => {
                if !inner.warned_no_runtime {
                    inner.warned_no_runtime = true;
                    tracing::warn!("no tokio runtime; animations advance only when ticked manually");
                }
                None
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Check if any animations are still active
    pub fn has_active_animations(&self) -> bool {
        self.active_count() > 0
    }

    /// Number of animating integrators
    pub fn active_count(&self) -> usize {
        self.lock().active_count()
    }

    /// Number of registered integrators, animating or not
    pub fn animator_count(&self) -> usize {
        self.lock().animators.len()
    }

    /// Whether the self-driven frame loop is currently running
    pub fn is_frame_loop_running(&self) -> bool {
        self.lock().frame_loop_running
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

struct PendingFrameLoop {
    handle: tokio::runtime::Handle,
    period: Duration,
    guard: FrameLoopGuard,
}

impl PendingFrameLoop {
    fn spawn(self) {
        tracing::debug!(period = ?self.period, "frame loop started");
        self.handle.spawn(run_frame_loop(self.guard, self.period));
    }
}

/// Marks the frame loop as stopped when its task ends
///
/// The task owns the guard from the moment it is spawned, so a runtime
/// shutting down before or while polling the task still clears the flag.
struct FrameLoopGuard {
    inner: Weak<Mutex<SchedulerInner>>,
    generation: u64,
}

impl Drop for FrameLoopGuard {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut inner = lock(&inner);
        // A newer loop may already own the flag
        if inner.frame_loop_generation == self.generation && inner.frame_loop_running {
            inner.frame_loop_running = false;
            inner.last_frame = None;
            tracing::debug!("frame loop dropped");
        }
    }
}

async fn run_frame_loop(frame_loop: FrameLoopGuard, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        let Some(inner) = frame_loop.inner.upgrade() else {
            break;
        };
        let scheduler = AnimationScheduler { inner };
        if scheduler.tick_frame() {
            continue;
        }

        // Re-check under the lock so a concurrent start keeps the loop alive
        let mut guard = scheduler.lock();
        if guard.active_count() == 0 {
            guard.frame_loop_running = false;
            guard.last_frame = None;
            tracing::debug!("frame loop stopped");
            break;
        }
    }
}
