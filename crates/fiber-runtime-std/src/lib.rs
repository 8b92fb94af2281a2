//! Standard host services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the host traits defined
//! in `fiber-core`. Applications construct a [`StdRuntime`], hand its
//! [`Runtime`] to [`fiber_core::Reconciler::with_runtime`] and then let
//! [`drive_until_idle`] grant turns until the reconciler has nothing left
//! to do.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use fiber_core::{
    Clock, ClockDeadline, DisplaySurface, FiberError, HostScheduler, Reconciler, Runtime,
    SchedulerPhase,
};

type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler that records idle-turn requests in an atomic flag.
pub struct StdScheduler {
    idle_requested: AtomicBool,
    idle_waker: RwLock<Option<Waker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            idle_requested: AtomicBool::new(false),
            idle_waker: RwLock::new(None),
        }
    }

    /// Returns whether a turn has been requested since the last call.
    pub fn take_idle_request(&self) -> bool {
        self.idle_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker invoked whenever the reconciler asks for a turn.
    pub fn set_idle_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self
            .idle_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    /// Clears any registered waker.
    pub fn clear_idle_waker(&self) {
        *self
            .idle_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn wake(&self) {
        let waker = self
            .idle_waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field("idle_requested", &self.idle_requested.load(Ordering::SeqCst))
            .finish()
    }
}

impl HostScheduler for StdScheduler {
    fn request_idle_turn(&self) {
        self.idle_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Clock implementation backed by [`std::time`].
#[derive(Debug, Default, Clone)]
pub struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn elapsed_millis(&self, since: Self::Instant) -> u64 {
        since.elapsed().as_millis() as u64
    }
}

/// Convenience container bundling the standard scheduler and clock.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    clock: Arc<StdClock>,
    runtime: Runtime,
}

impl StdRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self {
            scheduler,
            clock: Arc::new(StdClock),
            runtime,
        }
    }

    /// Returns a [`fiber_core::Runtime`] wired to the standard scheduler.
    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    /// Returns whether a turn was requested since the last poll.
    pub fn take_idle_request(&self) -> bool {
        self.scheduler.take_idle_request()
    }

    pub fn set_idle_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_idle_waker(waker);
    }

    pub fn clear_idle_waker(&self) {
        self.scheduler.clear_idle_waker();
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct StdDriverConfig {
    /// Wall-clock budget granted to each turn.
    pub turn_budget: Duration,
    /// Turns granted by one [`drive_until_idle`] call before giving up.
    pub max_turns: usize,
}

impl Default for StdDriverConfig {
    fn default() -> Self {
        Self {
            turn_budget: Duration::from_millis(16),
            max_turns: 10_000,
        }
    }
}

/// Grants turns to `reconciler` while it keeps asking for them and still has
/// work, and returns how many turns ran.
///
/// The reconciler must have been built on `runtime.runtime()`; turns it
/// requests through any other runtime are never seen here.
pub fn drive_until_idle<S: DisplaySurface>(
    runtime: &StdRuntime,
    reconciler: &mut Reconciler<S>,
    config: &StdDriverConfig,
) -> Result<usize, FiberError> {
    let mut turns = 0;
    while turns < config.max_turns && runtime.take_idle_request() {
        if !reconciler.has_pending_work() {
            break;
        }
        let deadline = ClockDeadline::start(&*runtime.clock, config.turn_budget);
        let phase = reconciler.work_loop(&deadline)?;
        turns += 1;
        log::trace!("turn {turns} ended in {phase:?}");
        if phase == SchedulerPhase::Idle && !reconciler.has_pending_work() {
            break;
        }
    }
    if reconciler.has_pending_work() {
        log::warn!("driver stopped after {turns} turns with work still pending");
    }
    Ok(turns)
}
