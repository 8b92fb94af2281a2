//! Platform abstraction traits for the reconciler's host services.
//!
//! The core never measures time or schedules itself. The host grants it
//! turns and reports how much of the current turn is left; these traits are
//! the whole contract between the two.

use std::time::Duration;

/// Hands turns to the reconciler.
///
/// Implementations arrange for [`crate::Reconciler::work_loop`] to be called
/// again, typically when the host is idle. They must be safe to use from
/// multiple threads.
pub trait HostScheduler: Send + Sync {
    /// Request that the host grant another turn.
    fn request_idle_turn(&self);
}

/// Remaining budget of the current turn.
pub trait Deadline {
    fn time_remaining(&self) -> Duration;
}

/// A turn that never runs out.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// Provides timing information for the runtime.
pub trait Clock: Send + Sync {
    /// Instant type produced by this clock implementation.
    type Instant: Copy + Send + Sync;

    /// Returns the current instant.
    fn now(&self) -> Self::Instant;

    /// Returns the number of milliseconds elapsed since `since`.
    fn elapsed_millis(&self, since: Self::Instant) -> u64;
}

/// Deadline measured against a [`Clock`] from the moment it was started.
pub struct ClockDeadline<'a, C: Clock> {
    clock: &'a C,
    started: C::Instant,
    budget: Duration,
}

impl<'a, C: Clock> ClockDeadline<'a, C> {
    pub fn start(clock: &'a C, budget: Duration) -> Self {
        Self {
            clock,
            started: clock.now(),
            budget,
        }
    }
}

impl<C: Clock> Deadline for ClockDeadline<'_, C> {
    fn time_remaining(&self) -> Duration {
        let elapsed = Duration::from_millis(self.clock.elapsed_millis(self.started));
        self.budget.saturating_sub(elapsed)
    }
}
