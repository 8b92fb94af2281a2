use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::HostScheduler;

struct RuntimeInner {
    scheduler: Arc<dyn HostScheduler>,
    turn_requested: Cell<bool>,
    render_requested: Cell<bool>,
    turns_requested: Cell<u64>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn HostScheduler>) -> Self {
        Self {
            scheduler,
            turn_requested: Cell::new(false),
            render_requested: Cell::new(false),
            turns_requested: Cell::new(0),
        }
    }

    fn request_turn(&self) {
        self.turn_requested.set(true);
        self.turns_requested.set(self.turns_requested.get() + 1);
        self.scheduler.request_idle_turn();
    }

    fn request_render(&self) {
        self.render_requested.set(true);
        self.request_turn();
    }
}

/// Shared state connecting state setters, the reconciler and the host
/// scheduler.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn HostScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    /// Whether a turn was requested since the last call; clears the flag.
    pub fn take_turn_request(&self) -> bool {
        self.inner.turn_requested.replace(false)
    }

    pub fn has_render_request(&self) -> bool {
        self.inner.render_requested.get()
    }

    pub(crate) fn take_render_request(&self) -> bool {
        self.inner.render_requested.replace(false)
    }

    pub(crate) fn request_turn(&self) {
        self.inner.request_turn();
    }

    /// Total number of turns requested from the host so far.
    pub fn turns_requested(&self) -> u64 {
        self.inner.turns_requested.get()
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl HostScheduler for DefaultScheduler {
    fn request_idle_turn(&self) {}
}

/// Non-owning handle held by state setters. Requests made after the runtime
/// is gone are dropped.
#[derive(Clone)]
pub struct RuntimeHandle(pub(crate) Weak<RuntimeInner>);

impl RuntimeHandle {
    /// Ask for a render rooted at the committed tree on the next turn.
    pub fn request_render(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.request_render();
        } else {
            log::debug!("render requested after runtime shutdown; ignoring");
        }
    }

    pub fn has_render_request(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.render_requested.get())
            .unwrap_or(false)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}
