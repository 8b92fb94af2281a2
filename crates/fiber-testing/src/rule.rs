use std::cell::Cell;
use std::time::Duration;

use fiber_core::{
    Deadline, DisplaySurface, Element, FiberError, NodeId, Reconciler, ReconcilerConfig,
    SchedulerPhase,
};

use crate::RecordingSurface;

/// Deadline that lets exactly `units` render units run before asking the
/// reconciler to yield.
#[derive(Debug)]
pub struct UnitBudget {
    remaining: Cell<usize>,
}

impl UnitBudget {
    pub fn new(units: usize) -> Self {
        Self {
            remaining: Cell::new(units),
        }
    }
}

impl Deadline for UnitBudget {
    fn time_remaining(&self) -> Duration {
        let left = self.remaining.get().saturating_sub(1);
        self.remaining.set(left);
        if left == 0 {
            Duration::ZERO
        } else {
            Duration::MAX
        }
    }
}

/// Headless harness for exercising renders in tests.
///
/// Owns a reconciler over a [`RecordingSurface`] with a single container
/// primitive and helpers for driving work to completion and firing events.
pub struct ReconcilerTestRule {
    reconciler: Reconciler<RecordingSurface>,
    container: NodeId,
    content: Option<Element>,
}

impl ReconcilerTestRule {
    pub fn new() -> Self {
        Self::with_config(ReconcilerConfig::default())
    }

    pub fn with_config(config: ReconcilerConfig) -> Self {
        let mut surface = RecordingSurface::new();
        let container = surface.create_primitive("root");
        surface.clear_ops();
        Self {
            reconciler: Reconciler::new(surface).with_config(config),
            container,
            content: None,
        }
    }

    /// Installs `content` and renders it to completion.
    pub fn set_content(&mut self, content: Element) -> Result<(), FiberError> {
        self.content = Some(content);
        self.rerender()
    }

    /// Renders the installed content again from the committed tree.
    pub fn rerender(&mut self) -> Result<(), FiberError> {
        if let Some(content) = self.content.clone() {
            self.reconciler.render(content, self.container);
        }
        self.pump_until_idle()
    }

    /// Grants unbounded turns until nothing is left to render.
    pub fn pump_until_idle(&mut self) -> Result<(), FiberError> {
        self.reconciler.flush()
    }

    /// Grants a single turn with the given budget.
    pub fn step(&mut self, budget: &dyn Deadline) -> Result<SchedulerPhase, FiberError> {
        self.reconciler.work_loop(budget)
    }

    /// Fires `event` at `node` and processes whatever renders it requests.
    pub fn dispatch(&mut self, node: NodeId, event: &str) -> Result<usize, FiberError> {
        let ran = self.reconciler.surface().inner().dispatch(node, event)?;
        self.pump_until_idle()?;
        Ok(ran)
    }

    /// Fires `event` at the first primitive tagged `tag`.
    pub fn dispatch_on_tag(&mut self, tag: &str, event: &str) -> Result<usize, FiberError> {
        match self.find(tag) {
            Some(node) => self.dispatch(node, event),
            None => {
                log::warn!("no <{tag}> under the test container; {event} not dispatched");
                Ok(0)
            }
        }
    }

    pub fn find(&self, tag: &str) -> Option<NodeId> {
        self.surface().inner().find_by_tag(self.container, tag)
    }

    pub fn text_content(&self) -> String {
        self.surface().inner().text_content(self.container)
    }

    pub fn dump_tree(&self) -> String {
        self.surface().inner().dump_tree(Some(self.container))
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    pub fn surface(&self) -> &RecordingSurface {
        self.reconciler.surface()
    }

    pub fn surface_mut(&mut self) -> &mut RecordingSurface {
        self.reconciler.surface_mut()
    }

    pub fn reconciler(&self) -> &Reconciler<RecordingSurface> {
        &self.reconciler
    }

    /// Raw reconciler access for tests that drive phases by hand.
    pub fn reconciler_mut(&mut self) -> &mut Reconciler<RecordingSurface> {
        &mut self.reconciler
    }
}

impl Default for ReconcilerTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `ReconcilerTestRule`.
pub fn run_test_render<R>(f: impl FnOnce(&mut ReconcilerTestRule) -> R) -> R {
    let mut rule = ReconcilerTestRule::new();
    f(&mut rule)
}
