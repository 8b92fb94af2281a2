//! Per-unit local state.
//!
//! A component's state cells are identified only by the order in which the
//! component asks for them. Every build of a unit must request the same
//! cells in the same order; asking conditionally or reordering the calls
//! makes a cell read a neighbour's value. A cell whose stored type no longer
//! matches the requested one panics, any other reordering goes unnoticed.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::runtime::RuntimeHandle;

pub(crate) type CellRef = Rc<dyn Any>;

type Update<T> = Box<dyn Fn(&T) -> T>;

struct StateCell<T> {
    value: T,
    pending: RefCell<Vec<Update<T>>>,
}

impl<T: Clone> StateCell<T> {
    /// Value after every queued update, in enqueue order. The queue is left
    /// in place: if the build reading it is discarded before commit, the
    /// restarted build folds the same updates again.
    fn resolve(&self) -> T {
        let pending = self.pending.borrow();
        pending
            .iter()
            .fold(self.value.clone(), |value, update| update(&value))
    }
}

/// Build context handed to a component while it renders.
pub struct Scope<'a> {
    previous: &'a [CellRef],
    cells: Vec<CellRef>,
    runtime: RuntimeHandle,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(previous: &'a [CellRef], runtime: RuntimeHandle) -> Self {
        Self {
            previous,
            cells: Vec::with_capacity(previous.len()),
            runtime,
        }
    }

    /// Reads the next state cell, creating it with `initial` on the first
    /// build of this unit.
    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, Setter<T>) {
        self.use_state_with(move || initial)
    }

    /// Like [`Scope::use_state`] but only computes the initial value when
    /// the cell does not exist yet.
    pub fn use_state_with<T: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> (T, Setter<T>) {
        let index = self.cells.len();
        let value = match self.previous.get(index) {
            Some(previous) => {
                let any: &dyn Any = &**previous;
                let cell = any.downcast_ref::<StateCell<T>>().unwrap_or_else(|| {
                    panic!(
                        "state cell {index} changed type between builds; \
                         state must be requested in the same order on every build"
                    )
                });
                cell.resolve()
            }
            None => init(),
        };
        let cell = Rc::new(StateCell {
            value: value.clone(),
            pending: RefCell::new(Vec::new()),
        });
        let setter = Setter {
            cell: Rc::downgrade(&cell),
            runtime: self.runtime.clone(),
        };
        self.cells.push(cell);
        (value, setter)
    }

    /// Number of cells requested so far in this build.
    pub fn cursor(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn into_cells(self) -> Vec<CellRef> {
        self.cells
    }
}

/// Queues updates on one state cell and asks for a re-render.
///
/// Re-renders always start at the committed root; reconciliation keeps the
/// resulting surface mutations local to what actually changed.
pub struct Setter<T> {
    cell: Weak<StateCell<T>>,
    runtime: RuntimeHandle,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Weak::clone(&self.cell),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T: 'static> Setter<T> {
    pub fn update(&self, update: impl Fn(&T) -> T + 'static) {
        match self.cell.upgrade() {
            Some(cell) => {
                cell.pending.borrow_mut().push(Box::new(update));
                self.runtime.request_render();
            }
            None => log::debug!("state update on a retired cell ignored"),
        }
    }

    /// Whether the cell this setter writes to still belongs to a live tree.
    pub fn is_live(&self) -> bool {
        self.cell.strong_count() > 0
    }
}

impl<T: Clone + 'static> Setter<T> {
    pub fn set(&self, value: T) {
        self.update(move |_| value.clone());
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("live", &(self.cell.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
