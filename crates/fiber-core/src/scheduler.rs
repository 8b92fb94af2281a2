//! The cooperative work loop.
//!
//! [`Reconciler`] holds everything a render pass needs: the committed and
//! in-progress generations, the next unit to expand and the deletion list.
//! The host calls [`Reconciler::work_loop`] once per turn; the loop expands
//! units until the turn's deadline runs low, commits when the tree is
//! finished, and always asks the host for another turn before returning.

use std::sync::Arc;
use std::time::Duration;

use crate::commit::{commit_root, CommitStats};
use crate::element::Element;
use crate::fiber::{EffectTag, FiberTree, UnitKey};
use crate::platform::{Deadline, Unbounded};
use crate::reconcile::Builder;
use crate::runtime::{DefaultScheduler, Runtime, RuntimeHandle};
use crate::surface::DisplaySurface;
use crate::{FiberError, NodeId};

#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    /// Yield once less than this much of the turn is left.
    pub yield_threshold: Duration,
    /// Upper bound on units expanded in one turn, on top of the deadline.
    pub max_units_per_turn: Option<usize>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
            max_units_per_turn: None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Building,
    ReadyToCommit,
}

struct RootRequest {
    element: Element,
    container: NodeId,
}

pub struct Reconciler<S: DisplaySurface> {
    surface: S,
    runtime: Runtime,
    config: ReconcilerConfig,
    request: Option<RootRequest>,
    committed: Option<FiberTree>,
    work_in_progress: Option<FiberTree>,
    next_unit: Option<UnitKey>,
    deletions: Vec<UnitKey>,
    last_commit: Option<CommitStats>,
}

impl<S: DisplaySurface> Reconciler<S> {
    pub fn new(surface: S) -> Self {
        Self::with_runtime(surface, Runtime::new(Arc::new(DefaultScheduler)))
    }

    pub fn with_runtime(surface: S, runtime: Runtime) -> Self {
        Self {
            surface,
            runtime,
            config: ReconcilerConfig::default(),
            request: None,
            committed: None,
            work_in_progress: None,
            next_unit: None,
            deletions: Vec::new(),
            last_commit: None,
        }
    }

    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Starts rendering `element` into `container`.
    ///
    /// The new tree is diffed against the committed one when it targets the
    /// same container. Work from an earlier request that has not been
    /// committed yet is thrown away.
    pub fn render(&mut self, element: Element, container: NodeId) {
        log::debug!("render requested into {container}");
        self.request = Some(RootRequest { element, container });
        self.begin_render();
    }

    fn begin_render(&mut self) {
        self.runtime.take_render_request();
        let Some((element, container)) = self
            .request
            .as_ref()
            .map(|request| (request.element.clone(), request.container))
        else {
            return;
        };
        if self.work_in_progress.is_some() {
            log::warn!("discarding in-progress render before commit");
            self.discard_work_in_progress();
        }
        let alternate = self
            .committed
            .as_ref()
            .filter(|tree| tree.container() == Some(container))
            .map(FiberTree::root);
        let tree = FiberTree::new_root(element, container, alternate);
        self.next_unit = Some(tree.root());
        self.work_in_progress = Some(tree);
        self.deletions.clear();
        self.runtime.request_turn();
    }

    /// Runs one host turn and reports the phase it ends in.
    ///
    /// The host scheduler is re-armed whatever the outcome. An error
    /// abandons the in-progress tree; the committed tree stays as it was
    /// unless the failure happened during commit.
    pub fn work_loop(&mut self, deadline: &dyn Deadline) -> Result<SchedulerPhase, FiberError> {
        let result = self.turn(deadline);
        self.runtime.request_turn();
        if let Err(err) = &result {
            log::error!("render pass failed: {err}");
            self.abandon();
        }
        result
    }

    fn turn(&mut self, deadline: &dyn Deadline) -> Result<SchedulerPhase, FiberError> {
        if self.runtime.has_render_request() {
            log::debug!("state update requested a render from the committed root");
            self.begin_render();
        }
        self.build(deadline)?;
        if self.phase() == SchedulerPhase::ReadyToCommit {
            self.commit()?;
        }
        Ok(self.phase())
    }

    /// Expands units until the deadline asks to yield or none are left,
    /// without committing.
    pub fn build(&mut self, deadline: &dyn Deadline) -> Result<SchedulerPhase, FiberError> {
        let mut performed = 0usize;
        while let Some(key) = self.next_unit {
            self.next_unit = self.perform_unit(key)?;
            performed += 1;
            let budget_spent = self
                .config
                .max_units_per_turn
                .is_some_and(|max| performed >= max);
            if budget_spent || deadline.time_remaining() < self.config.yield_threshold {
                break;
            }
        }
        log::trace!("expanded {performed} units this turn");
        Ok(self.phase())
    }

    fn perform_unit(&mut self, key: UnitKey) -> Result<Option<UnitKey>, FiberError> {
        let Self {
            surface,
            runtime,
            committed,
            work_in_progress,
            deletions,
            ..
        } = self;
        let wip = work_in_progress
            .as_mut()
            .ok_or(FiberError::StaleUnit { unit: key })?;
        let mut builder = Builder {
            wip,
            committed: committed.as_ref(),
            deletions,
            surface,
            runtime: runtime.handle(),
        };
        builder.perform_unit(key)
    }

    /// Applies the finished tree to the surface and publishes it.
    ///
    /// Does nothing unless the reconciler is ready to commit.
    pub fn commit(&mut self) -> Result<(), FiberError> {
        if self.phase() != SchedulerPhase::ReadyToCommit {
            return Ok(());
        }
        let Some(mut wip) = self.work_in_progress.take() else {
            return Ok(());
        };
        let deletions = std::mem::take(&mut self.deletions);
        let stats = commit_root(&mut self.surface, &mut wip, self.committed.as_ref(), &deletions)?;
        log::debug!(
            "committed {} units: {} placed, {} updated, {} removed",
            wip.len(),
            stats.placements,
            stats.updates,
            stats.deletions
        );
        self.committed = Some(wip);
        self.last_commit = Some(stats);
        Ok(())
    }

    fn abandon(&mut self) {
        self.discard_work_in_progress();
        self.next_unit = None;
        self.deletions.clear();
    }

    /// Drops the in-progress tree and frees the primitives it created.
    ///
    /// Only PLACEMENT units own primitives of their own; everything else
    /// borrows its handle from the committed tree. Before commit none of
    /// them is attached anywhere.
    fn discard_work_in_progress(&mut self) {
        let Some(wip) = self.work_in_progress.take() else {
            return;
        };
        let created: Vec<NodeId> = wip
            .preorder()
            .filter_map(|key| wip.get(key))
            .filter(|unit| unit.effect() == EffectTag::Placement)
            .filter_map(|unit| unit.handle())
            .collect();
        log::debug!("releasing {} detached primitives", created.len());
        for node in created {
            if let Err(err) = self.surface.release_primitive(node) {
                log::warn!("failed to release discarded primitive {node}: {err}");
            }
        }
    }

    /// Runs unbounded turns until there is nothing left to render.
    pub fn flush(&mut self) -> Result<(), FiberError> {
        while self.has_pending_work() {
            self.work_loop(&Unbounded)?;
        }
        Ok(())
    }

    pub fn phase(&self) -> SchedulerPhase {
        match (self.next_unit, &self.work_in_progress) {
            (Some(_), _) => SchedulerPhase::Building,
            (None, Some(_)) => SchedulerPhase::ReadyToCommit,
            (None, None) => SchedulerPhase::Idle,
        }
    }

    pub fn has_pending_work(&self) -> bool {
        self.phase() != SchedulerPhase::Idle || self.runtime.has_render_request()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn committed(&self) -> Option<&FiberTree> {
        self.committed.as_ref()
    }

    pub fn work_in_progress(&self) -> Option<&FiberTree> {
        self.work_in_progress.as_ref()
    }

    pub fn next_unit(&self) -> Option<UnitKey> {
        self.next_unit
    }

    /// Committed units queued for removal by the current pass.
    pub fn pending_deletions(&self) -> &[UnitKey] {
        &self.deletions
    }

    pub fn last_commit(&self) -> Option<CommitStats> {
        self.last_commit
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
