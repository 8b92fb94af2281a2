//! Applies a finished work-in-progress tree to the display surface.
//!
//! Commit never yields. Deletions run first against the previous tree, then
//! placements and updates run depth-first over the new one, so a primitive
//! is only ever appended to a parent that already has its handle.

use crate::fiber::{EffectTag, FiberTree, UnitKey};
use crate::surface::{apply_delta, DisplaySurface};
use crate::{FiberError, NodeId};

/// Mutations performed by one commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
}

impl CommitStats {
    pub fn is_empty(&self) -> bool {
        self.placements == 0 && self.updates == 0 && self.deletions == 0
    }
}

pub(crate) fn commit_root<S: DisplaySurface + ?Sized>(
    surface: &mut S,
    wip: &mut FiberTree,
    committed: Option<&FiberTree>,
    deletions: &[UnitKey],
) -> Result<CommitStats, FiberError> {
    let mut stats = CommitStats::default();

    if let Some(previous) = committed {
        for &key in deletions {
            let parent = previous
                .nearest_host_ancestor(key)
                .ok_or(FiberError::MissingHandle { unit: key })?;
            commit_deletion(surface, previous, key, parent)?;
            stats.deletions += 1;
        }
    }

    let mut next = wip.unit(wip.root())?.first_child;
    while let Some(key) = next {
        commit_work(surface, wip, committed, key, &mut stats)?;
        next = wip.next_in_order(key);
    }

    wip.settle();
    Ok(stats)
}

fn commit_work<S: DisplaySurface + ?Sized>(
    surface: &mut S,
    wip: &FiberTree,
    committed: Option<&FiberTree>,
    key: UnitKey,
    stats: &mut CommitStats,
) -> Result<(), FiberError> {
    let unit = wip.unit(key)?;
    let Some(handle) = unit.handle else {
        return Ok(());
    };
    match unit.effect {
        EffectTag::Placement => {
            let parent = wip
                .nearest_host_ancestor(key)
                .ok_or(FiberError::MissingHandle { unit: key })?;
            surface.append_child(parent, handle)?;
            stats.placements += 1;
        }
        EffectTag::Update => {
            let alternate = unit.alternate.ok_or(FiberError::StaleUnit { unit: key })?;
            let previous = committed
                .ok_or(FiberError::StaleUnit { unit: alternate })?
                .unit(alternate)?;
            let old = previous.element.props();
            let new = unit.element.props();
            if old != new {
                apply_delta(surface, handle, old, new)?;
                stats.updates += 1;
            }
        }
        EffectTag::None | EffectTag::Deletion => {}
    }
    Ok(())
}

/// Detaches the first handle-owning units of a removed subtree.
fn commit_deletion<S: DisplaySurface + ?Sized>(
    surface: &mut S,
    tree: &FiberTree,
    key: UnitKey,
    parent: NodeId,
) -> Result<(), FiberError> {
    let unit = tree.unit(key)?;
    if let Some(handle) = unit.handle {
        surface.remove_child(parent, handle)?;
        return Ok(());
    }
    for child in tree.children(key) {
        commit_deletion(surface, tree, child, parent)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/commit_tests.rs"]
mod tests;
