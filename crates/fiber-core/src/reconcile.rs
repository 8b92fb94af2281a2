use crate::element::Element;
use crate::fiber::{FiberTree, RenderUnit, UnitKey, UnitType};
use crate::runtime::RuntimeHandle;
use crate::state::{CellRef, Scope};
use crate::surface::{materialize, DisplaySurface};
use crate::FiberError;

/// Expands units of the work-in-progress tree one at a time.
pub(crate) struct Builder<'a, S: DisplaySurface + ?Sized> {
    pub(crate) wip: &'a mut FiberTree,
    pub(crate) committed: Option<&'a FiberTree>,
    pub(crate) deletions: &'a mut Vec<UnitKey>,
    pub(crate) surface: &'a mut S,
    pub(crate) runtime: RuntimeHandle,
}

impl<S: DisplaySurface + ?Sized> Builder<'_, S> {
    /// Expands `key` and returns the next unit awaiting expansion.
    pub(crate) fn perform_unit(&mut self, key: UnitKey) -> Result<Option<UnitKey>, FiberError> {
        let unit = self.wip.unit(key)?;
        let ty = unit.ty.clone();
        let element = unit.element.clone();
        log::trace!("expanding {ty:?}");
        match ty {
            UnitType::Root => self.reconcile_children(key, element.children())?,
            UnitType::Host(tag) => {
                if self.wip.unit(key)?.handle.is_none() {
                    let handle = materialize(&mut *self.surface, &tag, element.props())?;
                    self.wip.unit_mut(key)?.handle = Some(handle);
                }
                self.reconcile_children(key, element.children())?;
            }
            UnitType::Component(component) => {
                let committed = self.committed;
                let previous: &[CellRef] = match (committed, self.wip.unit(key)?.alternate) {
                    (Some(tree), Some(alternate)) => tree.unit(alternate)?.state_cells.as_slice(),
                    _ => &[],
                };
                let mut scope = Scope::new(previous, self.runtime.clone());
                let child = component.invoke(&mut scope, element.props());
                self.wip.unit_mut(key)?.state_cells = scope.into_cells();
                self.reconcile_children(key, std::slice::from_ref(&child))?;
            }
        }
        Ok(self.wip.next_in_order(key))
    }

    /// Pairs `elements` with the alternate's children by position.
    fn reconcile_children(
        &mut self,
        parent: UnitKey,
        elements: &[Element],
    ) -> Result<(), FiberError> {
        let committed = self.committed;
        let mut old = match (committed, self.wip.unit(parent)?.alternate) {
            (Some(tree), Some(alternate)) => tree.unit(alternate)?.first_child,
            _ => None,
        };
        let mut previous: Option<UnitKey> = None;
        let mut index = 0;

        while index < elements.len() || old.is_some() {
            let element = elements.get(index);
            let old_unit = match (committed, old) {
                (Some(tree), Some(key)) => Some((key, tree.unit(key)?)),
                _ => None,
            };

            let produced = match (element, old_unit) {
                (Some(element), Some((old_key, old_unit))) if old_unit.ty.matches(element.ty()) => {
                    Some(RenderUnit::update(
                        element.clone(),
                        parent,
                        old_key,
                        old_unit.handle,
                    ))
                }
                (Some(element), _) => Some(RenderUnit::placement(element.clone(), parent)),
                (None, _) => None,
            };

            if let Some((old_key, old_unit)) = old_unit {
                let paired = produced
                    .as_ref()
                    .is_some_and(|unit| unit.alternate == Some(old_key));
                if !paired {
                    self.deletions.push(old_key);
                }
                old = old_unit.next_sibling;
            }

            if let Some(unit) = produced {
                let key = self.wip.insert(unit);
                match previous {
                    None => self.wip.unit_mut(parent)?.first_child = Some(key),
                    Some(prev) => self.wip.unit_mut(prev)?.next_sibling = Some(key),
                }
                previous = Some(key);
            }
            index += 1;
        }
        Ok(())
    }
}
