//! Render units and the per-generation arena holding them.
//!
//! Each render pass builds a fresh [`FiberTree`]. `parent` and `alternate`
//! are plain keys: `parent` points into the same arena, `alternate` into the
//! previously committed one. `first_child` and `next_sibling` are the only
//! structural edges and are rebuilt on every pass.

use slotmap::{new_key_type, SlotMap};

use crate::element::{ComponentFn, Element, ElementType, HostTag};
use crate::state::CellRef;
use crate::{FiberError, NodeId};

new_key_type! {
    pub struct UnitKey;
}

/// Tag of the root literal wrapping the element passed to `render`.
pub(crate) const ROOT_TAG: &str = "#root";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EffectTag {
    #[default]
    None,
    Placement,
    Update,
    /// Never stored on a unit. Deleted units stay untouched in the committed
    /// tree and reach the commit through `Reconciler::pending_deletions`.
    Deletion,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnitType {
    Root,
    Host(HostTag),
    Component(ComponentFn),
}

impl UnitType {
    /// Whether a unit of this type can be paired with a literal of type `ty`.
    pub fn matches(&self, ty: &ElementType) -> bool {
        match (self, ty) {
            (UnitType::Host(tag), ElementType::Host(other)) => tag == other,
            (UnitType::Component(component), ElementType::Component(other)) => component == other,
            _ => false,
        }
    }
}

impl From<&ElementType> for UnitType {
    fn from(ty: &ElementType) -> Self {
        match ty {
            ElementType::Host(tag) => UnitType::Host(tag.clone()),
            ElementType::Component(component) => UnitType::Component(component.clone()),
        }
    }
}

pub struct RenderUnit {
    pub(crate) ty: UnitType,
    pub(crate) element: Element,
    pub(crate) handle: Option<NodeId>,
    pub(crate) parent: Option<UnitKey>,
    pub(crate) first_child: Option<UnitKey>,
    pub(crate) next_sibling: Option<UnitKey>,
    pub(crate) alternate: Option<UnitKey>,
    pub(crate) effect: EffectTag,
    pub(crate) state_cells: Vec<CellRef>,
}

impl RenderUnit {
    fn new(ty: UnitType, element: Element, parent: Option<UnitKey>) -> Self {
        Self {
            ty,
            element,
            handle: None,
            parent,
            first_child: None,
            next_sibling: None,
            alternate: None,
            effect: EffectTag::None,
            state_cells: Vec::new(),
        }
    }

    /// A unit for a position that had no same-typed counterpart.
    pub(crate) fn placement(element: Element, parent: UnitKey) -> Self {
        let mut unit = Self::new(UnitType::from(element.ty()), element, Some(parent));
        unit.effect = EffectTag::Placement;
        unit
    }

    /// A unit reusing the display handle of `alternate`.
    pub(crate) fn update(
        element: Element,
        parent: UnitKey,
        alternate: UnitKey,
        handle: Option<NodeId>,
    ) -> Self {
        let mut unit = Self::new(UnitType::from(element.ty()), element, Some(parent));
        unit.handle = handle;
        unit.alternate = Some(alternate);
        unit.effect = EffectTag::Update;
        unit
    }

    pub fn unit_type(&self) -> &UnitType {
        &self.ty
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn handle(&self) -> Option<NodeId> {
        self.handle
    }

    pub fn parent(&self) -> Option<UnitKey> {
        self.parent
    }

    pub fn first_child(&self) -> Option<UnitKey> {
        self.first_child
    }

    pub fn next_sibling(&self) -> Option<UnitKey> {
        self.next_sibling
    }

    pub fn alternate(&self) -> Option<UnitKey> {
        self.alternate
    }

    pub fn effect(&self) -> EffectTag {
        self.effect
    }

    pub fn state_cell_count(&self) -> usize {
        self.state_cells.len()
    }
}

/// One generation of render units.
pub struct FiberTree {
    units: SlotMap<UnitKey, RenderUnit>,
    root: UnitKey,
}

impl FiberTree {
    /// Starts a generation whose root renders `element` into `container`.
    pub(crate) fn new_root(element: Element, container: NodeId, alternate: Option<UnitKey>) -> Self {
        let root_element = Element::host(ROOT_TAG).child(element);
        let mut root = RenderUnit::new(UnitType::Root, root_element, None);
        root.handle = Some(container);
        root.alternate = alternate;
        let mut units = SlotMap::with_key();
        let root = units.insert(root);
        Self { units, root }
    }

    pub fn root(&self) -> UnitKey {
        self.root
    }

    /// Display handle the tree renders into.
    pub fn container(&self) -> Option<NodeId> {
        self.units.get(self.root).and_then(|root| root.handle)
    }

    pub fn get(&self, key: UnitKey) -> Option<&RenderUnit> {
        self.units.get(key)
    }

    pub(crate) fn unit(&self, key: UnitKey) -> Result<&RenderUnit, FiberError> {
        self.units.get(key).ok_or(FiberError::StaleUnit { unit: key })
    }

    pub(crate) fn unit_mut(&mut self, key: UnitKey) -> Result<&mut RenderUnit, FiberError> {
        self.units
            .get_mut(key)
            .ok_or(FiberError::StaleUnit { unit: key })
    }

    pub(crate) fn insert(&mut self, unit: RenderUnit) -> UnitKey {
        self.units.insert(unit)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn children(&self, key: UnitKey) -> Children<'_> {
        Children {
            tree: self,
            next: self.units.get(key).and_then(|unit| unit.first_child),
        }
    }

    /// Next unit in depth-first order: first child, else the nearest
    /// sibling found while ascending. `None` once the walk is back at the
    /// root.
    pub fn next_in_order(&self, key: UnitKey) -> Option<UnitKey> {
        let unit = self.units.get(key)?;
        if let Some(child) = unit.first_child {
            return Some(child);
        }
        let mut current = Some(key);
        while let Some(key) = current {
            let unit = self.units.get(key)?;
            if let Some(sibling) = unit.next_sibling {
                return Some(sibling);
            }
            current = unit.parent;
        }
        None
    }

    /// Handle of the closest ancestor that owns one.
    pub fn nearest_host_ancestor(&self, key: UnitKey) -> Option<NodeId> {
        let mut current = self.units.get(key)?.parent;
        while let Some(key) = current {
            let unit = self.units.get(key)?;
            if let Some(handle) = unit.handle {
                return Some(handle);
            }
            current = unit.parent;
        }
        None
    }

    /// Units in depth-first order, root first.
    pub fn preorder(&self) -> impl Iterator<Item = UnitKey> + '_ {
        std::iter::successors(Some(self.root), move |&key| self.next_in_order(key))
    }

    /// Clears per-pass bookkeeping once the tree is published.
    pub(crate) fn settle(&mut self) {
        for unit in self.units.values_mut() {
            unit.effect = EffectTag::None;
            unit.alternate = None;
        }
    }

    pub fn dump(&self) -> String {
        let mut output = String::new();
        self.dump_unit(&mut output, self.root, 0);
        output
    }

    fn dump_unit(&self, output: &mut String, key: UnitKey, depth: usize) {
        let Some(unit) = self.units.get(key) else {
            return;
        };
        let indent = "  ".repeat(depth);
        let label = match &unit.ty {
            UnitType::Root => "root".to_owned(),
            UnitType::Host(HostTag::Named(tag)) => format!("<{tag}>"),
            UnitType::Host(HostTag::Text) => {
                format!("{:?}", unit.element.text_value().unwrap_or_default())
            }
            UnitType::Component(component) => component.name().to_owned(),
        };
        output.push_str(&format!("{indent}{label} {:?}\n", unit.effect));
        for child in self.children(key) {
            self.dump_unit(output, child, depth + 1);
        }
    }
}

pub struct Children<'a> {
    tree: &'a FiberTree,
    next: Option<UnitKey>,
}

impl Iterator for Children<'_> {
    type Item = UnitKey;

    fn next(&mut self) -> Option<UnitKey> {
        let key = self.next?;
        self.next = self.tree.units.get(key).and_then(|unit| unit.next_sibling);
        Some(key)
    }
}

#[cfg(test)]
#[path = "tests/fiber_tests.rs"]
mod tests;
