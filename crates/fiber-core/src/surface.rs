//! The display surface the commit phase writes to.

use std::fmt;

use crate::collections::map::HashMap;
use crate::element::{event_name, Event, HostTag, Listener, PropValue, Props};
use crate::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    Missing { id: NodeId },
    NotAChild { parent: NodeId, child: NodeId },
    TextParent { id: NodeId },
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::Missing { id } => write!(f, "primitive {id} missing"),
            SurfaceError::NotAChild { parent, child } => {
                write!(f, "primitive {child} is not a child of {parent}")
            }
            SurfaceError::TextParent { id } => {
                write!(f, "text primitive {id} cannot have children")
            }
        }
    }
}

impl std::error::Error for SurfaceError {}

/// Primitive mutations the reconciler needs from a display backend.
///
/// Creation is infallible: a freshly created primitive is detached and has
/// no properties. Every other operation names an existing primitive and
/// fails if it does not.
pub trait DisplaySurface {
    fn create_primitive(&mut self, tag: &str) -> NodeId;
    fn create_text_primitive(&mut self) -> NodeId;
    fn set_property(&mut self, node: NodeId, name: &str, value: &PropValue)
        -> Result<(), SurfaceError>;
    fn remove_property(&mut self, node: NodeId, name: &str) -> Result<(), SurfaceError>;
    fn add_listener(
        &mut self,
        node: NodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), SurfaceError>;
    fn remove_listener(
        &mut self,
        node: NodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), SurfaceError>;
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SurfaceError>;
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SurfaceError>;
    /// Frees a primitive created for a render pass that was thrown away
    /// before commit. The handle is never used again.
    fn release_primitive(&mut self, node: NodeId) -> Result<(), SurfaceError>;
}

/// Creates the primitive for a host node and applies all of its properties.
pub fn materialize<S: DisplaySurface + ?Sized>(
    surface: &mut S,
    tag: &HostTag,
    props: &Props,
) -> Result<NodeId, SurfaceError> {
    let node = match tag {
        HostTag::Text => surface.create_text_primitive(),
        HostTag::Named(name) => surface.create_primitive(name),
    };
    apply_delta(surface, node, &Props::new(), props)?;
    Ok(node)
}

/// Brings `node` from `old` to `new` properties.
///
/// Stale listeners go first, then removed plain properties, then new or
/// changed plain properties, then new or changed listeners. A changed
/// listener is therefore always unregistered before its replacement lands.
/// A name that switches between plain value and listener counts as removed
/// in its old role and added in its new one.
pub fn apply_delta<S: DisplaySurface + ?Sized>(
    surface: &mut S,
    node: NodeId,
    old: &Props,
    new: &Props,
) -> Result<(), SurfaceError> {
    for (name, value) in old {
        if let (Some(event), PropValue::Listener(listener)) = (event_name(name, value), value) {
            if new.get(name) != Some(value) {
                surface.remove_listener(node, &event, listener)?;
            }
        }
    }
    for (name, value) in old {
        let still_plain = new
            .get(name)
            .is_some_and(|next| event_name(name, next).is_none());
        if event_name(name, value).is_none() && !still_plain {
            surface.remove_property(node, name)?;
        }
    }
    for (name, value) in new {
        if event_name(name, value).is_none() && old.get(name) != Some(value) {
            surface.set_property(node, name, value)?;
        }
    }
    for (name, value) in new {
        if let (Some(event), PropValue::Listener(listener)) = (event_name(name, value), value) {
            if old.get(name) != Some(value) {
                surface.add_listener(node, &event, listener)?;
            }
        }
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    Element(String),
    Text,
}

#[derive(Debug)]
pub struct MemoryPrimitive {
    kind: PrimitiveKind,
    properties: HashMap<String, PropValue>,
    listeners: HashMap<String, Vec<Listener>>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl MemoryPrimitive {
    fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            properties: HashMap::new(),
            listeners: HashMap::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn kind(&self) -> &PrimitiveKind {
        &self.kind
    }

    pub fn property(&self, name: &str) -> Option<&PropValue> {
        self.properties.get(name)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, Vec::len)
    }
}

/// In-memory display surface.
///
/// Primitives live in a slab of optional slots. Removing a child frees its
/// whole subtree since the reconciler never reuses a detached handle; freed
/// slots are handed out again by later creations.
#[derive(Default)]
pub struct MemorySurface {
    nodes: Vec<Option<MemoryPrimitive>>, // FUTURE(no_std): migrate to arena-backed node storage.
    vacant: Vec<NodeId>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, primitive: MemoryPrimitive) -> NodeId {
        match self.vacant.pop() {
            Some(id) => {
                self.nodes[id] = Some(primitive);
                id
            }
            None => {
                self.nodes.push(Some(primitive));
                self.nodes.len() - 1
            }
        }
    }

    /// Number of slots ever allocated, live or free.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&MemoryPrimitive> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut MemoryPrimitive, SurfaceError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(SurfaceError::Missing { id })
    }

    /// Number of live primitives, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], MemoryPrimitive::children)
    }

    pub fn property(&self, id: NodeId, name: &str) -> Option<&PropValue> {
        self.get(id).and_then(|node| node.property(name))
    }

    /// Number of primitives below `root`, not counting `root` itself.
    pub fn descendant_count(&self, root: NodeId) -> usize {
        self.children(root)
            .iter()
            .map(|&child| 1 + self.descendant_count(child))
            .sum()
    }

    /// Concatenated `nodeValue` of every text primitive below `root`.
    pub fn text_content(&self, root: NodeId) -> String {
        let mut output = String::new();
        self.collect_text(root, &mut output);
        output
    }

    fn collect_text(&self, id: NodeId, output: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        if node.kind == PrimitiveKind::Text {
            if let Some(value) = node.property(crate::element::TEXT_VALUE_PROP) {
                output.push_str(&value.to_string());
            }
        }
        for &child in &node.children {
            self.collect_text(child, output);
        }
    }

    /// Invokes every listener registered for `event` on `id`. Returns how
    /// many ran.
    pub fn dispatch(&self, id: NodeId, event: &str) -> Result<usize, SurfaceError> {
        let node = self.get(id).ok_or(SurfaceError::Missing { id })?;
        let listeners = node.listeners.get(event).cloned().unwrap_or_default();
        let payload = Event {
            name: event.to_owned(),
            target: id,
        };
        for listener in &listeners {
            listener.call(&payload);
        }
        Ok(listeners.len())
    }

    /// Finds the first primitive below `root` (depth-first) with the given tag.
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        for &child in self.children(root) {
            if matches!(self.get(child).map(MemoryPrimitive::kind), Some(PrimitiveKind::Element(t)) if t == tag)
            {
                return Some(child);
            }
            if let Some(found) = self.find_by_tag(child, tag) {
                return Some(found);
            }
        }
        None
    }

    pub fn dump_tree(&self, root: Option<NodeId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_node(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.get(id) {
            Some(node) => {
                match &node.kind {
                    PrimitiveKind::Element(tag) => {
                        output.push_str(&format!("{indent}[{id}] <{tag}>\n"))
                    }
                    PrimitiveKind::Text => {
                        let value = node
                            .property(crate::element::TEXT_VALUE_PROP)
                            .map(ToString::to_string)
                            .unwrap_or_default();
                        output.push_str(&format!("{indent}[{id}] {value:?}\n"));
                    }
                }
                for &child in &node.children {
                    self.dump_node(output, child, depth + 1);
                }
            }
            None => output.push_str(&format!("{indent}[{id}] (missing)\n")),
        }
    }

    fn free(&mut self, id: NodeId) {
        let children = match self.nodes.get_mut(id).and_then(Option::take) {
            Some(node) => node.children,
            None => return,
        };
        self.vacant.push(id);
        for child in children {
            self.free(child);
        }
    }
}

impl DisplaySurface for MemorySurface {
    fn create_primitive(&mut self, tag: &str) -> NodeId {
        let id = self.insert(MemoryPrimitive::new(PrimitiveKind::Element(tag.to_owned())));
        log::trace!("create <{tag}> as {id}");
        id
    }

    fn create_text_primitive(&mut self) -> NodeId {
        let id = self.insert(MemoryPrimitive::new(PrimitiveKind::Text));
        log::trace!("create text as {id}");
        id
    }

    fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), SurfaceError> {
        log::trace!("set {name}={value} on {node}");
        self.get_mut(node)?
            .properties
            .insert(name.to_owned(), value.clone());
        Ok(())
    }

    fn remove_property(&mut self, node: NodeId, name: &str) -> Result<(), SurfaceError> {
        log::trace!("remove {name} from {node}");
        self.get_mut(node)?.properties.remove(name);
        Ok(())
    }

    fn add_listener(
        &mut self,
        node: NodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), SurfaceError> {
        self.get_mut(node)?
            .listeners
            .entry(event.to_owned())
            .or_default()
            .push(listener.clone());
        Ok(())
    }

    fn remove_listener(
        &mut self,
        node: NodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), SurfaceError> {
        if let Some(registered) = self.get_mut(node)?.listeners.get_mut(event) {
            registered.retain(|existing| existing != listener);
        }
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SurfaceError> {
        match self.get(parent).map(MemoryPrimitive::kind) {
            None => return Err(SurfaceError::Missing { id: parent }),
            Some(PrimitiveKind::Text) => return Err(SurfaceError::TextParent { id: parent }),
            Some(PrimitiveKind::Element(_)) => {}
        }
        let previous_parent = self.get_mut(child)?.parent.replace(parent);
        if let Some(previous) = previous_parent {
            if let Ok(node) = self.get_mut(previous) {
                node.children.retain(|&c| c != child);
            }
        }
        log::trace!("append {child} under {parent}");
        self.get_mut(parent)?.children.push(child);
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SurfaceError> {
        let node = self.get_mut(parent)?;
        let index = node
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(SurfaceError::NotAChild { parent, child })?;
        node.children.remove(index);
        log::trace!("remove {child} from {parent}");
        self.free(child);
        Ok(())
    }

    fn release_primitive(&mut self, node: NodeId) -> Result<(), SurfaceError> {
        let parent = self.get(node).ok_or(SurfaceError::Missing { id: node })?.parent;
        if let Some(parent) = parent {
            if let Ok(owner) = self.get_mut(parent) {
                owner.children.retain(|&c| c != node);
            }
        }
        log::trace!("release {node}");
        self.free(node);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/surface_tests.rs"]
mod tests;
