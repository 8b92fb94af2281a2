use std::fmt;

use fiber_core::{DisplaySurface, Listener, MemorySurface, NodeId, PropValue, SurfaceError};

/// One call made on a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SurfaceOp {
    Create { id: NodeId, tag: String },
    CreateText { id: NodeId },
    SetProperty { node: NodeId, name: String },
    RemoveProperty { node: NodeId, name: String },
    AddListener { node: NodeId, event: String },
    RemoveListener { node: NodeId, event: String },
    AppendChild { parent: NodeId, child: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
    Release { id: NodeId },
}

impl SurfaceOp {
    pub fn is_creation(&self) -> bool {
        matches!(self, SurfaceOp::Create { .. } | SurfaceOp::CreateText { .. })
    }
}

impl fmt::Display for SurfaceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceOp::Create { id, tag } => write!(f, "create <{tag}> as {id}"),
            SurfaceOp::CreateText { id } => write!(f, "create text as {id}"),
            SurfaceOp::SetProperty { node, name } => write!(f, "set {name} on {node}"),
            SurfaceOp::RemoveProperty { node, name } => write!(f, "reset {name} on {node}"),
            SurfaceOp::AddListener { node, event } => write!(f, "listen {event} on {node}"),
            SurfaceOp::RemoveListener { node, event } => write!(f, "unlisten {event} on {node}"),
            SurfaceOp::AppendChild { parent, child } => write!(f, "append {child} to {parent}"),
            SurfaceOp::RemoveChild { parent, child } => write!(f, "remove {child} from {parent}"),
            SurfaceOp::Release { id } => write!(f, "release {id}"),
        }
    }
}

/// [`MemorySurface`] that also keeps a log of every call it receives.
///
/// Failed calls are not logged.
#[derive(Default)]
pub struct RecordingSurface {
    inner: MemorySurface,
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Returns the log so far and starts a new one.
    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn count(&self, predicate: impl Fn(&SurfaceOp) -> bool) -> usize {
        self.ops.iter().filter(|op| predicate(op)).count()
    }

    pub fn creations(&self) -> usize {
        self.count(SurfaceOp::is_creation)
    }

    pub fn property_sets(&self) -> usize {
        self.count(|op| matches!(op, SurfaceOp::SetProperty { .. }))
    }

    pub fn removals(&self) -> usize {
        self.count(|op| matches!(op, SurfaceOp::RemoveChild { .. }))
    }

    pub fn releases(&self) -> usize {
        self.count(|op| matches!(op, SurfaceOp::Release { .. }))
    }

    pub fn appends(&self) -> usize {
        self.count(|op| matches!(op, SurfaceOp::AppendChild { .. }))
    }

    pub fn inner(&self) -> &MemorySurface {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut MemorySurface {
        &mut self.inner
    }

    fn record<T>(
        &mut self,
        result: Result<T, SurfaceError>,
        op: SurfaceOp,
    ) -> Result<T, SurfaceError> {
        if result.is_ok() {
            self.ops.push(op);
        }
        result
    }
}

impl DisplaySurface for RecordingSurface {
    fn create_primitive(&mut self, tag: &str) -> NodeId {
        let id = self.inner.create_primitive(tag);
        self.ops.push(SurfaceOp::Create {
            id,
            tag: tag.to_owned(),
        });
        id
    }

    fn create_text_primitive(&mut self) -> NodeId {
        let id = self.inner.create_text_primitive();
        self.ops.push(SurfaceOp::CreateText { id });
        id
    }

    fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), SurfaceError> {
        let result = self.inner.set_property(node, name, value);
        self.record(
            result,
            SurfaceOp::SetProperty {
                node,
                name: name.to_owned(),
            },
        )
    }

    fn remove_property(&mut self, node: NodeId, name: &str) -> Result<(), SurfaceError> {
        let result = self.inner.remove_property(node, name);
        self.record(
            result,
            SurfaceOp::RemoveProperty {
                node,
                name: name.to_owned(),
            },
        )
    }

    fn add_listener(
        &mut self,
        node: NodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), SurfaceError> {
        let result = self.inner.add_listener(node, event, listener);
        self.record(
            result,
            SurfaceOp::AddListener {
                node,
                event: event.to_owned(),
            },
        )
    }

    fn remove_listener(
        &mut self,
        node: NodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), SurfaceError> {
        let result = self.inner.remove_listener(node, event, listener);
        self.record(
            result,
            SurfaceOp::RemoveListener {
                node,
                event: event.to_owned(),
            },
        )
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SurfaceError> {
        let result = self.inner.append_child(parent, child);
        self.record(result, SurfaceOp::AppendChild { parent, child })
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SurfaceError> {
        let result = self.inner.remove_child(parent, child);
        self.record(result, SurfaceOp::RemoveChild { parent, child })
    }

    fn release_primitive(&mut self, node: NodeId) -> Result<(), SurfaceError> {
        let result = self.inner.release_primitive(node);
        self.record(result, SurfaceOp::Release { id: node })
    }
}
