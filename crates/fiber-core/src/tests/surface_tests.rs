use super::*;
use std::cell::Cell;
use std::rc::Rc;

use crate::element::{props, text, Element};

/// Surface that only writes down what it was asked to do.
#[derive(Default)]
struct OpLog {
    ops: Vec<String>,
    next: NodeId,
}

impl DisplaySurface for OpLog {
    fn create_primitive(&mut self, tag: &str) -> NodeId {
        self.ops.push(format!("create {tag}"));
        self.next += 1;
        self.next
    }

    fn create_text_primitive(&mut self) -> NodeId {
        self.ops.push("create text".to_owned());
        self.next += 1;
        self.next
    }

    fn set_property(
        &mut self,
        _node: NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), SurfaceError> {
        self.ops.push(format!("set {name}={value}"));
        Ok(())
    }

    fn remove_property(&mut self, _node: NodeId, name: &str) -> Result<(), SurfaceError> {
        self.ops.push(format!("reset {name}"));
        Ok(())
    }

    fn add_listener(
        &mut self,
        _node: NodeId,
        event: &str,
        _listener: &Listener,
    ) -> Result<(), SurfaceError> {
        self.ops.push(format!("listen {event}"));
        Ok(())
    }

    fn remove_listener(
        &mut self,
        _node: NodeId,
        event: &str,
        _listener: &Listener,
    ) -> Result<(), SurfaceError> {
        self.ops.push(format!("unlisten {event}"));
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SurfaceError> {
        self.ops.push(format!("append {child}->{parent}"));
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SurfaceError> {
        self.ops.push(format!("remove {child}-x{parent}"));
        Ok(())
    }

    fn release_primitive(&mut self, node: NodeId) -> Result<(), SurfaceError> {
        self.ops.push(format!("release {node}"));
        Ok(())
    }
}

#[test]
fn materialize_text_uses_text_path_and_sets_node_value() {
    let mut surface = OpLog::default();
    let leaf = text("hello");
    let tag = HostTag::Text;

    materialize(&mut surface, &tag, leaf.props()).expect("materialize");

    assert_eq!(surface.ops, vec!["create text", "set nodeValue=hello"]);
}

#[test]
fn identical_properties_produce_no_operations() {
    let mut surface = OpLog::default();
    let element = Element::host("div").prop("id", "a").on("click", |_| {});

    apply_delta(&mut surface, 1, element.props(), element.props()).expect("delta");

    assert!(surface.ops.is_empty());
}

#[test]
fn delta_removes_before_it_adds() {
    let mut surface = OpLog::default();
    let mut old = props([("id", PropValue::from("a")), ("title", PropValue::from("t"))]);
    old.insert("onClick".into(), Listener::new(|_| {}).into());
    let mut new = props([("id", PropValue::from("b")), ("lang", PropValue::from("en"))]);
    new.insert("onClick".into(), Listener::new(|_| {}).into());

    apply_delta(&mut surface, 1, &old, &new).expect("delta");

    assert_eq!(
        surface.ops,
        vec![
            "unlisten click",
            "reset title",
            "set id=b",
            "set lang=en",
            "listen click",
        ]
    );
}

#[test]
fn memory_surface_removal_frees_whole_subtree() {
    let mut surface = MemorySurface::new();
    let root = surface.create_primitive("root");
    let div = surface.create_primitive("div");
    let leaf = surface.create_text_primitive();
    surface.append_child(div, leaf).expect("append leaf");
    surface.append_child(root, div).expect("append div");
    assert_eq!(surface.descendant_count(root), 2);

    surface.remove_child(root, div).expect("remove div");

    assert_eq!(surface.len(), 1);
    assert!(surface.get(div).is_none());
    assert!(surface.get(leaf).is_none());
    assert_eq!(surface.descendant_count(root), 0);
}

#[test]
fn memory_surface_rejects_bad_structure() {
    let mut surface = MemorySurface::new();
    let root = surface.create_primitive("root");
    let other = surface.create_primitive("div");
    let leaf = surface.create_text_primitive();

    assert_eq!(
        surface.remove_child(root, other),
        Err(SurfaceError::NotAChild {
            parent: root,
            child: other
        })
    );
    assert_eq!(
        surface.append_child(leaf, other),
        Err(SurfaceError::TextParent { id: leaf })
    );
    assert_eq!(
        surface.append_child(99, other),
        Err(SurfaceError::Missing { id: 99 })
    );
    assert!(surface.get(other).and_then(MemoryPrimitive::parent).is_none());
}

#[test]
fn memory_surface_dispatches_to_registered_listeners() {
    let mut surface = MemorySurface::new();
    let button = surface.create_primitive("button");
    let clicks = Rc::new(Cell::new(0));
    let listener = {
        let clicks = clicks.clone();
        Listener::new(move |event| {
            assert_eq!(event.name, "click");
            clicks.set(clicks.get() + 1);
        })
    };
    surface
        .add_listener(button, "click", &listener)
        .expect("listen");

    assert_eq!(surface.dispatch(button, "click"), Ok(1));
    surface
        .remove_listener(button, "click", &listener)
        .expect("unlisten");
    assert_eq!(surface.dispatch(button, "click"), Ok(0));
    assert_eq!(clicks.get(), 1);
}

#[test]
fn dump_tree_lists_tags_and_text() {
    let mut surface = MemorySurface::new();
    let root = surface.create_primitive("root");
    let p = surface.create_primitive("p");
    let leaf = surface.create_text_primitive();
    surface
        .set_property(leaf, "nodeValue", &PropValue::from("hi"))
        .expect("set");
    surface.append_child(p, leaf).expect("append");
    surface.append_child(root, p).expect("append");

    let dump = surface.dump_tree(Some(root));

    assert_eq!(dump, "[0] <root>\n  [1] <p>\n    [2] \"hi\"\n");
    assert_eq!(surface.text_content(root), "hi");
    assert_eq!(surface.find_by_tag(root, "p"), Some(p));
}

#[test]
fn switching_between_plain_value_and_listener_clears_the_old_role() {
    let mut surface = OpLog::default();
    let plain = props([("onClick", "legacy")]);
    let mut listening = Props::new();
    listening.insert("onClick".into(), Listener::new(|_| {}).into());

    apply_delta(&mut surface, 1, &plain, &listening).expect("to listener");
    apply_delta(&mut surface, 1, &listening, &plain).expect("to plain");

    assert_eq!(
        surface.ops,
        vec![
            "reset onClick",
            "listen click",
            "unlisten click",
            "set onClick=legacy",
        ]
    );
}

#[test]
fn memory_surface_keeps_no_stale_value_next_to_a_new_listener() {
    let mut surface = MemorySurface::new();
    let button = materialize(
        &mut surface,
        &HostTag::from("button"),
        &props([("onClick", "legacy")]),
    )
    .expect("materialize");
    let old = props([("onClick", "legacy")]);
    let new = Element::host("button").on("click", |_| {});

    apply_delta(&mut surface, button, &old, new.props()).expect("delta");

    let node = surface.get(button).expect("button");
    assert_eq!(node.property("onClick"), None);
    assert_eq!(node.listener_count("click"), 1);
}

#[test]
fn released_primitives_free_their_slot_for_reuse() {
    let mut surface = MemorySurface::new();
    let root = surface.create_primitive("root");
    let detached = surface.create_primitive("div");
    let attached = surface.create_text_primitive();
    surface.append_child(root, attached).expect("append");

    surface.release_primitive(detached).expect("release detached");
    surface.release_primitive(attached).expect("release attached");

    assert_eq!(surface.len(), 1);
    assert!(surface.children(root).is_empty());
    assert_eq!(
        surface.release_primitive(detached),
        Err(SurfaceError::Missing { id: detached })
    );
    let reused = surface.create_primitive("span");
    assert!(reused == detached || reused == attached);
    assert_eq!(surface.capacity(), 3);
}
