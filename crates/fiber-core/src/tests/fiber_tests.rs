use super::*;
use crate::element::{text, Element};

/// root
///   div
///     a
///     b
///   p
fn sample_tree() -> (FiberTree, [UnitKey; 4]) {
    let mut tree = FiberTree::new_root(Element::host("app"), 0, None);
    let root = tree.root();
    let div = tree.insert(RenderUnit::placement(Element::host("div"), root));
    let a = tree.insert(RenderUnit::placement(text("a"), div));
    let b = tree.insert(RenderUnit::placement(text("b"), div));
    let p = tree.insert(RenderUnit::placement(Element::host("p"), root));
    tree.unit_mut(root).unwrap().first_child = Some(div);
    tree.unit_mut(div).unwrap().first_child = Some(a);
    tree.unit_mut(div).unwrap().next_sibling = Some(p);
    tree.unit_mut(a).unwrap().next_sibling = Some(b);
    (tree, [div, a, b, p])
}

#[test]
fn traversal_visits_children_before_siblings() {
    let (tree, [div, a, b, p]) = sample_tree();

    let order: Vec<UnitKey> = tree.preorder().collect();

    assert_eq!(order, vec![tree.root(), div, a, b, p]);
    assert_eq!(tree.next_in_order(b), Some(p));
    assert_eq!(tree.next_in_order(p), None);
}

#[test]
fn children_iterates_sibling_chain() {
    let (tree, [div, a, b, p]) = sample_tree();

    assert_eq!(tree.children(tree.root()).collect::<Vec<_>>(), vec![div, p]);
    assert_eq!(tree.children(div).collect::<Vec<_>>(), vec![a, b]);
    assert_eq!(tree.children(a).count(), 0);
}

#[test]
fn nearest_host_ancestor_skips_handle_less_units() {
    let (mut tree, [div, a, _, _]) = sample_tree();

    assert_eq!(tree.nearest_host_ancestor(div), Some(0));
    assert_eq!(tree.nearest_host_ancestor(a), Some(0));

    tree.unit_mut(div).unwrap().handle = Some(7);
    assert_eq!(tree.nearest_host_ancestor(a), Some(7));
    assert_eq!(tree.container(), Some(0));
}

#[test]
fn unit_types_pair_only_with_matching_literals() {
    let div = UnitType::from(Element::host("div").ty());

    assert!(div.matches(Element::host("div").ty()));
    assert!(!div.matches(Element::host("span").ty()));
    assert!(!div.matches(text("div").ty()));
    assert!(!UnitType::Root.matches(Element::host(ROOT_TAG).ty()));
}

#[test]
fn settle_clears_pass_bookkeeping() {
    let (mut tree, [div, ..]) = sample_tree();
    tree.unit_mut(div).unwrap().alternate = Some(div);

    tree.settle();

    for key in tree.preorder() {
        let unit = tree.get(key).unwrap();
        assert_eq!(unit.effect(), EffectTag::None);
        assert_eq!(unit.alternate(), None);
    }
}

#[test]
fn root_wraps_rendered_element() {
    let tree = FiberTree::new_root(Element::host("app"), 3, None);
    let root = tree.get(tree.root()).unwrap();

    assert_eq!(root.unit_type(), &UnitType::Root);
    assert_eq!(root.handle(), Some(3));
    assert_eq!(root.element().children().len(), 1);
    assert_eq!(tree.len(), 1);
    assert!(tree.dump().starts_with("root None"));
}
