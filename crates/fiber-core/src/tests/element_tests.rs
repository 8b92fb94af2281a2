use super::*;

fn label(_scope: &mut Scope<'_>, props: &Props) -> Element {
    let value = props
        .get("text")
        .map(ToString::to_string)
        .unwrap_or_default();
    text(value)
}

#[test]
fn create_element_wraps_raw_children_into_text_leaves() {
    let element = create_element("p", Props::new(), ["1"]);

    assert_eq!(element.ty(), &ElementType::Host(HostTag::from("p")));
    assert_eq!(element.children().len(), 1);
    let leaf = &element.children()[0];
    assert!(leaf.is_text());
    assert_eq!(leaf.text_value(), Some("1"));
    assert!(leaf.children().is_empty());
}

#[test]
fn create_element_keeps_structural_children_and_their_order() {
    let span = Element::host("span");
    let element = create_element(
        "div",
        props([("id", "root")]),
        vec![Child::from(&span), Child::from(42), Child::from("tail")],
    );

    let children = element.children();
    assert_eq!(children.len(), 3);
    assert_eq!(children[0].ty(), span.ty());
    assert_eq!(children[1].text_value(), Some("42"));
    assert_eq!(children[2].text_value(), Some("tail"));
    assert_eq!(element.props().get("id"), Some(&PropValue::from("root")));
}

#[test]
fn builder_methods_do_not_touch_shared_literals() {
    let base = Element::host("div").prop("class", "a");
    let extended = base.clone().prop("class", "b").child("x");

    assert_eq!(base.props().get("class"), Some(&PropValue::from("a")));
    assert!(base.children().is_empty());
    assert_eq!(extended.props().get("class"), Some(&PropValue::from("b")));
    assert_eq!(extended.children().len(), 1);
}

#[test]
fn component_identity_follows_the_function_not_the_literal() {
    let first = Element::component(label).prop("text", "a");
    let second = Element::component(label).prop("text", "b");
    let other = Element::component(|_scope, _props| text("other"));

    assert_eq!(first.ty(), second.ty());
    assert_ne!(first.ty(), other.ty());
    assert_ne!(first.ty(), &ElementType::from("label"));
}

fn heading(_scope: &mut Scope<'_>, _props: &Props) -> Element {
    Element::host("h1")
}

#[test]
fn function_pointers_compare_by_address() {
    let pointers: [RenderPtr; 2] = [label, heading];
    let first = Element::component(pointers[0]);
    let second = Element::component(pointers[1]);
    let again = Element::component(pointers[0]);

    assert_ne!(first.ty(), second.ty());
    assert_eq!(first.ty(), again.ty());
    assert_ne!(first.ty(), Element::component(label).ty());
}

#[test]
fn boxed_components_compare_by_allocation() {
    let boxed = |value: &'static str| -> Box<RenderFn> {
        Box::new(move |_scope: &mut Scope<'_>, _props: &Props| text(value))
    };
    let first = Element::component(boxed("a"));
    let second = Element::component(boxed("a"));

    assert_eq!(first.ty(), first.clone().prop("x", 1).ty());
    assert_ne!(first.ty(), second.ty());
}

#[test]
fn on_registers_listener_under_prefixed_name() {
    let element = Element::host("button").on("click", |_| {});

    let value = element.props().get("onClick").expect("listener prop");
    assert!(value.as_listener().is_some());
    assert_eq!(event_name("onClick", value).as_deref(), Some("click"));
    assert_eq!(event_name("onClick", &PropValue::from("x")), None);
    assert_eq!(event_name("on", value), None);
}

#[test]
fn listeners_compare_by_identity() {
    let listener = Listener::new(|_| {});
    let same = listener.clone();
    let different = Listener::new(|_| {});

    assert_eq!(listener, same);
    assert_ne!(listener, different);
}
