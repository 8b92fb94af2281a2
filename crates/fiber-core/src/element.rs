//! Immutable tree literals describing a UI.
//!
//! An [`Element`] is pure structure: a type, an ordered property map and
//! child elements. Elements are shared, so cloning one is cheap and the
//! reconciler can keep the literal a render unit was produced from without
//! copying it.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::state::Scope;
use crate::NodeId;

/// Property carrying the text of a text leaf.
pub const TEXT_VALUE_PROP: &str = "nodeValue";

/// Property names starting with this prefix and holding a [`Listener`] are
/// event registrations rather than plain properties.
pub const EVENT_PREFIX: &str = "on";

pub type Props = IndexMap<String, PropValue>;

/// Builds a property map from `(name, value)` pairs.
pub fn props<I, K, V>(entries: I) -> Props
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<PropValue>,
{
    entries
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HostTag {
    Named(String),
    Text,
}

impl HostTag {
    pub fn is_text(&self) -> bool {
        matches!(self, HostTag::Text)
    }
}

impl From<&str> for HostTag {
    fn from(tag: &str) -> Self {
        HostTag::Named(tag.to_owned())
    }
}

impl From<String> for HostTag {
    fn from(tag: String) -> Self {
        HostTag::Named(tag)
    }
}

type RenderFn = dyn Fn(&mut Scope<'_>, &Props) -> Element;

/// Plain function pointer with the component signature.
pub type RenderPtr = fn(&mut Scope<'_>, &Props) -> Element;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Identity {
    /// Function items and closures: each definition is its own type.
    Type(TypeId),
    /// Function pointers all share one type; the address tells them apart.
    Address(usize),
    /// Type-erased callables, equal only to clones of the same literal.
    Instance,
}

impl Identity {
    fn of<F: Any>(render: &F) -> Self {
        let any: &dyn Any = render;
        if let Some(ptr) = any.downcast_ref::<RenderPtr>() {
            Identity::Address(*ptr as usize)
        } else if any.is::<Box<RenderFn>>() || any.is::<&'static RenderFn>() {
            Identity::Instance
        } else {
            Identity::Type(TypeId::of::<F>())
        }
    }
}

/// A function-type node. Identity is the Rust type of the function, so every
/// literal built from the same function item or closure definition has the
/// same type, whatever it captured. Function pointers compare by address and
/// boxed callables by allocation, since their types say nothing about which
/// function they hold.
#[derive(Clone)]
pub struct ComponentFn {
    identity: Identity,
    name: &'static str,
    render: Rc<RenderFn>,
}

impl ComponentFn {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&mut Scope<'_>, &Props) -> Element + 'static,
    {
        Self {
            identity: Identity::of(&render),
            name: std::any::type_name::<F>(),
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn invoke(&self, scope: &mut Scope<'_>, props: &Props) -> Element {
        (self.render)(scope, props)
    }
}

impl PartialEq for ComponentFn {
    fn eq(&self, other: &Self) -> bool {
        match (self.identity, other.identity) {
            (Identity::Instance, Identity::Instance) => Rc::ptr_eq(&self.render, &other.render),
            (lhs, rhs) => lhs == rhs,
        }
    }
}

impl Eq for ComponentFn {}

impl fmt::Debug for ComponentFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentFn").field(&self.name).finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementType {
    Host(HostTag),
    Component(ComponentFn),
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        ElementType::Host(tag.into())
    }
}

impl From<String> for ElementType {
    fn from(tag: String) -> Self {
        ElementType::Host(tag.into())
    }
}

impl From<HostTag> for ElementType {
    fn from(tag: HostTag) -> Self {
        ElementType::Host(tag)
    }
}

impl From<ComponentFn> for ElementType {
    fn from(component: ComponentFn) -> Self {
        ElementType::Component(component)
    }
}

/// Payload handed to listeners when the display surface dispatches an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub target: NodeId,
}

/// Shared event callback. Two listeners are equal only when they are the
/// same allocation.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    pub fn new(callback: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Listener(Listener),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            PropValue::Listener(listener) => Some(listener),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => f.write_str(value),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Listener(listener) => write!(f, "{listener:?}"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<Listener> for PropValue {
    fn from(listener: Listener) -> Self {
        PropValue::Listener(listener)
    }
}

/// Returns the event name for an event-style property, `None` for plain ones.
pub(crate) fn event_name(name: &str, value: &PropValue) -> Option<String> {
    match value {
        PropValue::Listener(_) => name
            .strip_prefix(EVENT_PREFIX)
            .filter(|rest| !rest.is_empty())
            .map(str::to_lowercase),
        _ => None,
    }
}

#[derive(Clone, Debug)]
struct ElementInner {
    ty: ElementType,
    props: Props,
    children: Vec<Element>,
}

#[derive(Clone, Debug)]
pub struct Element {
    inner: Rc<ElementInner>,
}

impl Element {
    fn from_parts(ty: ElementType, props: Props, children: Vec<Element>) -> Self {
        Self {
            inner: Rc::new(ElementInner {
                ty,
                props,
                children,
            }),
        }
    }

    pub fn host(tag: impl Into<HostTag>) -> Self {
        Self::from_parts(ElementType::Host(tag.into()), Props::new(), Vec::new())
    }

    pub fn component<F>(render: F) -> Self
    where
        F: Fn(&mut Scope<'_>, &Props) -> Element + 'static,
    {
        Self::from_parts(
            ElementType::Component(ComponentFn::new(render)),
            Props::new(),
            Vec::new(),
        )
    }

    pub fn ty(&self) -> &ElementType {
        &self.inner.ty
    }

    pub fn props(&self) -> &Props {
        &self.inner.props
    }

    pub fn children(&self) -> &[Element] {
        &self.inner.children
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.inner)
            .props
            .insert(name.into(), value.into());
        self
    }

    /// Registers `callback` under `on<Event>`.
    pub fn on(self, event: &str, callback: impl Fn(&Event) + 'static) -> Self {
        let mut name = String::with_capacity(EVENT_PREFIX.len() + event.len());
        name.push_str(EVENT_PREFIX);
        let mut chars = event.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
        self.prop(name, Listener::new(callback))
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        Rc::make_mut(&mut self.inner)
            .children
            .push(child.into().into_element());
        self
    }

    pub fn children_from<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Child>,
    {
        Rc::make_mut(&mut self.inner)
            .children
            .extend(children.into_iter().map(|c| c.into().into_element()));
        self
    }

    pub fn is_text(&self) -> bool {
        matches!(self.ty(), ElementType::Host(HostTag::Text))
    }

    /// Text of a text leaf, `None` for every other node.
    pub fn text_value(&self) -> Option<&str> {
        if !self.is_text() {
            return None;
        }
        self.props().get(TEXT_VALUE_PROP).and_then(PropValue::as_str)
    }
}

/// A child position in a literal: either a structural node or a raw value
/// that becomes a text leaf.
#[derive(Clone, Debug)]
pub enum Child {
    Element(Element),
    Text(String),
}

impl Child {
    pub fn into_element(self) -> Element {
        match self {
            Child::Element(element) => element,
            Child::Text(value) => text(value),
        }
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Child::Element(element)
    }
}

impl From<&Element> for Child {
    fn from(element: &Element) -> Self {
        Child::Element(element.clone())
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::Text(value.to_owned())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child::Text(value)
    }
}

macro_rules! text_child_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Child {
                fn from(value: $ty) -> Self {
                    Child::Text(value.to_string())
                }
            }
        )*
    };
}

text_child_from!(i32, i64, u32, u64, usize, f64, bool, char);

/// Builds a text leaf carrying `value` as its `nodeValue`.
pub fn text(value: impl Into<String>) -> Element {
    let mut props = Props::with_capacity(1);
    props.insert(TEXT_VALUE_PROP.to_owned(), PropValue::Str(value.into()));
    Element::from_parts(ElementType::Host(HostTag::Text), props, Vec::new())
}

/// Builds an element, wrapping every non-element child into a text leaf.
pub fn create_element<I>(ty: impl Into<ElementType>, props: Props, children: I) -> Element
where
    I: IntoIterator,
    I::Item: Into<Child>,
{
    let children = children
        .into_iter()
        .map(|child| child.into().into_element())
        .collect();
    Element::from_parts(ty.into(), props, children)
}

#[cfg(test)]
#[path = "tests/element_tests.rs"]
mod tests;
