//! The wrapped component and the props it renders from.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::dom::Container;
use crate::value::PropValue;
use crate::vnode::VNode;

type RenderFn = dyn Fn(&Props) -> VNode;

/// An opaque component: a callable mapping props to an output description,
/// with an optional declared-props registry.
#[derive(Clone)]
pub struct Component {
    name: Rc<str>,
    render: Rc<RenderFn>,
    declared_props: Option<Vec<String>>,
}

impl Component {
    pub fn new<F>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&Props) -> VNode + 'static,
    {
        Self {
            name: Rc::from(name.into()),
            render: Rc::new(render),
            declared_props: None,
        }
    }

    /// Attach the component's own declared prop names, used when an element is
    /// created without configured props.
    pub fn with_declared_props<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_props = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_props(&self) -> Option<&[String]> {
        self.declared_props.as_deref()
    }

    pub fn render(&self, props: &Props) -> VNode {
        (self.render)(props)
    }

    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("declared_props", &self.declared_props)
            .finish()
    }
}

/// Input for one render: typed prop values, projected children and the
/// container the element renders into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    values: BTreeMap<String, PropValue>,
    children: Vec<VNode>,
    container: Option<Container>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    /// Cloned value, `Undefined` when unset.
    pub fn value(&self, name: &str) -> PropValue {
        self.values.get(name).cloned().unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn children(&self) -> &[VNode] {
        &self.children
    }

    pub fn set_children(&mut self, children: Vec<VNode>) {
        self.children = children;
    }

    /// The element's render target: its shadow root or the element itself.
    pub fn container(&self) -> Option<&Container> {
        self.container.as_ref()
    }

    pub fn set_container(&mut self, container: Container) {
        self.container = Some(container);
    }
}
