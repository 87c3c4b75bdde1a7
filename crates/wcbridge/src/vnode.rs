//! Output descriptions produced by components and by the children parser.

use std::collections::BTreeMap;

use crate::value::PropValue;

/// A node in a component's output description.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum VNode {
    /// Renders nothing
    #[default]
    Empty,
    Text(String),
    Element(VElement),
    Fragment(Vec<VNode>),
}

impl VNode {
    pub fn text(text: impl Into<String>) -> Self {
        VNode::Text(text.into())
    }

    pub fn element(tag: impl Into<String>) -> VElement {
        VElement::new(tag)
    }
}

impl From<VElement> for VNode {
    fn from(value: VElement) -> Self {
        VNode::Element(value)
    }
}

impl From<&str> for VNode {
    fn from(value: &str) -> Self {
        VNode::Text(value.to_string())
    }
}

impl From<String> for VNode {
    fn from(value: String) -> Self {
        VNode::Text(value)
    }
}

/// An element description with typed props.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VElement {
    /// Tag name (e.g., "button")
    pub tag: String,

    /// Sibling key
    pub key: Option<String>,

    /// Props by name
    pub props: BTreeMap<String, PropValue>,

    pub children: Vec<VNode>,
}

impl VElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = VNode>,
    {
        self.children.extend(children);
        self
    }
}
