//! Single-threaded host model standing in for the platform.
//!
//! Plain nodes, render containers, a custom element registry and a document
//! that upgrades registered tags and drives their lifecycle callbacks.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::element::{Element, ElementClass, ElementError};
use crate::html;
use crate::options::{ConfigError, ShadowMode};

/// A plain host node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(ElementNode),
    Text(String),
    Comment(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Concatenated text of this node and its descendants, comments excluded.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.clone(),
            Node::Comment(_) => String::new(),
            Node::Element(e) => e.children.iter().map(Node::text_content).collect(),
        }
    }
}

impl From<ElementNode> for Node {
    fn from(value: ElementNode) -> Self {
        Node::Element(value)
    }
}

/// A plain element with ordered attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementNode {
    /// Lowercase tag name
    pub local_name: String,

    pub attributes: Vec<(String, String)>,

    pub children: Vec<Node>,
}

impl ElementNode {
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Where a container lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// The element's own child list
    Light,
    /// An attached shadow subtree
    Shadow(ShadowMode),
    /// Not attached to any element
    Detached,
}

/// A render target handed to [`crate::Renderer::mount`].
///
/// Cloning shares the underlying child list.
#[derive(Clone)]
pub struct Container {
    kind: ContainerKind,
    nodes: Rc<RefCell<Vec<Node>>>,
}

impl Container {
    pub(crate) fn light(nodes: Rc<RefCell<Vec<Node>>>) -> Self {
        Self {
            kind: ContainerKind::Light,
            nodes,
        }
    }

    pub(crate) fn shadow(mode: ShadowMode) -> Self {
        Self {
            kind: ContainerKind::Shadow(mode),
            nodes: Rc::default(),
        }
    }

    /// A standalone container, useful for rendering outside any element.
    pub fn detached() -> Self {
        Self {
            kind: ContainerKind::Detached,
            nodes: Rc::default(),
        }
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn is_shadow(&self) -> bool {
        matches!(self.kind, ContainerKind::Shadow(_))
    }

    pub fn children(&self) -> Vec<Node> {
        self.nodes.borrow().clone()
    }

    pub fn set_children(&self, nodes: Vec<Node>) {
        *self.nodes.borrow_mut() = nodes;
    }

    pub fn append(&self, node: Node) {
        self.nodes.borrow_mut().push(node);
    }

    pub fn clear(&self) {
        self.nodes.borrow_mut().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    pub fn inner_html(&self) -> String {
        html::serialize(&self.nodes.borrow())
    }

    pub fn text_content(&self) -> String {
        self.nodes.borrow().iter().map(Node::text_content).collect()
    }

    pub fn ptr_eq(&self, other: &Container) -> bool {
        Rc::ptr_eq(&self.nodes, &other.nodes)
    }
}

/// Containers are equal when they share the same child list.
impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.ptr_eq(other)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("kind", &self.kind)
            .field("children", &self.nodes.borrow().len())
            .finish()
    }
}

/// Registered custom element classes by tag name.
#[derive(Default)]
pub struct CustomElementRegistry {
    definitions: RefCell<BTreeMap<String, Rc<ElementClass>>>,
}

impl CustomElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a tag. Fails on invalid names and on redefinition.
    pub fn define(&self, tag: &str, class: Rc<ElementClass>) -> Result<(), ConfigError> {
        if !Self::is_valid_name(tag) {
            return Err(ConfigError::InvalidTagName(tag.to_string()));
        }

        let mut definitions = self.definitions.borrow_mut();
        if definitions.contains_key(tag) {
            return Err(ConfigError::AlreadyDefined(tag.to_string()));
        }

        tracing::debug!(
            tag,
            component = class.component().name(),
            "Defined custom element"
        );
        definitions.insert(tag.to_string(), class);
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<Rc<ElementClass>> {
        self.definitions.borrow().get(tag).cloned()
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.definitions.borrow().contains_key(tag)
    }

    /// Get all defined tag names.
    pub fn names(&self) -> Vec<String> {
        self.definitions.borrow().keys().cloned().collect()
    }

    /// Custom element names start with a lowercase ASCII letter, contain a
    /// hyphen and have no uppercase letters.
    pub fn is_valid_name(tag: &str) -> bool {
        tag.starts_with(|c: char| c.is_ascii_lowercase())
            && tag.contains('-')
            && tag
                .chars()
                .all(|c| !c.is_ascii_uppercase() && !c.is_whitespace() && c != '/' && c != '>')
    }
}

impl fmt::Debug for CustomElementRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomElementRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[derive(Debug, Clone)]
enum BodyNode {
    Custom(Element),
    Plain(Node),
}

/// A document with a flat body. Top-level custom elements are connected while
/// they are in the body.
#[derive(Debug, Default)]
pub struct Document {
    registry: CustomElementRegistry,
    body: RefCell<Vec<BodyNode>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn custom_elements(&self) -> &CustomElementRegistry {
        &self.registry
    }

    /// Create (but do not connect) an element of a defined tag.
    pub fn create_element(&self, tag: &str) -> Result<Element, ElementError> {
        let class = self
            .registry
            .get(tag)
            .ok_or_else(|| ElementError::UnknownElement(tag.to_string()))?;
        Element::construct(&class, tag, Vec::new(), Vec::new())
    }

    /// Append an element to the body and connect it. Appending an element that
    /// is already in the body moves it to the end.
    pub fn append(&self, element: &Element) -> Result<(), ElementError> {
        self.remove(element)?;
        self.body.borrow_mut().push(BodyNode::Custom(element.clone()));
        element.connected_callback()
    }

    /// Remove an element from the body and disconnect it. Returns whether it
    /// was in the body.
    pub fn remove(&self, element: &Element) -> Result<bool, ElementError> {
        let removed = {
            let mut body = self.body.borrow_mut();
            let position = body
                .iter()
                .position(|n| matches!(n, BodyNode::Custom(e) if e.ptr_eq(element)));
            position.map(|i| body.remove(i))
        };

        match removed {
            Some(_) => {
                element.disconnected_callback()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replace the body with parsed markup. Previous custom elements are
    /// disconnected; registered top-level tags are upgraded and connected in
    /// document order.
    ///
    /// A failing element does not stop the others. An element that fails to
    /// upgrade stays in the body as plain markup. The first error is returned
    /// once the whole body has been processed.
    pub fn set_body_html(&self, markup: &str) -> Result<(), ElementError> {
        let mut first_error: Option<ElementError> = None;

        let previous = std::mem::take(&mut *self.body.borrow_mut());
        for node in previous {
            if let BodyNode::Custom(element) = node {
                if let Err(e) = element.disconnected_callback() {
                    tracing::warn!(element = element.local_name(), error = %e, "Failed to disconnect element");
                    first_error = first_error.or(Some(e));
                }
            }
        }

        for node in html::parse_fragment(markup) {
            let class = node
                .as_element()
                .and_then(|e| self.registry.get(&e.local_name));

            match (node, class) {
                (Node::Element(e), Some(class)) => {
                    let constructed = Element::construct(
                        &class,
                        &e.local_name,
                        e.attributes.clone(),
                        e.children.clone(),
                    );

                    match constructed {
                        Ok(element) => {
                            self.body.borrow_mut().push(BodyNode::Custom(element.clone()));
                            if let Err(err) = element.connected_callback() {
                                tracing::warn!(element = %e.local_name, error = %err, "Failed to connect element");
                                first_error = first_error.or(Some(err));
                            }
                        }
                        Err(err) => {
                            tracing::warn!(element = %e.local_name, error = %err, "Failed to upgrade element; keeping plain markup");
                            self.body.borrow_mut().push(BodyNode::Plain(Node::Element(e)));
                            first_error = first_error.or(Some(err));
                        }
                    }
                }
                (node, _) => self.body.borrow_mut().push(BodyNode::Plain(node)),
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// First custom element in the body with this tag.
    pub fn query_selector(&self, tag: &str) -> Option<Element> {
        self.query_selector_all(tag).into_iter().next()
    }

    /// All custom elements in the body with this tag.
    pub fn query_selector_all(&self, tag: &str) -> Vec<Element> {
        self.body
            .borrow()
            .iter()
            .filter_map(|n| match n {
                BodyNode::Custom(e) if e.local_name() == tag => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    /// Serialize the body. Custom elements serialize their light DOM.
    pub fn body_html(&self) -> String {
        let body = self.body.borrow().clone();
        body.iter()
            .map(|n| match n {
                BodyNode::Custom(e) => e.outer_html(),
                BodyNode::Plain(node) => html::serialize(std::slice::from_ref(node)),
            })
            .collect()
    }
}
