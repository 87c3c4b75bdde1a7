//! Markup renderer for wcbridge elements.
//!
//! Calls the wrapped component and writes its output description into the
//! element's container as host nodes. Props become attributes the way markup
//! expects them: `className` as `class`, booleans as presence attributes, JSON
//! as encoded text and `style` objects as CSS declarations. Callables and refs
//! have no markup form and are left out.

use serde_json::Value;
use wcbridge::{
    format_number, serialize, to_dashed_case, Component, Container, ElementNode, Node, PropValue,
    Props, RenderContext, RenderError, Renderer, VElement, VNode,
};

/// Renders components into host nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupRenderer;

impl MarkupRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// What [`MarkupRenderer::mount`] hands back to the element.
#[derive(Debug)]
struct MarkupContext {
    container: Container,
    component: Component,
}

impl MarkupContext {
    fn render(&self, props: &Props) {
        // The component may call back into the element; render before touching
        // the container.
        let nodes = to_nodes(&self.component.render(props));
        self.container.set_children(nodes);
    }
}

fn foreign_context() -> RenderError {
    RenderError::Failed("render context was not created by MarkupRenderer".to_string())
}

impl Renderer for MarkupRenderer {
    fn mount(
        &self,
        container: &Container,
        component: &Component,
        props: &Props,
    ) -> Result<RenderContext, RenderError> {
        tracing::debug!(component = component.name(), "Mounting markup");

        let context = MarkupContext {
            container: container.clone(),
            component: component.clone(),
        };
        context.render(props);
        Ok(RenderContext::new(context))
    }

    fn update(&self, context: &mut RenderContext, props: &Props) -> Result<(), RenderError> {
        let context = context
            .downcast_ref::<MarkupContext>()
            .ok_or_else(foreign_context)?;

        tracing::debug!(component = context.component.name(), "Updating markup");
        context.render(props);
        Ok(())
    }

    fn unmount(&self, context: RenderContext) -> Result<(), RenderError> {
        let context = context
            .into_inner::<MarkupContext>()
            .map_err(|_| foreign_context())?;

        tracing::debug!(component = context.component.name(), "Unmounting markup");
        context.container.clear();
        Ok(())
    }
}

/// Render an output description straight to HTML.
pub fn render_to_string(vnode: &VNode) -> String {
    serialize(&to_nodes(vnode))
}

/// Convert an output description into host nodes. Fragments are flattened.
pub fn to_nodes(vnode: &VNode) -> Vec<Node> {
    match vnode {
        VNode::Empty => Vec::new(),
        VNode::Text(text) => vec![Node::Text(text.clone())],
        VNode::Fragment(children) => children.iter().flat_map(to_nodes).collect(),
        VNode::Element(element) => vec![Node::Element(to_element(element))],
    }
}

fn to_element(velement: &VElement) -> ElementNode {
    let mut element = ElementNode::new(velement.tag.clone());

    for (name, value) in &velement.props {
        if let Some(text) = attribute_value(name, value) {
            element.attributes.push((attribute_name(name), text));
        }
    }

    element.children = velement.children.iter().flat_map(to_nodes).collect();
    element
}

/// Prop name to attribute name: `className` -> `class`, `ariaLabel` ->
/// `aria-label`. Dashed names pass through.
fn attribute_name(prop: &str) -> String {
    match prop {
        "className" => "class".to_string(),
        "htmlFor" => "for".to_string(),
        "defaultValue" => "value".to_string(),
        "defaultChecked" => "checked".to_string(),
        "colSpan" | "rowSpan" | "tabIndex" | "readOnly" | "maxLength" => prop.to_lowercase(),
        other => to_dashed_case(other),
    }
}

/// Attribute text for a prop value. `None` leaves the attribute out.
fn attribute_value(name: &str, value: &PropValue) -> Option<String> {
    match value {
        PropValue::String(s) => Some(s.clone()),
        PropValue::Number(n) => Some(format_number(*n)),
        PropValue::Boolean(true) => Some(String::new()),
        PropValue::Boolean(false) => None,
        PropValue::Json(Value::Object(map)) if name == "style" => Some(
            map.iter()
                .map(|(key, value)| format!("{}: {}", to_dashed_case(key), json_text(value)))
                .collect::<Vec<_>>()
                .join("; "),
        ),
        PropValue::Json(Value::Null) => None,
        PropValue::Json(value) => Some(json_text(value)),
        PropValue::Undefined | PropValue::Function(_) | PropValue::Ref(_) => None,
    }
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
