//! Projection of an element's light DOM into component children.

use serde_json::{Map, Value};

use crate::dom::{ElementNode, Node};
use crate::props::to_camel_case;
use crate::value::PropValue;
use crate::vnode::{VElement, VNode};

/// Convert host nodes into output descriptions the component can render.
///
/// Text and comment nodes become text. Elements keep their tag, are keyed by
/// sibling index and get their attributes renamed to prop names.
pub fn parse_children(nodes: &[Node]) -> Vec<VNode> {
    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| parse_child(node, index))
        .collect()
}

fn parse_child(node: &Node, index: usize) -> VNode {
    match node {
        Node::Text(text) | Node::Comment(text) => VNode::Text(text.clone()),
        Node::Element(element) => VNode::Element(parse_element(element, index)),
    }
}

fn parse_element(element: &ElementNode, index: usize) -> VElement {
    let mut velement = VElement::new(element.local_name.clone()).key(index.to_string());

    for (name, value) in &element.attributes {
        let name = prop_name(&element.local_name, name);
        let value = if name == "style" {
            PropValue::Json(parse_style(value))
        } else {
            PropValue::String(value.clone())
        };
        velement.props.insert(name, value);
    }

    velement.children = parse_children(&element.children);
    velement
}

fn prop_name(tag: &str, attribute: &str) -> String {
    let renamed = match (tag, attribute) {
        (_, "class") => "class-name",
        (_, "for") => "html-for",
        (_, "colspan") => "col-span",
        (_, "rowspan") => "row-span",
        ("input", "value") => "default-value",
        ("input", "checked") => "default-checked",
        (_, other) => other,
    };

    if renamed.starts_with("data-") {
        renamed.to_string()
    } else {
        to_camel_case(renamed)
    }
}

/// `"color: red; font-size: 2px"` -> `{"color": "red", "fontSize": "2px"}`.
fn parse_style(text: &str) -> Value {
    let mut styles = Map::new();

    for declaration in text.split(';') {
        let Some((key, value)) = declaration.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        styles.insert(to_camel_case(key), Value::String(value.trim().to_string()));
    }

    Value::Object(styles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_fragment;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn text_and_comments_become_text() {
        let children = parse_children(&parse_fragment("hi<!--note-->"));
        assert_eq!(children, vec![VNode::text("hi"), VNode::text("note")]);
    }

    #[test]
    fn elements_are_keyed_by_sibling_index() {
        let children = parse_children(&parse_fragment("a<b>bold</b><i></i>"));

        assert_eq!(
            children,
            vec![
                VNode::text("a"),
                VNode::Element(VElement::new("b").key("1").child("bold")),
                VNode::Element(VElement::new("i").key("2")),
            ]
        );
    }

    #[test]
    fn renames_attributes_to_props() {
        let children = parse_children(&parse_fragment(
            r#"<label class="big" for="name" aria-label="x" data-test-id="7"></label><td colspan="2" rowspan="3"></td>"#,
        ));

        let VNode::Element(label) = &children[0] else {
            panic!("expected element");
        };
        assert_eq!(label.props.get("className"), Some(&PropValue::from("big")));
        assert_eq!(label.props.get("htmlFor"), Some(&PropValue::from("name")));
        assert_eq!(label.props.get("ariaLabel"), Some(&PropValue::from("x")));
        assert_eq!(label.props.get("data-test-id"), Some(&PropValue::from("7")));

        let VNode::Element(td) = &children[1] else {
            panic!("expected element");
        };
        assert_eq!(td.props.get("colSpan"), Some(&PropValue::from("2")));
        assert_eq!(td.props.get("rowSpan"), Some(&PropValue::from("3")));
    }

    #[test]
    fn input_value_and_checked_become_defaults() {
        let children = parse_children(&parse_fragment(r#"<input value="a" checked><option value="b">"#));

        let VNode::Element(input) = &children[0] else {
            panic!("expected element");
        };
        assert_eq!(input.props.get("defaultValue"), Some(&PropValue::from("a")));
        assert_eq!(input.props.get("defaultChecked"), Some(&PropValue::from("")));

        let VNode::Element(option) = &children[1] else {
            panic!("expected element");
        };
        assert_eq!(option.props.get("value"), Some(&PropValue::from("b")));
    }

    #[test]
    fn style_becomes_camel_cased_object() {
        let children = parse_children(&parse_fragment(
            r#"<div style="color: red; font-size:2px;; background-image: url(a:b)"></div>"#,
        ));

        let VNode::Element(div) = &children[0] else {
            panic!("expected element");
        };
        assert_eq!(
            div.props.get("style"),
            Some(&PropValue::Json(json!({
                "color": "red",
                "fontSize": "2px",
                "backgroundImage": "url(a:b)",
            })))
        );
    }

    #[test]
    fn nested_children_recurse() {
        let children = parse_children(&parse_fragment("<ul><li>one</li><li>two</li></ul>"));

        let VNode::Element(ul) = &children[0] else {
            panic!("expected element");
        };
        assert_eq!(ul.children.len(), 2);
        assert_eq!(
            ul.children[1],
            VNode::Element(VElement::new("li").key("1").child("two"))
        );
    }
}
