//! HTML fragment parsing and serialization for the host model.
//!
//! Parses markup like `<test-el text="hello"><b>hi</b></test-el>` into
//! [`Node`] trees. This is a tolerant fragment parser, not a spec-compliant HTML
//! tokenizer: unmatched closing tags are ignored and unclosed elements are closed
//! at the end of input.

use std::sync::LazyLock;

use regex::Regex;

use crate::dom::{ElementNode, Node};

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

static OPEN_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^<([a-zA-Z][a-zA-Z0-9-]*)((?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*(/?)>"#,
    )
    .expect("Invalid open tag regex")
});

static CLOSE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^</([a-zA-Z][a-zA-Z0-9-]*)\s*>").expect("Invalid close tag regex")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Match: name="value" or name='value' or name=value or name (boolean)
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("Invalid attribute regex")
});

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#(\d+)|#[xX]([0-9a-fA-F]+)|([a-zA-Z]+));").expect("Invalid entity regex")
});

/// Whether `name` is a void element.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Parse an HTML fragment into nodes.
pub fn parse_fragment(markup: &str) -> Vec<Node> {
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<ElementNode> = Vec::new();
    let mut pos = 0;

    while pos < markup.len() {
        let rest = &markup[pos..];

        if let Some(body) = rest.strip_prefix("<!--") {
            let end = body.find("-->").unwrap_or(body.len());
            append(&mut root, &mut stack, Node::Comment(body[..end].to_string()));
            pos += 4 + (end + 3).min(body.len());
            continue;
        }

        if let Some(caps) = CLOSE_TAG_RE.captures(rest) {
            let name = caps[1].to_ascii_lowercase();
            close(&mut root, &mut stack, &name);
            pos += caps[0].len();
            continue;
        }

        if let Some(caps) = OPEN_TAG_RE.captures(rest) {
            let name = caps[1].to_ascii_lowercase();
            let attributes = parse_attributes(caps.get(2).map(|m| m.as_str()).unwrap_or(""));
            let self_closing = !caps[3].is_empty();
            pos += caps[0].len();

            let element = ElementNode {
                local_name: name,
                attributes,
                children: Vec::new(),
            };

            if self_closing || is_void_element(&element.local_name) {
                append(&mut root, &mut stack, Node::Element(element));
            } else {
                stack.push(element);
            }
            continue;
        }

        // Text runs to the next '<' that is not the current character
        let first = rest.chars().next().map(char::len_utf8).unwrap_or(1);
        let end = rest[first..]
            .find('<')
            .map(|i| i + first)
            .unwrap_or(rest.len());
        let text = decode_entities(&rest[..end]);
        if !text.is_empty() {
            append(&mut root, &mut stack, Node::Text(text));
        }
        pos += end;
    }

    while let Some(element) = stack.pop() {
        append(&mut root, &mut stack, Node::Element(element));
    }

    root
}

fn append(root: &mut Vec<Node>, stack: &mut [ElementNode], node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => root.push(node),
    }
}

/// Close the innermost open element named `name`, closing anything opened
/// inside it. Unmatched closing tags are ignored.
fn close(root: &mut Vec<Node>, stack: &mut Vec<ElementNode>, name: &str) {
    if !stack.iter().any(|e| e.local_name == name) {
        return;
    }

    while let Some(element) = stack.pop() {
        let done = element.local_name == name;
        append(root, stack, Node::Element(element));
        if done {
            break;
        }
    }
}

fn parse_attributes(source: &str) -> Vec<(String, String)> {
    let mut attributes: Vec<(String, String)> = Vec::new();

    for caps in ATTR_RE.captures_iter(source) {
        let name = caps[1].to_ascii_lowercase();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| decode_entities(m.as_str()))
            .unwrap_or_default();

        // First occurrence wins
        if !attributes.iter().any(|(n, _)| *n == name) {
            attributes.push((name, value));
        }
    }

    attributes
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let decoded = if let Some(dec) = caps.get(1) {
                dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
            } else if let Some(hex) = caps.get(2) {
                u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
            } else {
                match &caps[3] {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Serialize nodes back to HTML.
pub fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Node::Element(element) => {
            write_open_tag(out, &element.local_name, &element.attributes);
            if is_void_element(&element.local_name) {
                return;
            }
            for child in &element.children {
                write_node(out, child);
            }
            write_close_tag(out, &element.local_name);
        }
    }
}

pub(crate) fn write_open_tag(out: &mut String, name: &str, attributes: &[(String, String)]) {
    out.push('<');
    out.push_str(name);
    for (key, value) in attributes {
        out.push(' ');
        out.push_str(key);
        if !value.is_empty() {
            out.push_str("=\"");
            out.push_str(&escape_attribute(value));
            out.push('"');
        }
    }
    out.push('>');
}

pub(crate) fn write_close_tag(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape attribute values including single quotes.
fn escape_attribute(s: &str) -> String {
    escape_text(s)
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
