//! Type transform registry.
//!
//! A fixed table mapping each prop type to a `parse` function (attribute text to
//! typed value) and an optional `stringify` function (typed value back to
//! attribute text). For canonical values `parse(stringify(v))` gives back `v`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::globals;
use crate::value::{Callable, PropValue};

/// Logical type of a declared prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropType {
    String,
    Number,
    Boolean,
    Function,
    Json,
    /// Not attribute-backed; a fresh reference cell per element
    Ref,
}

impl PropType {
    pub fn name(self) -> &'static str {
        match self {
            PropType::String => "string",
            PropType::Number => "number",
            PropType::Boolean => "boolean",
            PropType::Function => "function",
            PropType::Json => "json",
            PropType::Ref => "ref",
        }
    }

    /// Look up the transform pair for this type. `ref` has none.
    pub fn transform(self) -> Option<&'static Transform> {
        match self {
            PropType::String => Some(&STRING),
            PropType::Number => Some(&NUMBER),
            PropType::Boolean => Some(&BOOLEAN),
            PropType::Function => Some(&FUNCTION),
            PropType::Json => Some(&JSON),
            PropType::Ref => None,
        }
    }
}

/// How `boolean` props read attribute text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanMode {
    /// Leading `t`, `y` or `1`-`9` (any case) is true.
    #[default]
    Legacy,
    /// `""`, `"true"` and the attribute's own name are true.
    Explicit,
}

/// What a transform gets to see besides the text or value.
#[derive(Debug, Clone, Copy)]
pub struct TransformScope<'a> {
    /// Attribute being read or written
    pub attribute: &'a str,

    /// Element owning the prop
    pub element: &'a Element,

    /// Boolean matching mode configured for the element
    pub boolean_mode: BooleanMode,
}

pub type ParseFn = fn(&str, &TransformScope<'_>) -> Result<PropValue, TransformError>;

/// Returns `None` when the value has no attribute form.
pub type StringifyFn = fn(&PropValue, &TransformScope<'_>) -> Option<String>;

/// A parse/stringify pair.
pub struct Transform {
    pub parse: ParseFn,
    pub stringify: Option<StringifyFn>,
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("reflectable", &self.stringify.is_some())
            .finish()
    }
}

/// Errors that can occur while parsing attribute text.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Invalid JSON in attribute {attribute}: {message}")]
    InvalidJson { attribute: String, message: String },
}

static STRING: Transform = Transform {
    parse: parse_string,
    stringify: Some(stringify_string),
};

static NUMBER: Transform = Transform {
    parse: parse_number,
    stringify: Some(stringify_number),
};

static BOOLEAN: Transform = Transform {
    parse: parse_boolean,
    stringify: Some(stringify_boolean),
};

static FUNCTION: Transform = Transform {
    parse: parse_function,
    stringify: Some(stringify_function),
};

static JSON: Transform = Transform {
    parse: parse_json,
    stringify: Some(stringify_json),
};

static LEGACY_TRUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[ty1-9]").expect("Invalid legacy boolean regex"));

static FLOAT_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Longest decimal prefix: 12, -1.5, .5, 1e3, 2.E-4
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("Invalid float prefix regex")
});

fn parse_string(text: &str, _scope: &TransformScope<'_>) -> Result<PropValue, TransformError> {
    Ok(PropValue::String(text.to_string()))
}

fn stringify_string(value: &PropValue, _scope: &TransformScope<'_>) -> Option<String> {
    Some(value.to_text())
}

fn parse_number(text: &str, _scope: &TransformScope<'_>) -> Result<PropValue, TransformError> {
    Ok(PropValue::Number(parse_float(text)))
}

fn stringify_number(value: &PropValue, _scope: &TransformScope<'_>) -> Option<String> {
    match value {
        PropValue::Number(n) => Some(format_number(*n)),
        other => Some(other.to_text()),
    }
}

fn parse_json(text: &str, scope: &TransformScope<'_>) -> Result<PropValue, TransformError> {
    serde_json::from_str(text)
        .map(PropValue::Json)
        .map_err(|e| TransformError::InvalidJson {
            attribute: scope.attribute.to_string(),
            message: e.to_string(),
        })
}

fn stringify_json(value: &PropValue, _scope: &TransformScope<'_>) -> Option<String> {
    Some(value.to_json().to_string())
}

fn stringify_boolean(value: &PropValue, _scope: &TransformScope<'_>) -> Option<String> {
    let text = if value.is_truthy() { "true" } else { "false" };
    Some(text.to_string())
}

fn parse_boolean(text: &str, scope: &TransformScope<'_>) -> Result<PropValue, TransformError> {
    let legacy = LEGACY_TRUE_RE.is_match(text);
    let explicit =
        text.is_empty() || text.eq_ignore_ascii_case("true") || text == scope.attribute;

    let value = match scope.boolean_mode {
        BooleanMode::Legacy => {
            if legacy != explicit {
                tracing::warn!(
                    attribute = scope.attribute,
                    text,
                    "Legacy boolean matching is deprecated; this value reads {} under explicit matching",
                    explicit
                );
            }
            legacy
        }
        BooleanMode::Explicit => explicit,
    };

    Ok(PropValue::Boolean(value))
}

fn parse_function(text: &str, scope: &TransformScope<'_>) -> Result<PropValue, TransformError> {
    match globals::global(text) {
        Some(func) => Ok(PropValue::Function(Callable::bound(text, func, scope.element))),
        None => {
            tracing::debug!(
                attribute = scope.attribute,
                name = text,
                "No global function registered under this name"
            );
            Ok(PropValue::Undefined)
        }
    }
}

/// Only callables that resolve back through the global registry have an
/// attribute form; anything else would parse to `Undefined` on the way back.
fn stringify_function(value: &PropValue, _scope: &TransformScope<'_>) -> Option<String> {
    let callable = value.as_function()?;
    if callable.name().is_empty() || globals::global(callable.name()).is_none() {
        return None;
    }
    Some(callable.name().to_string())
}

/// Parse the longest leading decimal number, ignoring leading whitespace.
/// Text without a numeric prefix yields NaN.
pub fn parse_float(text: &str) -> f64 {
    let trimmed = text.trim_start();

    for (prefix, sign) in [("Infinity", 1.0), ("+Infinity", 1.0), ("-Infinity", -1.0)] {
        if trimmed.starts_with(prefix) {
            return sign * f64::INFINITY;
        }
    }

    FLOAT_PREFIX_RE
        .find(trimmed)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Format a number the way attribute text expects it: `240`, `0.5`, `NaN`,
/// `Infinity`. Magnitudes outside `1e-6..1e21` use exponent form with an
/// explicit sign on positive exponents (`1e+21`, `1.5e-7`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if (1e-6..1e21).contains(&n.abs()) {
        n.to_string()
    } else {
        let formatted = format!("{n:e}");
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => formatted,
        }
    }
}
