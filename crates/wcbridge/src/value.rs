//! Typed prop values carried between attributes, properties and renders.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::element::{Element, ElementInner};
use crate::globals::GlobalFn;
use crate::transforms::format_number;

/// A prop value.
///
/// Attributes are always text; properties hold one of these.
#[derive(Clone, Default)]
pub enum PropValue {
    /// No value (an unset prop, or an unresolved function name)
    #[default]
    Undefined,
    /// Text: text="hello"
    String(String),
    /// Floating point number, NaN included
    Number(f64),
    /// Boolean
    Boolean(bool),
    /// Any JSON-compatible structure
    Json(serde_json::Value),
    /// A callable, either a plain closure or a global bound to an element
    Function(Callable),
    /// A shared reference cell exposed to the component
    Ref(PropRef),
}

impl PropValue {
    /// Whether this is [`PropValue::Undefined`].
    pub fn is_undefined(&self) -> bool {
        matches!(self, PropValue::Undefined)
    }

    /// Get as string if it's a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            PropValue::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Callable> {
        match self {
            PropValue::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_ref_cell(&self) -> Option<&PropRef> {
        match self {
            PropValue::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Truthiness as markup authors expect it: empty text, zero, NaN, null and
    /// undefined are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            PropValue::Undefined => false,
            PropValue::String(s) => !s.is_empty(),
            PropValue::Number(n) => *n != 0.0 && !n.is_nan(),
            PropValue::Boolean(b) => *b,
            PropValue::Json(v) => match v {
                serde_json::Value::Null => false,
                serde_json::Value::Bool(b) => *b,
                serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
                serde_json::Value::String(s) => !s.is_empty(),
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
            },
            PropValue::Function(_) | PropValue::Ref(_) => true,
        }
    }

    /// Convert to JSON. Values without a JSON form (undefined, NaN, callables,
    /// refs) become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PropValue::String(s) => serde_json::Value::String(s.clone()),
            PropValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PropValue::Boolean(b) => serde_json::Value::Bool(*b),
            PropValue::Json(v) => v.clone(),
            PropValue::Undefined | PropValue::Function(_) | PropValue::Ref(_) => {
                serde_json::Value::Null
            }
        }
    }

    /// Plain text form used when a value is written to a string attribute.
    pub fn to_text(&self) -> String {
        match self {
            PropValue::Undefined => "undefined".to_string(),
            PropValue::String(s) => s.clone(),
            PropValue::Number(n) => format_number(*n),
            PropValue::Boolean(b) => b.to_string(),
            PropValue::Json(serde_json::Value::String(s)) => s.clone(),
            PropValue::Json(v) => v.to_string(),
            PropValue::Function(f) => f.name().to_string(),
            PropValue::Ref(_) => "[object Object]".to_string(),
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Undefined, PropValue::Undefined) => true,
            (PropValue::String(a), PropValue::String(b)) => a == b,
            (PropValue::Number(a), PropValue::Number(b)) => a == b,
            (PropValue::Boolean(a), PropValue::Boolean(b)) => a == b,
            (PropValue::Json(a), PropValue::Json(b)) => a == b,
            (PropValue::Function(a), PropValue::Function(b)) => a.ptr_eq(b),
            (PropValue::Ref(a), PropValue::Ref(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Undefined => f.write_str("Undefined"),
            PropValue::String(s) => f.debug_tuple("String").field(s).finish(),
            PropValue::Number(n) => f.debug_tuple("Number").field(n).finish(),
            PropValue::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            PropValue::Json(v) => f.debug_tuple("Json").field(v).finish(),
            PropValue::Function(c) => f.debug_tuple("Function").field(c).finish(),
            PropValue::Ref(r) => f.debug_tuple("Ref").field(r).finish(),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::String(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::String(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Number(f64::from(value))
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Boolean(value)
    }
}

impl From<serde_json::Value> for PropValue {
    fn from(value: serde_json::Value) -> Self {
        PropValue::Json(value)
    }
}

impl From<Callable> for PropValue {
    fn from(value: Callable) -> Self {
        PropValue::Function(value)
    }
}

impl From<PropRef> for PropValue {
    fn from(value: PropRef) -> Self {
        PropValue::Ref(value)
    }
}

type PlainFn = dyn Fn(&[PropValue]) -> PropValue;

#[derive(Clone)]
enum Target {
    Plain(Rc<PlainFn>),
    /// A global function with `this` bound to an element
    Bound {
        func: GlobalFn,
        this: Weak<ElementInner>,
    },
}

/// A callable prop value.
#[derive(Clone)]
pub struct Callable {
    name: Rc<str>,
    target: Target,
}

impl Callable {
    /// Create a named callable from a closure.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[PropValue]) -> PropValue + 'static,
    {
        Self {
            name: Rc::from(name.into()),
            target: Target::Plain(Rc::new(func)),
        }
    }

    /// Create a callable with an empty name.
    pub fn anonymous<F>(func: F) -> Self
    where
        F: Fn(&[PropValue]) -> PropValue + 'static,
    {
        Self::new(String::new(), func)
    }

    /// Bind a global function to an element.
    pub(crate) fn bound(name: &str, func: GlobalFn, this: &Element) -> Self {
        Self {
            name: Rc::from(name),
            target: Target::Bound {
                func,
                this: this.downgrade(),
            },
        }
    }

    /// Declared name; empty for anonymous callables.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The element this callable is bound to, if it is a bound global and the
    /// element is still alive.
    pub fn this(&self) -> Option<Element> {
        match &self.target {
            Target::Plain(_) => None,
            Target::Bound { this, .. } => this.upgrade().map(Element::from_inner),
        }
    }

    /// Invoke the callable. A bound global whose element is gone returns
    /// [`PropValue::Undefined`].
    pub fn call(&self, args: &[PropValue]) -> PropValue {
        match &self.target {
            Target::Plain(func) => func(args),
            Target::Bound { func, this } => match this.upgrade() {
                Some(inner) => func(&Element::from_inner(inner), args),
                None => PropValue::Undefined,
            },
        }
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        match (&self.target, &other.target) {
            (Target::Plain(a), Target::Plain(b)) => Rc::ptr_eq(a, b),
            (
                Target::Bound { func: fa, this: ta },
                Target::Bound { func: fb, this: tb },
            ) => Arc::ptr_eq(fa, fb) && Weak::ptr_eq(ta, tb),
            _ => false,
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = matches!(self.target, Target::Bound { .. });
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("bound", &bound)
            .finish()
    }
}

/// A mutable reference cell handed to the component (the `ref` prop type).
#[derive(Clone, Default)]
pub struct PropRef(Rc<RefCell<PropValue>>);

impl PropRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> PropValue {
        self.0.borrow().clone()
    }

    pub fn set(&self, value: impl Into<PropValue>) {
        *self.0.borrow_mut() = value.into();
    }

    pub fn ptr_eq(&self, other: &PropRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for PropRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(current) => f.debug_struct("PropRef").field("current", &*current).finish(),
            Err(_) => f.write_str("PropRef { <borrowed> }"),
        }
    }
}
