//! Process-wide function registry backing the `function` prop type.
//!
//! An attribute like `on-pick="handlePick"` names a function registered here; the
//! parsed prop is that function bound to the element as `this`.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::element::Element;
use crate::value::PropValue;

/// A registered global function. Receives the bound element and the call
/// arguments.
pub type GlobalFn = Arc<dyn Fn(&Element, &[PropValue]) -> PropValue + Send + Sync>;

static GLOBALS: LazyLock<RwLock<HashMap<String, GlobalFn>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Register (or replace) a global function.
pub fn register_global<F>(name: impl Into<String>, func: F)
where
    F: Fn(&Element, &[PropValue]) -> PropValue + Send + Sync + 'static,
{
    let name = name.into();
    tracing::debug!(name = %name, "Registered global function");
    GLOBALS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name, Arc::new(func));
}

/// Remove a global function. Returns whether it was registered.
pub fn unregister_global(name: &str) -> bool {
    GLOBALS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(name)
        .is_some()
}

/// Look up a global function by name.
pub fn global(name: &str) -> Option<GlobalFn> {
    GLOBALS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .cloned()
}
