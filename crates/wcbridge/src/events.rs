//! Events dispatched by event props.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::options::EventInit;
use crate::value::PropValue;

/// An event carrying the payload the component passed to its event prop.
#[derive(Debug)]
pub struct CustomEvent {
    name: String,
    detail: PropValue,
    init: EventInit,
    default_prevented: Cell<bool>,
}

impl CustomEvent {
    pub fn new(name: impl Into<String>, detail: PropValue, init: EventInit) -> Self {
        Self {
            name: name.into(),
            detail,
            init,
            default_prevented: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detail(&self) -> &PropValue {
        &self.detail
    }

    pub fn bubbles(&self) -> bool {
        self.init.bubbles
    }

    pub fn cancelable(&self) -> bool {
        self.init.cancelable
    }

    pub fn composed(&self) -> bool {
        self.init.composed
    }

    /// Cancel the event. Ignored unless the event is cancelable.
    pub fn prevent_default(&self) {
        if self.init.cancelable {
            self.default_prevented.set(true);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

pub type EventListener = Rc<dyn Fn(&CustomEvent)>;

/// Listeners registered on one element, in registration order.
#[derive(Default)]
pub(crate) struct Listeners {
    entries: RefCell<Vec<(String, EventListener)>>,
}

impl Listeners {
    pub(crate) fn add(&self, name: &str, listener: EventListener) {
        self.entries.borrow_mut().push((name.to_string(), listener));
    }

    pub(crate) fn remove_all(&self, name: &str) -> usize {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(n, _)| n != name);
        before - entries.len()
    }

    /// Invoke matching listeners. Returns `false` if a listener cancelled the
    /// event.
    pub(crate) fn dispatch(&self, event: &CustomEvent) -> bool {
        // Snapshot so listeners may register or remove listeners while running
        let matching: Vec<EventListener> = self
            .entries
            .borrow()
            .iter()
            .filter(|(n, _)| n == event.name())
            .map(|(_, l)| Rc::clone(l))
            .collect();

        for listener in matching {
            listener(event);
        }

        !event.default_prevented()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .entries
            .borrow()
            .iter()
            .map(|(n, _)| n.clone())
            .collect();
        f.debug_struct("Listeners").field("names", &names).finish()
    }
}
