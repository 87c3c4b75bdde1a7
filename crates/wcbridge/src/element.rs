//! Custom element factory and the per-instance reflection engine.
//!
//! [`create_custom_element`] turns a component plus its options into an
//! [`ElementClass`]. Each [`Element`] built from that class keeps a typed prop
//! store in sync with its attributes and drives the renderer from its lifecycle
//! callbacks.
//!
//! All callbacks are synchronous and re-entrant: renderer, component, listener
//! and global function code may call back into the element. No interior borrow
//! is held across those calls; writes made while a render pass runs are stored
//! and deferred to the next pass instead of rendering recursively.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::children::parse_children;
use crate::component::{Component, Props};
use crate::dom::{Container, Node};
use crate::events::{CustomEvent, Listeners};
use crate::html;
use crate::options::{ConfigError, ElementOptions, ShadowMode};
use crate::props::{EventSpec, PropSpec, PropTable};
use crate::renderer::{RenderContext, RenderError, Renderer};
use crate::transforms::{BooleanMode, PropType, TransformError, TransformScope};
use crate::value::{Callable, PropRef, PropValue};
use crate::vnode::VNode;

/// Errors surfaced by element lifecycle callbacks and accessors.
#[derive(Debug, thiserror::Error)]
pub enum ElementError {
    #[error("Attribute transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("No custom element defined for <{0}>")]
    UnknownElement(String),
}

/// Build an element class wrapping `component`.
///
/// Configuration problems (bad prop names, attribute collisions, a name used as
/// both prop and event) are reported here, before any element exists.
pub fn create_custom_element<R>(
    component: Component,
    options: ElementOptions,
    renderer: R,
) -> Result<Rc<ElementClass>, ConfigError>
where
    R: Renderer + 'static,
{
    let table = PropTable::build(&options, &component)?;

    tracing::debug!(
        component = component.name(),
        props = table.props().len(),
        events = table.events().len(),
        "Created custom element class"
    );

    Ok(Rc::new(ElementClass {
        component,
        shadow: options.shadow,
        boolean_mode: options.boolean_mode,
        table,
        renderer: Box::new(renderer),
    }))
}

/// A synthesized custom element type. Shared by all its instances.
pub struct ElementClass {
    component: Component,
    shadow: Option<ShadowMode>,
    boolean_mode: BooleanMode,
    table: PropTable,
    renderer: Box<dyn Renderer>,
}

impl ElementClass {
    /// Attributes whose changes are delivered to
    /// [`Element::attribute_changed_callback`].
    pub fn observed_attributes(&self) -> Vec<&str> {
        self.table.observed_attributes()
    }

    pub fn is_observed(&self, attribute: &str) -> bool {
        self.table.prop_for_attribute(attribute).is_some()
    }

    pub fn props(&self) -> &[PropSpec] {
        self.table.props()
    }

    pub fn events(&self) -> &[EventSpec] {
        self.table.events()
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn shadow(&self) -> Option<ShadowMode> {
        self.shadow
    }

    pub fn boolean_mode(&self) -> BooleanMode {
        self.boolean_mode
    }
}

impl fmt::Debug for ElementClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementClass")
            .field("component", &self.component.name())
            .field("shadow", &self.shadow)
            .field("boolean_mode", &self.boolean_mode)
            .field("table", &self.table)
            .finish()
    }
}

#[derive(Default)]
struct InstanceState {
    /// Typed values of declared props and event callables
    props: BTreeMap<String, PropValue>,

    /// Present from the first successful mount until unmount
    context: Option<RenderContext>,

    connected: bool,

    /// Set while a render pass runs
    rendering: bool,

    /// Declared props written while `rendering` was set
    deferred: BTreeSet<String>,

    /// Light DOM children as captured at first mount
    children: Option<Vec<VNode>>,
}

pub(crate) struct ElementInner {
    class: Rc<ElementClass>,
    local_name: String,
    attributes: RefCell<Vec<(String, String)>>,
    light: Rc<RefCell<Vec<Node>>>,
    container: Container,
    shadow_root: Option<Container>,
    state: RefCell<InstanceState>,
    fields: RefCell<BTreeMap<String, PropValue>>,
    listeners: Listeners,
}

/// An instance of an [`ElementClass`]. Cloning gives another handle to the same
/// element.
#[derive(Clone)]
pub struct Element {
    inner: Rc<ElementInner>,
}

impl Element {
    /// Create an element from its initial attributes and light DOM children.
    ///
    /// Attributes of declared props are parsed into the prop store, `ref` props
    /// get a fresh cell and event props get a dispatching callable. The element
    /// starts disconnected.
    pub fn construct(
        class: &Rc<ElementClass>,
        local_name: &str,
        attributes: Vec<(String, String)>,
        children: Vec<Node>,
    ) -> Result<Element, ElementError> {
        let light = Rc::new(RefCell::new(children));
        let (container, shadow_root) = match class.shadow {
            Some(mode) => {
                let shadow = Container::shadow(mode);
                let exposed = (mode == ShadowMode::Open).then(|| shadow.clone());
                (shadow, exposed)
            }
            None => (Container::light(Rc::clone(&light)), None),
        };

        let attributes = attributes
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();

        let element = Element {
            inner: Rc::new(ElementInner {
                class: Rc::clone(class),
                local_name: local_name.to_string(),
                attributes: RefCell::new(attributes),
                light,
                container,
                shadow_root,
                state: RefCell::default(),
                fields: RefCell::default(),
                listeners: Listeners::default(),
            }),
        };

        let mut initial = BTreeMap::new();

        for spec in class.table.props() {
            if spec.ty == PropType::Ref {
                initial.insert(spec.name.clone(), PropValue::Ref(PropRef::new()));
                continue;
            }

            let (Some(transform), Some(text)) =
                (spec.ty.transform(), element.get_attribute(&spec.attribute))
            else {
                continue;
            };

            let value = (transform.parse)(&text, &element.scope(&spec.attribute))?;
            initial.insert(spec.name.clone(), value);
        }

        for spec in class.table.events() {
            initial.insert(
                spec.prop.clone(),
                PropValue::Function(element.event_callable(spec)),
            );
        }

        element.inner.state.borrow_mut().props = initial;

        tracing::debug!(element = local_name, "Constructed element");
        Ok(element)
    }

    /// Callable handed to the component for an event prop. Dispatches the
    /// event with the first argument as detail and returns whether it was not
    /// cancelled. Does nothing while the element is disconnected.
    fn event_callable(&self, spec: &EventSpec) -> Callable {
        let weak: Weak<ElementInner> = Rc::downgrade(&self.inner);
        let event = spec.event.clone();
        let init = spec.init;

        Callable::new(spec.prop.clone(), move |args| {
            let Some(inner) = weak.upgrade() else {
                return PropValue::Undefined;
            };
            let element = Element::from_inner(inner);
            if !element.is_connected() {
                tracing::trace!(element = %element.local_name(), event = %event, "Event prop called while disconnected");
                return PropValue::Undefined;
            }

            let detail = args.first().cloned().unwrap_or_default();
            let event = CustomEvent::new(event.clone(), detail, init);
            PropValue::Boolean(element.dispatch_event(&event))
        })
    }

    pub fn class(&self) -> &Rc<ElementClass> {
        &self.inner.class
    }

    pub fn local_name(&self) -> &str {
        &self.inner.local_name
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state.borrow().connected
    }

    /// Mark connected and render.
    pub fn connected_callback(&self) -> Result<(), ElementError> {
        self.inner.state.borrow_mut().connected = true;
        tracing::debug!(element = %self.inner.local_name, "Connected");
        self.render()
    }

    /// Mark disconnected and unmount the current render context, if any.
    pub fn disconnected_callback(&self) -> Result<(), ElementError> {
        let context = {
            let mut state = self.inner.state.borrow_mut();
            state.connected = false;
            state.context.take()
        };
        tracing::debug!(element = %self.inner.local_name, "Disconnected");

        if let Some(context) = context {
            tracing::debug!(element = %self.inner.local_name, "Unmounting");
            self.inner.class.renderer.unmount(context)?;
        }
        Ok(())
    }

    /// React to an observed attribute change. A removed attribute (`new` is
    /// `None`) leaves the stored value alone.
    pub fn attribute_changed_callback(
        &self,
        attribute: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<(), ElementError> {
        let class = Rc::clone(&self.inner.class);
        let Some(spec) = class.table.prop_for_attribute(attribute) else {
            return Ok(());
        };
        let (Some(transform), Some(text)) = (spec.ty.transform(), new) else {
            return Ok(());
        };

        tracing::trace!(
            element = %self.inner.local_name,
            attribute,
            old,
            new = text,
            "Attribute changed"
        );

        let value = (transform.parse)(text, &self.scope(attribute))?;
        self.store(&spec.name, value);
        self.render()
    }

    /// Current value of a prop. Undeclared names (event props included) read
    /// pass-through fields.
    pub fn get(&self, name: &str) -> PropValue {
        if self.inner.class.table.prop(name).is_some() {
            return self
                .inner
                .state
                .borrow()
                .props
                .get(name)
                .cloned()
                .unwrap_or_default();
        }

        self.inner
            .fields
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Assign a prop.
    ///
    /// Values with an attribute form are reflected to the attribute, and the
    /// resulting attribute change renders; an unchanged attribute text renders
    /// nothing. Values without one render directly. `ref` props store without
    /// rendering. Undeclared names are stored as plain fields.
    pub fn set(&self, name: &str, value: impl Into<PropValue>) -> Result<(), ElementError> {
        let value = value.into();
        let class = Rc::clone(&self.inner.class);

        let Some(spec) = class.table.prop(name) else {
            if class.table.is_event(name) {
                tracing::debug!(
                    element = %self.inner.local_name,
                    event = name,
                    "Event props are not assignable; storing as a pass-through field"
                );
            } else {
                tracing::trace!(element = %self.inner.local_name, field = name, "Stored pass-through field");
            }
            self.inner.fields.borrow_mut().insert(name.to_string(), value);
            return Ok(());
        };

        let text = spec
            .ty
            .transform()
            .and_then(|t| t.stringify)
            .and_then(|stringify| stringify(&value, &self.scope(&spec.attribute)));

        self.store(name, value);

        if spec.ty == PropType::Ref {
            return Ok(());
        }

        match text {
            Some(text) => {
                if self.get_attribute(&spec.attribute).as_deref() == Some(text.as_str()) {
                    tracing::trace!(
                        element = %self.inner.local_name,
                        attribute = %spec.attribute,
                        "Attribute already holds this text"
                    );
                    return Ok(());
                }
                self.set_attribute(&spec.attribute, &text)
            }
            None => self.render(),
        }
    }

    /// Whether `name` is a declared prop or a pass-through field.
    pub fn has(&self, name: &str) -> bool {
        self.inner.class.table.prop(name).is_some() || self.inner.fields.borrow().contains_key(name)
    }

    /// Declared prop names followed by pass-through field names.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .inner
            .class
            .table
            .props()
            .iter()
            .map(|p| p.name.clone())
            .collect();
        keys.extend(self.inner.fields.borrow().keys().cloned());
        keys
    }

    /// Snapshot of what the next render would receive.
    pub fn props(&self) -> Props {
        let state = self.inner.state.borrow();
        self.snapshot(&state)
    }

    /// Declared props written during the last render pass and not yet
    /// rendered.
    pub fn deferred_props(&self) -> Vec<String> {
        self.inner.state.borrow().deferred.iter().cloned().collect()
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.inner
            .attributes
            .borrow()
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.inner
            .attributes
            .borrow()
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Set an attribute. Observed attributes notify
    /// [`Element::attribute_changed_callback`] synchronously, even when the
    /// text is unchanged.
    pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), ElementError> {
        let name = name.to_ascii_lowercase();
        let old = {
            let mut attributes = self.inner.attributes.borrow_mut();
            match attributes.iter_mut().find(|(n, _)| *n == name) {
                Some((_, current)) => Some(std::mem::replace(current, value.to_string())),
                None => {
                    attributes.push((name.clone(), value.to_string()));
                    None
                }
            }
        };

        if self.inner.class.is_observed(&name) {
            self.attribute_changed_callback(&name, old.as_deref(), Some(value))?;
        }
        Ok(())
    }

    /// Remove an attribute. Observed attributes that were present notify
    /// [`Element::attribute_changed_callback`] with `None`.
    pub fn remove_attribute(&self, name: &str) -> Result<(), ElementError> {
        let name = name.to_ascii_lowercase();
        let old = {
            let mut attributes = self.inner.attributes.borrow_mut();
            attributes
                .iter()
                .position(|(n, _)| *n == name)
                .map(|i| attributes.remove(i).1)
        };

        if old.is_some() && self.inner.class.is_observed(&name) {
            self.attribute_changed_callback(&name, old.as_deref(), None)?;
        }
        Ok(())
    }

    /// The open shadow root. `None` without shadow or in closed mode.
    pub fn shadow_root(&self) -> Option<&Container> {
        self.inner.shadow_root.as_ref()
    }

    /// Light DOM children.
    pub fn children(&self) -> Vec<Node> {
        self.inner.light.borrow().clone()
    }

    /// Append a light DOM child. Children already captured for rendering are
    /// not re-read.
    pub fn append_child(&self, node: Node) {
        self.inner.light.borrow_mut().push(node);
    }

    pub fn inner_html(&self) -> String {
        html::serialize(&self.inner.light.borrow())
    }

    /// The element's own markup with its light DOM. Shadow content is not
    /// serialized.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        html::write_open_tag(&mut out, &self.inner.local_name, &self.inner.attributes.borrow());
        out.push_str(&self.inner_html());
        html::write_close_tag(&mut out, &self.inner.local_name);
        out
    }

    pub fn add_event_listener<F>(&self, name: &str, listener: F)
    where
        F: Fn(&CustomEvent) + 'static,
    {
        self.inner.listeners.add(name, Rc::new(listener));
    }

    /// Remove every listener for `name`. Returns how many were removed.
    pub fn remove_event_listeners(&self, name: &str) -> usize {
        self.inner.listeners.remove_all(name)
    }

    /// Invoke listeners for the event. Returns `false` if one cancelled it.
    pub fn dispatch_event(&self, event: &CustomEvent) -> bool {
        tracing::trace!(element = %self.inner.local_name, event = event.name(), "Dispatching event");
        self.inner.listeners.dispatch(event)
    }

    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<ElementInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn from_inner(inner: Rc<ElementInner>) -> Element {
        Element { inner }
    }

    fn scope<'a>(&'a self, attribute: &'a str) -> TransformScope<'a> {
        TransformScope {
            attribute,
            element: self,
            boolean_mode: self.inner.class.boolean_mode,
        }
    }

    fn store(&self, name: &str, value: PropValue) {
        let mut state = self.inner.state.borrow_mut();
        if state.rendering {
            tracing::trace!(element = %self.inner.local_name, prop = name, "Deferred write during render pass");
            state.deferred.insert(name.to_string());
        }
        state.props.insert(name.to_string(), value);
    }

    fn snapshot(&self, state: &InstanceState) -> Props {
        let mut props = Props::new();
        for (name, value) in &state.props {
            props.insert(name.clone(), value.clone());
        }
        props.set_children(state.children.clone().unwrap_or_default());
        props.set_container(self.inner.container.clone());
        props
    }

    /// Run one render pass: mount on first render, update afterwards.
    fn render(&self) -> Result<(), ElementError> {
        let class = Rc::clone(&self.inner.class);

        let (context, props) = {
            let mut state = self.inner.state.borrow_mut();
            if !state.connected {
                return Ok(());
            }
            if state.rendering {
                tracing::trace!(element = %self.inner.local_name, "Render requested during a render pass");
                return Ok(());
            }
            state.rendering = true;
            state.deferred.clear();

            if state.children.is_none() {
                state.children = Some(parse_children(&self.inner.light.borrow()));
            }

            (state.context.take(), self.snapshot(&state))
        };

        let outcome = match context {
            None => {
                tracing::debug!(element = %self.inner.local_name, "Mounting");
                class
                    .renderer
                    .mount(&self.inner.container, &class.component, &props)
                    .map_err(|e| (None, e))
            }
            Some(mut context) => {
                tracing::debug!(element = %self.inner.local_name, "Updating");
                match class.renderer.update(&mut context, &props) {
                    Ok(()) => {
                        class.renderer.on_updated();
                        Ok(context)
                    }
                    Err(e) => Err((Some(context), e)),
                }
            }
        };

        let (context, error) = match outcome {
            Ok(context) => (Some(context), None),
            Err((context, e)) => (context, Some(e)),
        };

        let orphaned = {
            let mut state = self.inner.state.borrow_mut();
            state.rendering = false;
            if state.connected {
                state.context = context;
                None
            } else {
                context
            }
        };

        if let Some(context) = orphaned {
            tracing::debug!(element = %self.inner.local_name, "Disconnected during render pass; unmounting");
            class.renderer.unmount(context)?;
        }

        match error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let connected = self.inner.state.try_borrow().map(|s| s.connected).ok();
        f.debug_struct("Element")
            .field("local_name", &self.inner.local_name)
            .field("connected", &connected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ContainerKind, Document};
    use crate::globals;
    use crate::options::EventInit;
    use crate::vnode::VElement;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::Cell;

    struct Mounted {
        id: usize,
        component: Component,
    }

    /// Counts calls and renders the component on mount and update.
    #[derive(Default)]
    struct Recorder {
        mounts: Cell<usize>,
        updates: Cell<usize>,
        updated_hooks: Cell<usize>,
        unmounted: RefCell<Vec<usize>>,
        last_props: RefCell<Option<Props>>,
        last_kind: Cell<Option<ContainerKind>>,
    }

    impl Recorder {
        fn last_props(&self) -> Props {
            self.last_props.borrow().clone().unwrap()
        }
    }

    impl Renderer for Recorder {
        fn mount(
            &self,
            container: &Container,
            component: &Component,
            props: &Props,
        ) -> Result<RenderContext, RenderError> {
            let id = self.mounts.get();
            self.mounts.set(id + 1);
            self.last_kind.set(Some(container.kind()));
            *self.last_props.borrow_mut() = Some(props.clone());
            component.render(props);
            Ok(RenderContext::new(Mounted {
                id,
                component: component.clone(),
            }))
        }

        fn update(&self, context: &mut RenderContext, props: &Props) -> Result<(), RenderError> {
            self.updates.set(self.updates.get() + 1);
            *self.last_props.borrow_mut() = Some(props.clone());
            let mounted = context
                .downcast_ref::<Mounted>()
                .ok_or_else(|| RenderError::Failed("foreign context".into()))?;
            mounted.component.render(props);
            Ok(())
        }

        fn unmount(&self, context: RenderContext) -> Result<(), RenderError> {
            let mounted = context
                .into_inner::<Mounted>()
                .map_err(|_| RenderError::Failed("foreign context".into()))?;
            self.unmounted.borrow_mut().push(mounted.id);
            Ok(())
        }

        fn on_updated(&self) {
            self.updated_hooks.set(self.updated_hooks.get() + 1);
        }
    }

    fn button() -> Component {
        Component::new("Button", |props| {
            VNode::element("button")
                .child(props.value("text").to_text())
                .into()
        })
    }

    fn class_with(component: Component, options: ElementOptions) -> (Rc<Recorder>, Rc<ElementClass>) {
        let recorder = Rc::new(Recorder::default());
        let class = create_custom_element(component, options, Rc::clone(&recorder)).unwrap();
        (recorder, class)
    }

    fn typed_options() -> ElementOptions {
        ElementOptions::new()
            .prop("text", PropType::String)
            .prop("numProp", PropType::Number)
            .prop("boolProp", PropType::Boolean)
            .prop("objProp", PropType::Json)
            .prop("funcProp", PropType::Function)
    }

    fn connected(class: &Rc<ElementClass>, attributes: &[(&str, &str)]) -> Element {
        let attributes = attributes
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
        let element = Element::construct(class, "test-el", attributes, Vec::new()).unwrap();
        element.connected_callback().unwrap();
        element
    }

    /// A component that runs `hook` with its element on every render.
    fn hooked<F>(hook: F) -> (Component, Rc<RefCell<Option<Element>>>)
    where
        F: Fn(&Element, &Props) + 'static,
    {
        let slot: Rc<RefCell<Option<Element>>> = Rc::default();
        let inner = Rc::clone(&slot);
        let component = Component::new("Hooked", move |props| {
            let element = inner.borrow().clone();
            if let Some(element) = element {
                hook(&element, props);
            }
            VNode::Empty
        });
        (component, slot)
    }

    #[test]
    fn upgrades_markup_and_reflects_attribute_changes() {
        let (recorder, class) = class_with(button(), ElementOptions::new().props(["text"]));
        let document = Document::new();
        document.custom_elements().define("test-el", class).unwrap();

        document
            .set_body_html(r#"<test-el text="hello"></test-el>"#)
            .unwrap();
        let element = document.query_selector("test-el").unwrap();

        assert_eq!(element.get("text"), PropValue::from("hello"));
        assert_eq!(recorder.mounts.get(), 1);

        element.set_attribute("text", "world").unwrap();

        assert_eq!(element.get("text"), PropValue::from("world"));
        assert_eq!(recorder.updates.get(), 1);
        assert_eq!(recorder.updated_hooks.get(), 1);
        assert_eq!(recorder.last_props().value("text"), PropValue::from("world"));
    }

    #[test]
    fn mounts_once_per_connection_and_unmounts_that_mount() {
        let (recorder, class) = class_with(button(), ElementOptions::new().props(["text"]));
        let element = connected(&class, &[]);

        element.set("text", "a").unwrap();
        element.set("text", "b").unwrap();
        assert_eq!(recorder.mounts.get(), 1);
        assert_eq!(recorder.updates.get(), 2);

        element.disconnected_callback().unwrap();
        element.disconnected_callback().unwrap();
        assert_eq!(*recorder.unmounted.borrow(), vec![0]);

        element.connected_callback().unwrap();
        element.disconnected_callback().unwrap();
        assert_eq!(recorder.mounts.get(), 2);
        assert_eq!(*recorder.unmounted.borrow(), vec![0, 1]);
    }

    #[test]
    fn disconnected_element_does_not_render() {
        let (recorder, class) = class_with(button(), ElementOptions::new().props(["text"]));
        let element = Element::construct(&class, "test-el", Vec::new(), Vec::new()).unwrap();

        element.set("text", "quiet").unwrap();
        element.disconnected_callback().unwrap();

        assert_eq!(recorder.mounts.get(), 0);
        assert!(recorder.unmounted.borrow().is_empty());
        assert_eq!(element.get_attribute("text").as_deref(), Some("quiet"));
    }

    #[test]
    fn number_attribute_parses() {
        let (_, class) = class_with(button(), typed_options());
        let element = connected(&class, &[("num-prop", "240")]);

        assert_eq!(element.get("numProp"), PropValue::Number(240.0));
    }

    #[test]
    fn boolean_property_reflects_canonical_text() {
        let (_, class) = class_with(button(), typed_options());
        let element = connected(&class, &[]);

        element.set("boolProp", true).unwrap();
        assert_eq!(element.get_attribute("bool-prop").as_deref(), Some("true"));
        assert_eq!(element.get("boolProp"), PropValue::Boolean(true));

        element.set("boolProp", false).unwrap();
        assert_eq!(element.get_attribute("bool-prop").as_deref(), Some("false"));
        assert_eq!(element.get("boolProp"), PropValue::Boolean(false));
    }

    #[test]
    fn legacy_boolean_attribute_reads_leading_character() {
        let (_, class) = class_with(button(), typed_options());
        let element = connected(&class, &[("bool-prop", "yes")]);

        assert_eq!(element.get("boolProp"), PropValue::Boolean(true));
    }

    #[test]
    fn equal_attribute_text_skips_render() {
        let (recorder, class) = class_with(button(), typed_options());
        let element = connected(&class, &[("num-prop", "240")]);

        element.set("numProp", 240).unwrap();
        assert_eq!(recorder.updates.get(), 0);

        element.set("numProp", 241).unwrap();
        assert_eq!(recorder.updates.get(), 1);
        assert_eq!(element.get_attribute("num-prop").as_deref(), Some("241"));
    }

    #[test]
    fn json_attribute_parses_structure() {
        let (recorder, class) = class_with(button(), typed_options());
        let element = connected(&class, &[("obj-prop", r#"{"greeting": "hello, world"}"#)]);

        assert_eq!(
            element.get("objProp"),
            PropValue::Json(json!({"greeting": "hello, world"}))
        );
        assert_eq!(
            recorder.last_props().value("objProp"),
            PropValue::Json(json!({"greeting": "hello, world"}))
        );
    }

    #[test]
    fn malformed_json_keeps_last_good_value() {
        let (recorder, class) = class_with(button(), typed_options());
        let element = connected(&class, &[("obj-prop", "[1]")]);

        let result = element.set_attribute("obj-prop", "{nope");

        assert!(matches!(result, Err(ElementError::Transform(_))));
        assert_eq!(element.get("objProp"), PropValue::Json(json!([1])));
        assert_eq!(recorder.updates.get(), 0);
    }

    #[test]
    fn malformed_json_at_construction_fails() {
        let (_, class) = class_with(button(), typed_options());
        let result = Element::construct(
            &class,
            "test-el",
            vec![("obj-prop".into(), "{".into())],
            Vec::new(),
        );

        assert!(matches!(result, Err(ElementError::Transform(_))));
    }

    #[test]
    fn function_attribute_binds_global_to_element() {
        globals::register_global("elementTagName", |this, _| {
            PropValue::from(this.local_name().to_string())
        });
        let (_, class) = class_with(button(), typed_options());
        let element = connected(&class, &[("func-prop", "elementTagName")]);

        let value = element.get("funcProp");
        let callable = value.as_function().unwrap();
        assert_eq!(callable.call(&[]), PropValue::from("test-el"));
        assert!(callable.this().unwrap().ptr_eq(&element));

        element.set_attribute("func-prop", "elementNoSuchGlobal").unwrap();
        assert!(element.get("funcProp").is_undefined());

        globals::unregister_global("elementTagName");
    }

    #[test]
    fn local_closure_renders_without_attribute() {
        let (recorder, class) = class_with(button(), typed_options());
        let element = connected(&class, &[]);
        let handler = Callable::new("local", |_| PropValue::from(1));

        element.set("funcProp", handler.clone()).unwrap();

        assert_eq!(recorder.updates.get(), 1);
        assert!(!element.has_attribute("func-prop"));
        assert!(element.get("funcProp").as_function().unwrap().ptr_eq(&handler));
    }

    #[test]
    fn removed_attribute_keeps_value() {
        let (recorder, class) = class_with(button(), typed_options());
        let element = connected(&class, &[("text", "kept")]);

        element.remove_attribute("text").unwrap();

        assert!(!element.has_attribute("text"));
        assert_eq!(element.get("text"), PropValue::from("kept"));
        assert_eq!(recorder.updates.get(), 0);
    }

    #[test]
    fn unobserved_attributes_do_not_render() {
        let (recorder, class) = class_with(button(), typed_options());
        let element = connected(&class, &[]);

        element.set_attribute("title", "tip").unwrap();

        assert_eq!(element.get_attribute("TITLE").as_deref(), Some("tip"));
        assert_eq!(recorder.updates.get(), 0);
    }

    #[test]
    fn undeclared_names_are_pass_through_fields() {
        let (recorder, class) = class_with(button(), ElementOptions::new().props(["text"]));
        let element = connected(&class, &[]);

        element.set("extra", 5).unwrap();

        assert_eq!(element.get("extra"), PropValue::Number(5.0));
        assert!(element.has("extra"));
        assert!(element.has("text"));
        assert!(!element.has("missing"));
        assert_eq!(element.keys(), vec!["text", "extra"]);
        assert_eq!(recorder.updates.get(), 0);
        assert!(!recorder.last_props().contains("extra"));
    }

    #[test]
    fn ref_props_get_a_fresh_cell_and_never_render() {
        let options = ElementOptions::new().prop("inputRef", PropType::Ref);
        let (recorder, class) = class_with(button(), options);
        let first = connected(&class, &[]);
        let second = connected(&class, &[]);

        let cell = first.get("inputRef");
        let cell = cell.as_ref_cell().unwrap();
        assert!(!cell.ptr_eq(second.get("inputRef").as_ref_cell().unwrap()));
        assert_eq!(class.observed_attributes(), vec!["input-ref"]);

        first.set("inputRef", PropRef::new()).unwrap();
        first.set_attribute("input-ref", "ignored").unwrap();
        assert_eq!(recorder.updates.get(), 0);
    }

    #[test]
    fn event_props_dispatch_while_connected() {
        let options = ElementOptions::new()
            .props(["text"])
            .events(["onSelect"])
            .event(
                "onSubmit",
                EventInit {
                    cancelable: true,
                    ..EventInit::default()
                },
            );
        let (recorder, class) = class_with(button(), options);
        let element = connected(&class, &[]);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        element.add_event_listener("select", move |event: &CustomEvent| {
            sink.borrow_mut().push(event.detail().clone())
        });
        element.add_event_listener("submit", |event: &CustomEvent| event.prevent_default());

        let props = recorder.last_props();
        let on_select = props.value("onSelect");
        let on_submit = props.value("onSubmit");

        let result = on_select.as_function().unwrap().call(&[PropValue::from("a")]);
        assert_eq!(result, PropValue::Boolean(true));
        assert_eq!(*seen.borrow(), vec![PropValue::from("a")]);

        let result = on_submit.as_function().unwrap().call(&[]);
        assert_eq!(result, PropValue::Boolean(false));

        element.disconnected_callback().unwrap();
        let result = on_select.as_function().unwrap().call(&[PropValue::from("b")]);
        assert!(result.is_undefined());
        assert_eq!(seen.borrow().len(), 1);

        assert!(element.get("onSelect").is_undefined());
        assert!(!element.has("onSelect"));
    }

    #[test]
    fn assigning_an_event_prop_keeps_the_dispatcher() {
        let options = ElementOptions::new().props(["text"]).events(["onSelect"]);
        let (recorder, class) = class_with(button(), options);
        let element = connected(&class, &[]);

        element
            .set("onSelect", Callable::new("replacement", |_| PropValue::from(0)))
            .unwrap();

        assert!(element.has("onSelect"));
        assert_eq!(recorder.updates.get(), 0);
        let dispatcher = element.props().value("onSelect");
        assert_eq!(dispatcher.as_function().unwrap().name(), "onSelect");
    }

    #[test]
    fn writes_during_render_are_deferred() {
        let (component, slot) = hooked(|element, props| {
            if props.value("note").is_undefined() {
                element.set("note", "seen").unwrap();
            }
        });
        let (recorder, class) = class_with(component, ElementOptions::new().props(["note", "text"]));
        let element = Element::construct(&class, "test-el", Vec::new(), Vec::new()).unwrap();
        *slot.borrow_mut() = Some(element.clone());

        element.connected_callback().unwrap();

        assert_eq!(recorder.mounts.get(), 1);
        assert_eq!(recorder.updates.get(), 0);
        assert_eq!(element.deferred_props(), vec!["note"]);
        assert_eq!(element.get("note"), PropValue::from("seen"));
        assert!(recorder.last_props().value("note").is_undefined());

        element.set("text", "next").unwrap();

        assert_eq!(recorder.updates.get(), 1);
        assert!(element.deferred_props().is_empty());
        assert_eq!(recorder.last_props().value("note"), PropValue::from("seen"));

        slot.borrow_mut().take();
    }

    #[test]
    fn disconnect_during_pass_unmounts_after_it() {
        let (component, slot) = hooked(|element, props| {
            if props.value("text") == PropValue::from("bye") {
                element.disconnected_callback().unwrap();
            }
        });
        let (recorder, class) = class_with(component, ElementOptions::new().props(["text"]));
        let element = Element::construct(&class, "test-el", Vec::new(), Vec::new()).unwrap();
        *slot.borrow_mut() = Some(element.clone());
        element.connected_callback().unwrap();

        element.set("text", "bye").unwrap();

        assert_eq!(recorder.updates.get(), 1);
        assert_eq!(*recorder.unmounted.borrow(), vec![0]);
        assert!(!element.is_connected());

        element.disconnected_callback().unwrap();
        assert_eq!(recorder.unmounted.borrow().len(), 1);

        slot.borrow_mut().take();
    }

    #[test]
    fn shadow_modes_choose_the_container() {
        let (recorder, light) = class_with(button(), ElementOptions::new());
        connected(&light, &[]);
        assert_eq!(recorder.last_kind.get(), Some(ContainerKind::Light));

        let (recorder, open) = class_with(button(), ElementOptions::new().shadow(ShadowMode::Open));
        let element = connected(&open, &[]);
        assert_eq!(recorder.last_kind.get(), Some(ContainerKind::Shadow(ShadowMode::Open)));
        assert!(element.shadow_root().is_some());

        let (recorder, closed) =
            class_with(button(), ElementOptions::new().shadow(ShadowMode::Closed));
        let element = connected(&closed, &[]);
        assert_eq!(
            recorder.last_kind.get(),
            Some(ContainerKind::Shadow(ShadowMode::Closed))
        );
        assert!(element.shadow_root().is_none());
    }

    #[test]
    fn props_carry_the_render_container() {
        let (recorder, light) = class_with(button(), ElementOptions::new());
        let element = connected(&light, &[]);
        let container = recorder.last_props().container().cloned().unwrap();
        assert_eq!(container.kind(), ContainerKind::Light);
        container.set_children(vec![Node::text("drawn")]);
        assert_eq!(element.children(), vec![Node::text("drawn")]);
        assert_eq!(element.props().container(), Some(&container));

        let (recorder, open) = class_with(button(), ElementOptions::new().shadow(ShadowMode::Open));
        let element = connected(&open, &[]);
        let container = recorder.last_props().container().cloned().unwrap();
        assert!(container.ptr_eq(element.shadow_root().unwrap()));

        let (recorder, closed) =
            class_with(button(), ElementOptions::new().shadow(ShadowMode::Closed));
        connected(&closed, &[]);
        let container = recorder.last_props().container().cloned().unwrap();
        assert_eq!(container.kind(), ContainerKind::Shadow(ShadowMode::Closed));
    }

    #[test]
    fn children_are_captured_at_first_mount() {
        let (recorder, class) = class_with(button(), ElementOptions::new().props(["text"]));
        let document = Document::new();
        document.custom_elements().define("test-el", class).unwrap();

        document
            .set_body_html(r#"<test-el><b class="x">hi</b></test-el>"#)
            .unwrap();
        let element = document.query_selector("test-el").unwrap();

        let expected = vec![VNode::Element(
            VElement::new("b")
                .key("0")
                .prop("className", "x")
                .child("hi"),
        )];
        assert_eq!(recorder.last_props().children(), expected.as_slice());

        element.append_child(Node::text("late"));
        element.set("text", "again").unwrap();
        assert_eq!(recorder.last_props().children(), expected.as_slice());
    }

    #[test]
    fn missing_update_capability_surfaces_and_keeps_context() {
        let renderer = crate::renderer::FnRenderer::new()
            .on_mount(|_, _, _| Ok(RenderContext::new(())));
        let class = create_custom_element(button(), ElementOptions::new().props(["text"]), renderer)
            .unwrap();
        let element = connected(&class, &[]);

        let err = element.set("text", "x").unwrap_err();
        assert!(matches!(
            err,
            ElementError::Render(RenderError::MissingCapability("update"))
        ));

        let err = element.disconnected_callback().unwrap_err();
        assert!(matches!(
            err,
            ElementError::Render(RenderError::MissingCapability("unmount"))
        ));
    }

    #[test]
    fn document_lifecycle() {
        let (recorder, class) = class_with(button(), ElementOptions::new().props(["text"]));
        let document = Document::new();
        document.custom_elements().define("test-el", Rc::clone(&class)).unwrap();

        assert!(matches!(
            document.custom_elements().define("test-el", Rc::clone(&class)),
            Err(ConfigError::AlreadyDefined(_))
        ));
        assert!(matches!(
            document.custom_elements().define("nodash", class),
            Err(ConfigError::InvalidTagName(_))
        ));
        assert!(matches!(
            document.create_element("other-el"),
            Err(ElementError::UnknownElement(_))
        ));

        let element = document.create_element("test-el").unwrap();
        element.set("text", "hi").unwrap();
        document.append(&element).unwrap();
        assert!(element.is_connected());
        assert_eq!(document.body_html(), r#"<test-el text="hi"></test-el>"#);

        assert!(document.remove(&element).unwrap());
        assert!(!document.remove(&element).unwrap());
        assert!(!element.is_connected());
        assert_eq!(*recorder.unmounted.borrow(), vec![0]);

        document.append(&element).unwrap();
        document.set_body_html("<p>replaced</p>").unwrap();
        assert!(!element.is_connected());
        assert_eq!(document.body_html(), "<p>replaced</p>");
    }
}
