//! Prop and event tables built once per element class.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::component::Component;
use crate::options::{ConfigError, ElementOptions, EventInit, EventsConfig, PropsConfig};
use crate::transforms::PropType;

/// One declared prop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropSpec {
    /// Property name (e.g., "numProp")
    pub name: String,

    /// Observed attribute (e.g., "num-prop")
    pub attribute: String,

    /// Logical type
    pub ty: PropType,
}

/// One declared event prop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSpec {
    /// Prop the component calls (e.g., "onSelect")
    pub prop: String,

    /// Dispatched event name (e.g., "select")
    pub event: String,

    /// Dispatch options
    pub init: EventInit,
}

/// Lookup tables for one element class. Read-only after construction.
#[derive(Debug, Default)]
pub(crate) struct PropTable {
    props: Vec<PropSpec>,
    by_name: HashMap<String, usize>,
    by_attribute: HashMap<String, usize>,
    events: Vec<EventSpec>,
}

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("Invalid identifier regex")
});

static DASH_BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("Invalid dash boundary regex"));

static CAMEL_BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-:]([a-z])").expect("Invalid camel boundary regex"));

impl PropTable {
    pub(crate) fn build(options: &ElementOptions, component: &Component) -> Result<Self, ConfigError> {
        let declared: Vec<(String, PropType)> = match &options.props {
            Some(PropsConfig::List(names)) => {
                names.iter().map(|n| (n.clone(), PropType::String)).collect()
            }
            Some(PropsConfig::Typed(map)) => map.iter().map(|(n, t)| (n.clone(), *t)).collect(),
            None => component
                .declared_props()
                .unwrap_or_default()
                .iter()
                .map(|n| (n.clone(), PropType::String))
                .collect(),
        };

        let mut table = PropTable::default();

        for (name, ty) in declared {
            if !IDENTIFIER_RE.is_match(&name) {
                return Err(ConfigError::InvalidPropName(name));
            }

            let attribute = to_dashed_case(&name);
            if let Some(&existing) = table.by_attribute.get(&attribute) {
                return Err(ConfigError::DuplicateAttribute {
                    attribute,
                    first: table.props[existing].name.clone(),
                    second: name,
                });
            }

            let index = table.props.len();
            table.by_name.insert(name.clone(), index);
            table.by_attribute.insert(attribute.clone(), index);
            table.props.push(PropSpec {
                name,
                attribute,
                ty,
            });
        }

        let events: Vec<(String, EventInit)> = match &options.events {
            Some(EventsConfig::List(names)) => {
                names.iter().map(|n| (n.clone(), EventInit::default())).collect()
            }
            Some(EventsConfig::Typed(map)) => map.iter().map(|(n, i)| (n.clone(), *i)).collect(),
            None => Vec::new(),
        };

        for (prop, init) in events {
            if !IDENTIFIER_RE.is_match(&prop) {
                return Err(ConfigError::InvalidPropName(prop));
            }
            if table.by_name.contains_key(&prop) || table.events.iter().any(|e| e.prop == prop) {
                return Err(ConfigError::ConflictingName(prop));
            }
            table.events.push(EventSpec {
                event: event_name(&prop),
                prop,
                init,
            });
        }

        Ok(table)
    }

    pub(crate) fn props(&self) -> &[PropSpec] {
        &self.props
    }

    pub(crate) fn events(&self) -> &[EventSpec] {
        &self.events
    }

    pub(crate) fn prop(&self, name: &str) -> Option<&PropSpec> {
        self.by_name.get(name).map(|&i| &self.props[i])
    }

    pub(crate) fn prop_for_attribute(&self, attribute: &str) -> Option<&PropSpec> {
        self.by_attribute.get(attribute).map(|&i| &self.props[i])
    }

    pub(crate) fn is_event(&self, name: &str) -> bool {
        self.events.iter().any(|e| e.prop == name)
    }

    pub(crate) fn observed_attributes(&self) -> Vec<&str> {
        self.props.iter().map(|p| p.attribute.as_str()).collect()
    }
}

/// Convert a camelCase prop name to its attribute: `numProp` -> `num-prop`.
pub fn to_dashed_case(name: &str) -> String {
    DASH_BOUNDARY_RE
        .replace_all(name, "$1-$2")
        .to_lowercase()
}

/// Convert a dashed attribute name to camelCase: `num-prop` -> `numProp`.
pub fn to_camel_case(name: &str) -> String {
    CAMEL_BOUNDARY_RE
        .replace_all(name, |caps: &regex::Captures<'_>| caps[1].to_uppercase())
        .into_owned()
}

/// Event dispatched by an event prop: `onSelectItem` -> `selectitem`.
fn event_name(prop: &str) -> String {
    prop.strip_prefix("on").unwrap_or(prop).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vnode::VNode;
    use pretty_assertions::assert_eq;

    fn component() -> Component {
        Component::new("Test", |_| VNode::Empty)
    }

    #[test]
    fn dashed_case_works() {
        assert_eq!(to_dashed_case("numProp"), "num-prop");
        assert_eq!(to_dashed_case("text"), "text");
        assert_eq!(to_dashed_case("a1B"), "a1-b");
        assert_eq!(to_dashed_case("URL"), "url");
    }

    #[test]
    fn camel_case_works() {
        assert_eq!(to_camel_case("num-prop"), "numProp");
        assert_eq!(to_camel_case("xlink:href"), "xlinkHref");
        assert_eq!(to_camel_case("class-name"), "className");
        assert_eq!(to_camel_case("plain"), "plain");
    }

    #[test]
    fn builds_typed_table() {
        let options = ElementOptions::new()
            .prop("numProp", PropType::Number)
            .prop("objProp", PropType::Json)
            .events(["onSelect"]);

        let table = PropTable::build(&options, &component()).unwrap();

        assert_eq!(table.observed_attributes(), vec!["num-prop", "obj-prop"]);
        assert_eq!(table.prop_for_attribute("num-prop").unwrap().name, "numProp");
        assert_eq!(table.prop("objProp").unwrap().ty, PropType::Json);
        assert_eq!(
            table.events(),
            &[EventSpec {
                prop: "onSelect".to_string(),
                event: "select".to_string(),
                init: EventInit::default(),
            }]
        );
        assert!(table.is_event("onSelect"));
    }

    #[test]
    fn list_props_are_strings() {
        let options = ElementOptions::new().props(["text", "subTitle"]);
        let table = PropTable::build(&options, &component()).unwrap();

        assert!(table.props().iter().all(|p| p.ty == PropType::String));
        assert_eq!(table.observed_attributes(), vec!["text", "sub-title"]);
    }

    #[test]
    fn typed_props_keep_declaration_order() {
        let options = ElementOptions::new()
            .prop("zeta", PropType::String)
            .prop("alpha", PropType::Number)
            .event("onZoom", EventInit::default())
            .event("onAdd", EventInit::default());
        let table = PropTable::build(&options, &component()).unwrap();

        assert_eq!(table.observed_attributes(), vec!["zeta", "alpha"]);
        let events: Vec<&str> = table.events().iter().map(|e| e.event.as_str()).collect();
        assert_eq!(events, vec!["zoom", "add"]);
    }

    #[test]
    fn falls_back_to_component_declared_props() {
        let component = component().with_declared_props(["label", "iconName"]);
        let table = PropTable::build(&ElementOptions::new(), &component).unwrap();

        assert_eq!(table.observed_attributes(), vec!["label", "icon-name"]);
    }

    #[test]
    fn explicit_empty_list_does_not_fall_back() {
        let component = component().with_declared_props(["label"]);
        let options = ElementOptions::new().props(Vec::<String>::new());
        let table = PropTable::build(&options, &component).unwrap();

        assert!(table.props().is_empty());
    }

    #[test]
    fn no_props_anywhere_is_empty() {
        let table = PropTable::build(&ElementOptions::new(), &component()).unwrap();
        assert!(table.observed_attributes().is_empty());
    }

    #[test]
    fn rejects_attribute_collisions() {
        let options = ElementOptions::new().props(["url", "URL"]);
        let result = PropTable::build(&options, &component());

        assert!(matches!(
            result,
            Err(ConfigError::DuplicateAttribute { ref attribute, .. }) if attribute == "url"
        ));
    }

    #[test]
    fn rejects_prop_event_conflict() {
        let options = ElementOptions::new()
            .props(["onClick"])
            .events(["onClick"]);
        let result = PropTable::build(&options, &component());

        assert!(matches!(result, Err(ConfigError::ConflictingName(ref n)) if n == "onClick"));
    }

    #[test]
    fn rejects_invalid_names() {
        let options = ElementOptions::new().props(["not-an-identifier"]);
        let result = PropTable::build(&options, &component());

        assert!(matches!(result, Err(ConfigError::InvalidPropName(_))));
    }
}
