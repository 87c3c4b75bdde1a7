//! Element options and the TOML element manifest.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::transforms::{BooleanMode, PropType};

/// Shadow subtree mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowMode {
    /// Shadow root reachable through [`crate::Element::shadow_root`]
    Open,
    /// Shadow root hidden from the host
    Closed,
}

/// Dispatch options for an event prop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EventInit {
    #[serde(default)]
    pub bubbles: bool,

    #[serde(default)]
    pub cancelable: bool,

    #[serde(default)]
    pub composed: bool,
}

/// Declared props: a list (all `string`) or a map of name to type. Both keep
/// declaration order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PropsConfig {
    List(Vec<String>),
    Typed(IndexMap<String, PropType>),
}

/// Declared event props: a list (default dispatch options) or a map of name to
/// options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EventsConfig {
    List(Vec<String>),
    Typed(IndexMap<String, EventInit>),
}

/// Options for [`crate::create_custom_element`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ElementOptions {
    /// Render into a shadow subtree instead of the element itself
    #[serde(default)]
    pub shadow: Option<ShadowMode>,

    /// Declared props; `None` falls back to the component's declared props
    #[serde(default)]
    pub props: Option<PropsConfig>,

    /// Props that are event callbacks rather than data
    #[serde(default)]
    pub events: Option<EventsConfig>,

    /// How `boolean` props read attribute text
    #[serde(default, rename = "boolean")]
    pub boolean_mode: BooleanMode,
}

impl ElementOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shadow(mut self, mode: ShadowMode) -> Self {
        self.shadow = Some(mode);
        self
    }

    /// Declare `string` props by name.
    pub fn props<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.props = Some(PropsConfig::List(names.into_iter().map(Into::into).collect()));
        self
    }

    /// Declare one typed prop. A list declared earlier is kept as `string` props.
    pub fn prop(mut self, name: impl Into<String>, ty: PropType) -> Self {
        let mut typed = match self.props.take() {
            Some(PropsConfig::Typed(map)) => map,
            Some(PropsConfig::List(names)) => {
                names.into_iter().map(|n| (n, PropType::String)).collect()
            }
            None => IndexMap::new(),
        };
        typed.insert(name.into(), ty);
        self.props = Some(PropsConfig::Typed(typed));
        self
    }

    /// Declare event props with default dispatch options.
    pub fn events<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events = Some(EventsConfig::List(names.into_iter().map(Into::into).collect()));
        self
    }

    /// Declare one event prop with explicit dispatch options.
    pub fn event(mut self, name: impl Into<String>, init: EventInit) -> Self {
        let mut typed = match self.events.take() {
            Some(EventsConfig::Typed(map)) => map,
            Some(EventsConfig::List(names)) => {
                names.into_iter().map(|n| (n, EventInit::default())).collect()
            }
            None => IndexMap::new(),
        };
        typed.insert(name.into(), init);
        self.events = Some(EventsConfig::Typed(typed));
        self
    }

    pub fn boolean_mode(mut self, mode: BooleanMode) -> Self {
        self.boolean_mode = mode;
        self
    }
}

/// Element definitions loaded from a TOML manifest.
///
/// ```toml
/// [elements.user-card]
/// shadow = "open"
/// boolean = "explicit"
/// props = { name = "string", age = "number", active = "boolean" }
/// events = ["onSelect"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElementManifest {
    #[serde(default)]
    elements: BTreeMap<String, ElementOptions>,
}

impl ElementManifest {
    /// Parse a manifest from TOML text.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::ManifestParse(e.to_string()))
    }

    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ManifestRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let manifest = Self::from_toml_str(&content)?;
        tracing::info!(
            "Loaded {} element definitions from {}",
            manifest.elements.len(),
            path.display()
        );
        Ok(manifest)
    }

    /// Options declared for a tag.
    pub fn options(&self, tag: &str) -> Option<&ElementOptions> {
        self.elements.get(tag)
    }

    /// All declared tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        self.elements.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Errors raised while building an element class or loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid prop name: {0}")]
    InvalidPropName(String),

    #[error("Props {first} and {second} both map to attribute {attribute}")]
    DuplicateAttribute {
        attribute: String,
        first: String,
        second: String,
    },

    #[error("{0} is declared as both a prop and an event")]
    ConflictingName(String),

    #[error("Invalid custom element name: {0}")]
    InvalidTagName(String),

    #[error("Custom element already defined: {0}")]
    AlreadyDefined(String),

    #[error("Failed to read manifest {path}: {message}")]
    ManifestRead { path: String, message: String },

    #[error("Failed to parse manifest: {0}")]
    ManifestParse(String),
}
