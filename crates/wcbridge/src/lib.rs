//! Wrap components as native custom elements.
//!
//! This crate provides the reflection and lifecycle engine that sits between a
//! custom element's callbacks (construct, connect, disconnect, attribute changed)
//! and a wrapped component's render cycle, plus a small single-threaded host model
//! that plays the role of the platform.

pub mod children;
pub mod component;
pub mod dom;
pub mod element;
pub mod events;
pub mod globals;
pub mod html;
pub mod options;
pub mod props;
pub mod renderer;
pub mod transforms;
pub mod value;
pub mod vnode;

pub use children::parse_children;
pub use component::{Component, Props};
pub use dom::{Container, ContainerKind, CustomElementRegistry, Document, ElementNode, Node};
pub use element::{create_custom_element, Element, ElementClass, ElementError};
pub use events::{CustomEvent, EventListener};
pub use globals::{global, register_global, unregister_global, GlobalFn};
pub use html::{parse_fragment, serialize};
pub use options::{
    ConfigError, ElementManifest, ElementOptions, EventInit, EventsConfig, PropsConfig, ShadowMode,
};
pub use props::{to_camel_case, to_dashed_case, EventSpec, PropSpec};
pub use renderer::{FnRenderer, RenderContext, RenderError, Renderer};
pub use transforms::{format_number, parse_float, BooleanMode, PropType, Transform, TransformError};
pub use value::{Callable, PropRef, PropValue};
pub use vnode::{VElement, VNode};
