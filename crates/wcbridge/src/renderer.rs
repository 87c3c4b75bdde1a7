//! Renderer collaborator contract.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::component::{Component, Props};
use crate::dom::Container;

/// Opaque value returned by [`Renderer::mount`] and handed back to
/// [`Renderer::update`] and [`Renderer::unmount`]. The element never looks
/// inside.
pub struct RenderContext(Box<dyn Any>);

impl RenderContext {
    pub fn new<T: Any>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.downcast_mut()
    }

    /// Take the value back out, or return the context unchanged if it holds a
    /// different type.
    pub fn into_inner<T: Any>(self) -> Result<T, Self> {
        self.0.downcast::<T>().map(|b| *b).map_err(Self)
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RenderContext(..)")
    }
}

/// Performs the actual mount/update/unmount against a display target.
///
/// All three calls are synchronous. The element guarantees `update` and
/// `unmount` only ever see a context returned by `mount`.
pub trait Renderer {
    /// First render into `container`.
    fn mount(
        &self,
        container: &Container,
        component: &Component,
        props: &Props,
    ) -> Result<RenderContext, RenderError>;

    /// Re-render with new props.
    fn update(&self, context: &mut RenderContext, props: &Props) -> Result<(), RenderError>;

    /// Tear down.
    fn unmount(&self, context: RenderContext) -> Result<(), RenderError>;

    /// Called after each successful update.
    fn on_updated(&self) {}
}

impl<R: Renderer + ?Sized> Renderer for Rc<R> {
    fn mount(
        &self,
        container: &Container,
        component: &Component,
        props: &Props,
    ) -> Result<RenderContext, RenderError> {
        (**self).mount(container, component, props)
    }

    fn update(&self, context: &mut RenderContext, props: &Props) -> Result<(), RenderError> {
        (**self).update(context, props)
    }

    fn unmount(&self, context: RenderContext) -> Result<(), RenderError> {
        (**self).unmount(context)
    }

    fn on_updated(&self) {
        (**self).on_updated()
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn mount(
        &self,
        container: &Container,
        component: &Component,
        props: &Props,
    ) -> Result<RenderContext, RenderError> {
        (**self).mount(container, component, props)
    }

    fn update(&self, context: &mut RenderContext, props: &Props) -> Result<(), RenderError> {
        (**self).update(context, props)
    }

    fn unmount(&self, context: RenderContext) -> Result<(), RenderError> {
        (**self).unmount(context)
    }

    fn on_updated(&self) {
        (**self).on_updated()
    }
}

/// Errors a renderer can raise. The element never catches these; they come
/// back out of the lifecycle callback that triggered the render.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Renderer does not provide `{0}`")]
    MissingCapability(&'static str),

    #[error("Render failed: {0}")]
    Failed(String),
}

type MountFn = dyn Fn(&Container, &Component, &Props) -> Result<RenderContext, RenderError>;
type UpdateFn = dyn Fn(&mut RenderContext, &Props) -> Result<(), RenderError>;
type UnmountFn = dyn Fn(RenderContext) -> Result<(), RenderError>;

/// A renderer assembled from closures. Any missing closure surfaces as
/// [`RenderError::MissingCapability`] the first time it is needed.
#[derive(Default)]
pub struct FnRenderer {
    mount: Option<Box<MountFn>>,
    update: Option<Box<UpdateFn>>,
    unmount: Option<Box<UnmountFn>>,
    on_updated: Option<Box<dyn Fn()>>,
}

impl FnRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_mount<F>(mut self, f: F) -> Self
    where
        F: Fn(&Container, &Component, &Props) -> Result<RenderContext, RenderError> + 'static,
    {
        self.mount = Some(Box::new(f));
        self
    }

    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut RenderContext, &Props) -> Result<(), RenderError> + 'static,
    {
        self.update = Some(Box::new(f));
        self
    }

    pub fn on_unmount<F>(mut self, f: F) -> Self
    where
        F: Fn(RenderContext) -> Result<(), RenderError> + 'static,
    {
        self.unmount = Some(Box::new(f));
        self
    }

    pub fn on_updated<F>(mut self, f: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.on_updated = Some(Box::new(f));
        self
    }
}

impl Renderer for FnRenderer {
    fn mount(
        &self,
        container: &Container,
        component: &Component,
        props: &Props,
    ) -> Result<RenderContext, RenderError> {
        let mount = self
            .mount
            .as_ref()
            .ok_or(RenderError::MissingCapability("mount"))?;
        mount(container, component, props)
    }

    fn update(&self, context: &mut RenderContext, props: &Props) -> Result<(), RenderError> {
        let update = self
            .update
            .as_ref()
            .ok_or(RenderError::MissingCapability("update"))?;
        update(context, props)
    }

    fn unmount(&self, context: RenderContext) -> Result<(), RenderError> {
        let unmount = self
            .unmount
            .as_ref()
            .ok_or(RenderError::MissingCapability("unmount"))?;
        unmount(context)
    }

    fn on_updated(&self) {
        if let Some(hook) = &self.on_updated {
            hook();
        }
    }
}

impl fmt::Debug for FnRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRenderer")
            .field("mount", &self.mount.is_some())
            .field("update", &self.update.is_some())
            .field("unmount", &self.unmount.is_some())
            .field("on_updated", &self.on_updated.is_some())
            .finish()
    }
}
