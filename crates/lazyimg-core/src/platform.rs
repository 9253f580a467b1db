//! Host environment seam.
//!
//! The engine never touches a DOM directly. Everything it needs from the host
//! (attributes, style, load listeners, viewport watchers, timers) goes through
//! [`Platform`], so the same state machine drives a browser through
//! `lazyimg-platform-web` and a deterministic in-memory document in tests.

use std::fmt;

use crate::options::ObserverOptions;

/// Stable identity of an element, assigned by the platform.
///
/// Platforms must hand out the same id for the same element for as long as
/// the element lives, and must not keep the element alive to do so.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Coarse element classification used to pick how a source is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    /// An `<img>` element: sources go to attributes and load events are observable.
    Image,
    /// Any other element: the source becomes a CSS background image.
    Other,
}

/// A single visibility crossing delivered by a watcher.
#[derive(Clone, Debug)]
pub struct IntersectionEntry<E> {
    pub target: E,
    pub is_intersecting: bool,
}

impl<E> IntersectionEntry<E> {
    pub fn new(target: E, is_intersecting: bool) -> Self {
        Self {
            target,
            is_intersecting,
        }
    }
}

pub type IntersectionCallback<E> = Box<dyn FnMut(&[IntersectionEntry<E>])>;
pub type ElementCallback = Box<dyn FnMut()>;
pub type TimerCallback = Box<dyn FnOnce()>;

/// Viewport watcher scoped to the elements it observes.
pub trait IntersectionWatcher<E> {
    fn observe(&self, element: &E);

    fn unobserve(&self, element: &E);

    /// Stops observing every element. The watcher stays inert afterwards.
    fn disconnect(&self);
}

/// Host environment the engine runs against.
///
/// All callbacks handed to the platform are invoked asynchronously from the
/// host event loop, never from inside the call that registered them.
pub trait Platform: 'static {
    type Element: Clone + 'static;
    type Watcher: IntersectionWatcher<Self::Element> + 'static;
    type Timer: Copy + Eq + fmt::Debug + 'static;

    fn element_id(&self, element: &Self::Element) -> ElementId;

    fn element_kind(&self, element: &Self::Element) -> ElementKind;

    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

    fn set_attribute(&self, element: &Self::Element, name: &str, value: &str);

    fn set_style(&self, element: &Self::Element, property: &str, value: &str);

    /// Installs load and error listeners, replacing any previous pair.
    fn listen_image_status(
        &self,
        element: &Self::Element,
        on_load: ElementCallback,
        on_error: ElementCallback,
    );

    /// Removes the load listener installed by [`Platform::listen_image_status`].
    /// The error listener stays in place.
    fn clear_load_listener(&self, element: &Self::Element);

    /// Drops everything the platform installed on `element` on the engine's
    /// behalf: load and error listeners and any bookkeeping keyed by it.
    /// Called when the element is unmounted.
    fn release(&self, element: &Self::Element);

    /// Capability probe for viewport intersection support.
    fn supports_intersection(&self) -> bool;

    /// Creates a watcher that reports crossings through `callback`.
    ///
    /// Returns `None` when the host refuses to construct one; the engine then
    /// degrades to eager loading.
    fn create_watcher(
        &self,
        options: &ObserverOptions,
        callback: IntersectionCallback<Self::Element>,
    ) -> Option<Self::Watcher>;

    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> Self::Timer;

    fn clear_timeout(&self, timer: Self::Timer);
}
