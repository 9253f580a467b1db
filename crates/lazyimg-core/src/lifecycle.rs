//! Load phases and user hooks.

use std::fmt;
use std::rc::Rc;

use crate::platform::Platform;

/// Attribute carrying the current phase of an element.
pub const PHASE_ATTRIBUTE: &str = "lazy";

/// Phase of a single load attempt.
///
/// Attempts move `Loading -> Loaded` or `Loading -> Error`; an update starts
/// a new attempt from `Loading`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Loading,
    Loaded,
    Error,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Loading => "loading",
            Phase::Loaded => "loaded",
            Phase::Error => "error",
        }
    }

    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "loading" => Some(Phase::Loading),
            "loaded" => Some(Phase::Loaded),
            "error" => Some(Phase::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type LifecycleHook<E> = Rc<dyn Fn(&E)>;

/// Optional per-phase callbacks, each invoked with the element.
pub struct Lifecycle<E> {
    pub loading: Option<LifecycleHook<E>>,
    pub loaded: Option<LifecycleHook<E>>,
    pub error: Option<LifecycleHook<E>>,
}

impl<E> Default for Lifecycle<E> {
    fn default() -> Self {
        Self {
            loading: None,
            loaded: None,
            error: None,
        }
    }
}

impl<E> Clone for Lifecycle<E> {
    fn clone(&self) -> Self {
        Self {
            loading: self.loading.clone(),
            loaded: self.loaded.clone(),
            error: self.error.clone(),
        }
    }
}

impl<E> fmt::Debug for Lifecycle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("loading", &self.loading.as_ref().map(|_| "Some(...)"))
            .field("loaded", &self.loaded.as_ref().map(|_| "Some(...)"))
            .field("error", &self.error.as_ref().map(|_| "Some(...)"))
            .finish()
    }
}

impl<E> Lifecycle<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_loading(mut self, hook: impl Fn(&E) + 'static) -> Self {
        self.loading = Some(Rc::new(hook));
        self
    }

    pub fn on_loaded(mut self, hook: impl Fn(&E) + 'static) -> Self {
        self.loaded = Some(Rc::new(hook));
        self
    }

    pub fn on_error(mut self, hook: impl Fn(&E) + 'static) -> Self {
        self.error = Some(Rc::new(hook));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.loading.is_none() && self.loaded.is_none() && self.error.is_none()
    }

    pub fn hook(&self, phase: Phase) -> Option<&LifecycleHook<E>> {
        match phase {
            Phase::Loading => self.loading.as_ref(),
            Phase::Loaded => self.loaded.as_ref(),
            Phase::Error => self.error.as_ref(),
        }
    }

    /// Overlays every hook present in `other`.
    pub fn merge(&mut self, other: Lifecycle<E>) {
        if other.loading.is_some() {
            self.loading = other.loading;
        }
        if other.loaded.is_some() {
            self.loaded = other.loaded;
        }
        if other.error.is_some() {
            self.error = other.error;
        }
    }
}

/// Marks `element` with `phase` and runs the matching hook, if any.
///
/// Phase order is not checked here; callers drive transitions.
pub(crate) fn notify<P: Platform>(
    platform: &P,
    phase: Phase,
    element: &P::Element,
    lifecycle: &Lifecycle<P::Element>,
) {
    platform.set_attribute(element, PHASE_ATTRIBUTE, phase.as_str());
    if let Some(hook) = lifecycle.hook(phase) {
        hook(element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_round_trip() {
        for phase in [Phase::Loading, Phase::Loaded, Phase::Error] {
            assert_eq!(Phase::from_marker(phase.as_str()), Some(phase));
        }
        assert_eq!(Phase::from_marker("pending"), None);
    }

    #[test]
    fn hook_lookup_follows_phase() {
        let lifecycle = Lifecycle::<u8>::new().on_error(|_| {});
        assert!(lifecycle.hook(Phase::Error).is_some());
        assert!(lifecycle.hook(Phase::Loading).is_none());
        assert!(!lifecycle.is_empty());
        assert!(Lifecycle::<u8>::new().is_empty());
    }
}
