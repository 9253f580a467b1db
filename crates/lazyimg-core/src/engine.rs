//! Engine facade handed to framework glue.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::applier::SRC_ATTRIBUTE;
use crate::lifecycle::{self, Phase};
use crate::logger::{DiagnosticSink, LOG_TARGET};
use crate::options::{LazyOptions, ObserverOptions, OptionsPatch};
use crate::platform::Platform;
use crate::registry::{LoadAttempts, ObserverRegistry, PendingDelays};
use crate::value::{format_value, ApplyTarget, ImageRequest, LazyValue, LoadDescriptor};

struct Settings<E> {
    options: LazyOptions<E>,
    sink: DiagnosticSink,
}

impl<E> Settings<E> {
    fn new(options: LazyOptions<E>) -> Self {
        let sink = DiagnosticSink::resolve(options.log, options.log_level);
        Self { options, sink }
    }
}

/// Shared engine state. Platform callbacks hold it weakly.
pub(crate) struct EngineCore<P: Platform> {
    pub(crate) platform: P,
    settings: RefCell<Settings<P::Element>>,
    pub(crate) registry: RefCell<ObserverRegistry<P::Watcher>>,
    pub(crate) pending: RefCell<PendingDelays<P::Timer>>,
    pub(crate) attempts: RefCell<LoadAttempts>,
}

impl<P: Platform> EngineCore<P> {
    pub(crate) fn diagnostic(&self, args: fmt::Arguments<'_>) {
        let sink = self.settings.borrow().sink;
        sink.emit(args);
    }

    pub(crate) fn begin_attempt(&self, element: &P::Element) {
        let id = self.platform.element_id(element);
        self.attempts.borrow_mut().begin(id);
    }

    pub(crate) fn observer_options(&self) -> ObserverOptions {
        self.settings.borrow().options.observer_options.clone()
    }

    fn describe(
        &self,
        element: &P::Element,
        value: LazyValue<P::Element>,
    ) -> LoadDescriptor<P::Element> {
        let target = ApplyTarget::from(self.platform.element_kind(element));
        let settings = self.settings.borrow();
        format_value(value, &settings.options, target)
    }
}

/// Lazy image loader bound to one platform.
///
/// Cloning is cheap and yields a handle to the same engine.
///
/// # Example
///
/// ```rust,ignore
/// let lazy = LazyImages::with_options(platform, OptionsPatch::new().delay(200));
/// lazy.mount(&img, LazyBinding::new("/photos/1.jpg").error("/img/broken.png"));
/// // later, when the framework re-renders with a new value
/// lazy.update(&img, "/photos/2.jpg");
/// // and when the element goes away
/// lazy.unmount(&img);
/// ```
pub struct LazyImages<P: Platform> {
    core: Rc<EngineCore<P>>,
}

impl<P: Platform> Clone for LazyImages<P> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<P: Platform> LazyImages<P> {
    /// Creates an engine with default options.
    pub fn new(platform: P) -> Self {
        Self::with_options(platform, OptionsPatch::default())
    }

    /// Creates an engine with defaults overlaid by `patch`.
    pub fn with_options(platform: P, patch: OptionsPatch<P::Element>) -> Self {
        let mut options = LazyOptions::default();
        options.merge(patch);
        Self {
            core: Rc::new(EngineCore {
                platform,
                settings: RefCell::new(Settings::new(options)),
                registry: RefCell::new(ObserverRegistry::new()),
                pending: RefCell::new(PendingDelays::new()),
                attempts: RefCell::new(LoadAttempts::new()),
            }),
        }
    }

    /// Merges `patch` into the configuration. Affects later mounts and updates.
    pub fn configure(&self, patch: OptionsPatch<P::Element>) {
        let mut settings = self.core.settings.borrow_mut();
        settings.options.merge(patch);
        settings.sink = DiagnosticSink::resolve(settings.options.log, settings.options.log_level);
    }

    /// Snapshot of the current configuration.
    pub fn options(&self) -> LazyOptions<P::Element> {
        self.core.settings.borrow().options.clone()
    }

    pub fn platform(&self) -> &P {
        &self.core.platform
    }

    /// Resolves `value` for `element` the way mount would.
    pub fn describe(
        &self,
        element: &P::Element,
        value: impl Into<LazyValue<P::Element>>,
    ) -> LoadDescriptor<P::Element> {
        self.core.describe(element, value.into())
    }

    /// Shows the loading placeholder and defers the real source until the
    /// element intersects the viewport.
    pub fn mount(&self, element: &P::Element, value: impl Into<LazyValue<P::Element>>) {
        let descriptor = self.core.describe(element, value.into());
        self.core.begin_attempt(element);
        lifecycle::notify(
            &self.core.platform,
            Phase::Loading,
            element,
            &descriptor.lifecycle,
        );
        self.core
            .platform
            .set_attribute(element, SRC_ATTRIBUTE, &descriptor.loading);
        self.core.start(element, descriptor);
    }

    /// Re-arms `element` with a new value. The current `src` stays in place
    /// until the new source is committed.
    pub fn update(&self, element: &P::Element, value: impl Into<LazyValue<P::Element>>) {
        self.core.teardown(element);
        let descriptor = self.core.describe(element, value.into());
        self.core.begin_attempt(element);
        lifecycle::notify(
            &self.core.platform,
            Phase::Loading,
            element,
            &descriptor.lifecycle,
        );
        self.core.start(element, descriptor);
    }

    /// Stops watching `element` and drops the listeners installed on it.
    /// Safe on elements that were never mounted.
    pub fn unmount(&self, element: &P::Element) {
        let id = self.core.platform.element_id(element);
        let watched = self.core.teardown(element);
        self.core.attempts.borrow_mut().end(id);
        self.core.platform.release(element);
        if watched {
            log::trace!(target: LOG_TARGET, "unmounted {id}");
        }
    }

    /// Applies `request` immediately, without waiting for visibility.
    pub fn force_load(&self, element: &P::Element, request: ImageRequest<P::Element>) {
        let target = ApplyTarget::from(self.core.platform.element_kind(element));
        self.core.begin_attempt(element);
        self.core.apply(element, target, request);
    }

    /// Whether a watcher is currently registered for `element`.
    pub fn is_observed(&self, element: &P::Element) -> bool {
        let id = self.core.platform.element_id(element);
        self.core.registry.borrow().contains(id)
    }

    /// Whether a delayed commit is outstanding for `element`.
    pub fn has_pending_delay(&self, element: &P::Element) -> bool {
        let id = self.core.platform.element_id(element);
        self.core.pending.borrow().contains(id)
    }
}
