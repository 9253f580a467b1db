//! Writes committed sources to elements and tracks their completion.

use std::rc::Rc;

use crate::engine::EngineCore;
use crate::lifecycle::{self, Lifecycle, Phase};
use crate::logger::LOG_TARGET;
use crate::platform::{IntersectionWatcher, Platform};
use crate::value::{ApplyTarget, ImageRequest};

pub const SRC_ATTRIBUTE: &str = "src";
pub const SRCSET_ATTRIBUTE: &str = "srcset";
pub const SIZES_ATTRIBUTE: &str = "sizes";
pub const BACKGROUND_IMAGE: &str = "background-image";

/// Sources of a committed load, kept for the failure path.
struct FailedLoad {
    src: String,
    srcset: Option<String>,
    sizes: Option<String>,
    error: Option<String>,
}

/// Writes `value` unless it is empty or already current, so an unchanged
/// source does not trigger a reload.
fn set_if_changed<P: Platform>(platform: &P, element: &P::Element, name: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    if platform.attribute(element, name).as_deref() != Some(value) {
        platform.set_attribute(element, name, value);
    }
}

impl<P: Platform> EngineCore<P> {
    pub(crate) fn apply(
        self: &Rc<Self>,
        element: &P::Element,
        target: ApplyTarget,
        request: ImageRequest<P::Element>,
    ) {
        match target {
            ApplyTarget::Image => self.apply_to_image(element, request),
            ApplyTarget::Background => {
                let value = format!("url('{}')", request.src);
                self.platform.set_style(element, BACKGROUND_IMAGE, &value);
            }
        }
    }

    fn apply_to_image(self: &Rc<Self>, element: &P::Element, request: ImageRequest<P::Element>) {
        let ImageRequest {
            src,
            srcset,
            sizes,
            error,
            lifecycle,
        } = request;

        set_if_changed(&self.platform, element, SRC_ATTRIBUTE, &src);
        if let Some(srcset) = srcset.as_deref() {
            set_if_changed(&self.platform, element, SRCSET_ATTRIBUTE, srcset);
        }
        if let Some(sizes) = sizes.as_deref() {
            set_if_changed(&self.platform, element, SIZES_ATTRIBUTE, sizes);
        }

        let id = self.platform.element_id(element);
        let attempt = self.attempts.borrow_mut().current_or_begin(id);

        let on_load = {
            let core = Rc::downgrade(self);
            let element = element.clone();
            let lifecycle = lifecycle.clone();
            Box::new(move || {
                if let Some(core) = core.upgrade() {
                    if core.is_current_attempt(&element, attempt) {
                        core.on_image_loaded(&element, &lifecycle);
                    }
                }
            })
        };
        let on_error = {
            let core = Rc::downgrade(self);
            let element = element.clone();
            let failed = FailedLoad {
                src,
                srcset,
                sizes,
                error,
            };
            Box::new(move || {
                if let Some(core) = core.upgrade() {
                    if core.is_current_attempt(&element, attempt) {
                        core.on_image_failed(&element, &failed, &lifecycle);
                    }
                }
            })
        };
        self.platform.listen_image_status(element, on_load, on_error);
    }

    fn is_current_attempt(&self, element: &P::Element, attempt: u64) -> bool {
        let id = self.platform.element_id(element);
        let current = self.attempts.borrow().is_current(id, attempt);
        if !current {
            log::trace!(target: LOG_TARGET, "ignoring completion of superseded load on {id}");
        }
        current
    }

    fn on_image_loaded(&self, element: &P::Element, lifecycle: &Lifecycle<P::Element>) {
        self.platform.clear_load_listener(element);
        lifecycle::notify(&self.platform, Phase::Loaded, element, lifecycle);
    }

    fn on_image_failed(
        &self,
        element: &P::Element,
        failed: &FailedLoad,
        lifecycle: &Lifecycle<P::Element>,
    ) {
        self.platform.clear_load_listener(element);
        lifecycle::notify(&self.platform, Phase::Error, element, lifecycle);

        let id = self.platform.element_id(element);
        let watcher = self.registry.borrow().get(id);
        if let Some(watcher) = watcher {
            watcher.disconnect();
        }

        if let Some(error) = failed.error.as_deref() {
            set_if_changed(&self.platform, element, SRC_ATTRIBUTE, error);
        }

        self.diagnostic(format_args!(
            "Image failed to load! Failed src was: {}; srcset was: {}; sizes were: {}",
            failed.src,
            failed.srcset.as_deref().unwrap_or_default(),
            failed.sizes.as_deref().unwrap_or_default(),
        ));
    }
}
