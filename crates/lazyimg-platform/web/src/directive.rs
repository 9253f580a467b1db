//! JavaScript-facing directive.
//!
//! Framework glue calls `mount`/`update`/`unmount` from its element
//! lifecycle. A `null` or `undefined` element is ignored by every method.

use lazyimg_core::{ImageRequest, LazyImages, LOG_TARGET};
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::binding::{lazy_value, lifecycle, options_patch};
use crate::platform::WebPlatform;

#[wasm_bindgen]
pub struct LazyDirective {
    lazy: LazyImages<WebPlatform>,
}

#[wasm_bindgen]
impl LazyDirective {
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> LazyDirective {
        LazyDirective {
            lazy: LazyImages::with_options(WebPlatform::new(), options_patch(&options)),
        }
    }

    /// Merges `options` into the configuration used by later mounts.
    pub fn config(&self, options: JsValue) {
        self.lazy.configure(options_patch(&options));
    }

    pub fn mount(&self, el: Option<HtmlElement>, binding: JsValue) {
        if let Some(el) = el {
            self.lazy.mount(&el, lazy_value(&binding));
        } else {
            log::debug!(target: LOG_TARGET, "mount called without an element");
        }
    }

    pub fn update(&self, el: Option<HtmlElement>, binding: JsValue) {
        if let Some(el) = el {
            self.lazy.update(&el, lazy_value(&binding));
        }
    }

    pub fn unmount(&self, el: Option<HtmlElement>) {
        if let Some(el) = el {
            self.lazy.unmount(&el);
        }
    }

    /// Applies a source right away, bypassing viewport detection. Only the
    /// hooks passed in `lifecycle` run; configured hooks do not.
    #[wasm_bindgen(js_name = loadImages)]
    pub fn load_images(
        &self,
        el: Option<HtmlElement>,
        src: String,
        srcset: Option<String>,
        sizes: Option<String>,
        error: Option<String>,
        hooks: JsValue,
    ) {
        let Some(el) = el else {
            return;
        };
        let mut request = ImageRequest::new(src).lifecycle(lifecycle(&hooks));
        if let Some(srcset) = srcset {
            request = request.srcset(srcset);
        }
        if let Some(sizes) = sizes {
            request = request.sizes(sizes);
        }
        if let Some(error) = error {
            request = request.error(error);
        }
        self.lazy.force_load(&el, request);
    }

    #[wasm_bindgen(js_name = isObserved)]
    pub fn is_observed(&self, el: &HtmlElement) -> bool {
        self.lazy.is_observed(el)
    }
}

impl LazyDirective {
    /// The engine behind the directive, for Rust callers.
    pub fn engine(&self) -> &LazyImages<WebPlatform> {
        &self.lazy
    }
}

impl Default for LazyDirective {
    fn default() -> Self {
        Self::new(JsValue::UNDEFINED)
    }
}
