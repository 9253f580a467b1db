//! Conversion of JavaScript payloads into engine types.
//!
//! Accepted shapes mirror what a directive receives from templates:
//!
//! ```js
//! "photo.jpg"
//! { src, srcset, sizes, loading, error, delay, lifecycle: { loading, loaded, error } }
//! { loading, error, log, logLevel, delay, lifecycle, observerOptions: { rootMargin, threshold } }
//! ```
//!
//! `null` and `undefined` fields count as absent. Fields of the wrong type are
//! ignored. A negative binding `delay` overrides the configured delay and
//! loads on the first crossing.

use js_sys::{Function, Reflect};
use lazyimg_core::{
    LazyBinding, LazyValue, Lifecycle, LogLevel, ObserverOptions, OptionsPatch, LOG_TARGET,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

fn field(object: &JsValue, key: &str) -> Option<JsValue> {
    let value = Reflect::get(object, &JsValue::from_str(key)).ok()?;
    if value.is_undefined() || value.is_null() {
        None
    } else {
        Some(value)
    }
}

fn string_field(object: &JsValue, key: &str) -> Option<String> {
    field(object, key)?.as_string()
}

fn delay_field(object: &JsValue) -> Option<f64> {
    field(object, "delay")?
        .as_f64()
        .filter(|delay| delay.is_finite())
}

fn millis(delay: f64) -> u32 {
    delay.clamp(0.0, f64::from(u32::MAX)) as u32
}

fn hook(hooks: &JsValue, phase: &'static str) -> Option<impl Fn(&HtmlElement) + 'static> {
    let function: Function = field(hooks, phase)?.dyn_into().ok()?;
    Some(move |element: &HtmlElement| {
        if let Err(err) = function.call1(&JsValue::NULL, element) {
            log::warn!(target: LOG_TARGET, "{phase} hook threw: {err:?}");
        }
    })
}

fn lifecycle_field(object: &JsValue) -> Option<Lifecycle<HtmlElement>> {
    field(object, "lifecycle").map(|hooks| lifecycle(&hooks))
}

/// Reads a `{ loading, loaded, error }` hook object. Missing or
/// non-function entries are skipped; anything but an object has no hooks.
pub fn lifecycle(hooks: &JsValue) -> Lifecycle<HtmlElement> {
    let mut lifecycle = Lifecycle::new();
    if let Some(hook) = hook(hooks, "loading") {
        lifecycle = lifecycle.on_loading(hook);
    }
    if let Some(hook) = hook(hooks, "loaded") {
        lifecycle = lifecycle.on_loaded(hook);
    }
    if let Some(hook) = hook(hooks, "error") {
        lifecycle = lifecycle.on_error(hook);
    }
    lifecycle
}

fn observer_options_field(object: &JsValue) -> Option<ObserverOptions> {
    let options = field(object, "observerOptions")?;
    let defaults = ObserverOptions::default();
    Some(ObserverOptions::new(
        string_field(&options, "rootMargin").unwrap_or(defaults.root_margin),
        field(&options, "threshold")
            .and_then(|threshold| threshold.as_f64())
            .unwrap_or(defaults.threshold),
    ))
}

/// Reads a binding: either a bare string source or an object payload.
pub fn lazy_value(value: &JsValue) -> LazyValue<HtmlElement> {
    if let Some(src) = value.as_string() {
        return LazyValue::Source(src);
    }
    if !value.is_object() {
        return LazyValue::Source(String::new());
    }

    let mut binding = LazyBinding::new(string_field(value, "src").unwrap_or_default());
    if let Some(srcset) = string_field(value, "srcset") {
        binding = binding.srcset(srcset);
    }
    if let Some(sizes) = string_field(value, "sizes") {
        binding = binding.sizes(sizes);
    }
    if let Some(loading) = string_field(value, "loading") {
        binding = binding.loading(loading);
    }
    if let Some(error) = string_field(value, "error") {
        binding = binding.error(error);
    }
    if let Some(lifecycle) = lifecycle_field(value) {
        binding = binding.lifecycle(lifecycle);
    }
    // A negative delay still wins over the configured one, and then means
    // "no delay".
    match delay_field(value) {
        Some(delay) if delay < 0.0 => binding = binding.immediate(),
        Some(delay) => binding = binding.delay(millis(delay)),
        None => {}
    }
    LazyValue::Binding(binding)
}

/// Reads an options object into a patch. Anything but an object is empty.
pub fn options_patch(options: &JsValue) -> OptionsPatch<HtmlElement> {
    let mut patch = OptionsPatch::new();
    if !options.is_object() {
        return patch;
    }

    if let Some(loading) = string_field(options, "loading") {
        patch = patch.loading(loading);
    }
    if let Some(error) = string_field(options, "error") {
        patch = patch.error(error);
    }
    if let Some(observer_options) = observer_options_field(options) {
        patch = patch.observer_options(observer_options);
    }
    if let Some(log) = field(options, "log").and_then(|log| log.as_bool()) {
        patch = patch.log(log);
    }
    if let Some(level) = string_field(options, "logLevel") {
        match level.parse::<LogLevel>() {
            Ok(level) => patch = patch.log_level(level),
            Err(err) => log::warn!(target: LOG_TARGET, "ignoring logLevel: {err}"),
        }
    }
    if let Some(lifecycle) = lifecycle_field(options) {
        patch = patch.lifecycle(lifecycle);
    }
    if let Some(delay) = delay_field(options) {
        patch = patch.delay(millis(delay));
    }
    patch
}
