//! [`Platform`] over `web-sys`.
//!
//! Elements are `HtmlElement`s. Viewport crossings come from
//! `IntersectionObserver`, delays from `window.setTimeout`, and completion
//! from the element's `onload`/`onerror` handlers. Every JS closure handed to
//! the browser is owned by a side table here or by the watcher, so dropping
//! the platform detaches everything it installed. Unmounting an element
//! removes its listener entry, so detached elements are not kept alive.

use std::cell::{Cell, OnceCell, RefCell};
use std::rc::Rc;

use js_sys::{Array, Object, Reflect, WeakMap};
use lazyimg_core::{
    ElementCallback, ElementId, ElementKind, IntersectionCallback, IntersectionEntry,
    IntersectionWatcher, ObserverOptions, Platform, TimerCallback, LOG_TARGET,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlElement, HtmlImageElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit,
};

/// Entries of one observer delivery. Scroll deliveries rarely carry more
/// than a handful of targets.
type EntryBatch = SmallVec<[IntersectionEntry<HtmlElement>; 4]>;

fn warn_js(action: &str, err: JsValue) {
    log::warn!(target: LOG_TARGET, "{action} failed: {err:?}");
}

fn has_property(target: &JsValue, name: &str) -> bool {
    Reflect::has(target, &JsValue::from_str(name)).unwrap_or(false)
}

/// `IntersectionObserver`, `IntersectionObserverEntry` and
/// `IntersectionObserverEntry.prototype.intersectionRatio` must all exist.
fn probe_intersection() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    if !has_property(&window, "IntersectionObserver")
        || !has_property(&window, "IntersectionObserverEntry")
    {
        return false;
    }
    Reflect::get(&window, &JsValue::from_str("IntersectionObserverEntry"))
        .and_then(|entry| Reflect::get(&entry, &JsValue::from_str("prototype")))
        .map(|prototype| has_property(&prototype, "intersectionRatio"))
        .unwrap_or(false)
}

struct ImageListeners {
    on_load: Option<Closure<dyn FnMut()>>,
    // Held only to keep the JS function alive.
    _on_error: Closure<dyn FnMut()>,
}

struct ScheduledTimer {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

struct WebState {
    ids: WeakMap,
    next_id: Cell<u64>,
    intersection: OnceCell<bool>,
    listeners: RefCell<FxHashMap<ElementId, ImageListeners>>,
    next_timer: Cell<u64>,
    timers: RefCell<FxHashMap<u64, ScheduledTimer>>,
}

/// Handle of a delayed commit. Stays unique even when the browser reuses
/// `setTimeout` handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WebTimer(u64);

/// Browser host. Clones share the same id table, listeners and timers.
#[derive(Clone)]
pub struct WebPlatform {
    state: Rc<WebState>,
}

impl Default for WebPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl WebPlatform {
    pub fn new() -> Self {
        Self {
            state: Rc::new(WebState {
                ids: WeakMap::new(),
                next_id: Cell::new(1),
                intersection: OnceCell::new(),
                listeners: RefCell::new(FxHashMap::default()),
                next_timer: Cell::new(1),
                timers: RefCell::new(FxHashMap::default()),
            }),
        }
    }

    /// Number of delayed commits waiting on `setTimeout`.
    pub fn pending_timers(&self) -> usize {
        self.state.timers.borrow().len()
    }
}

impl Platform for WebPlatform {
    type Element = HtmlElement;
    type Watcher = WebWatcher;
    type Timer = WebTimer;

    fn element_id(&self, element: &HtmlElement) -> ElementId {
        let key: &Object = element.as_ref();
        if let Some(id) = self.state.ids.get(key).as_f64() {
            return ElementId(id as u64);
        }
        let id = self.state.next_id.get();
        self.state.next_id.set(id + 1);
        self.state.ids.set(key, &JsValue::from_f64(id as f64));
        ElementId(id)
    }

    fn element_kind(&self, element: &HtmlElement) -> ElementKind {
        if element.dyn_ref::<HtmlImageElement>().is_some() {
            ElementKind::Image
        } else {
            ElementKind::Other
        }
    }

    fn attribute(&self, element: &HtmlElement, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn set_attribute(&self, element: &HtmlElement, name: &str, value: &str) {
        if let Err(err) = element.set_attribute(name, value) {
            warn_js("setAttribute", err);
        }
    }

    fn set_style(&self, element: &HtmlElement, property: &str, value: &str) {
        if let Err(err) = element.style().set_property(property, value) {
            warn_js("style.setProperty", err);
        }
    }

    fn listen_image_status(
        &self,
        element: &HtmlElement,
        on_load: ElementCallback,
        on_error: ElementCallback,
    ) {
        let on_load = Closure::wrap(on_load);
        let on_error = Closure::wrap(on_error);
        element.set_onload(Some(on_load.as_ref().unchecked_ref()));
        element.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        let id = self.element_id(element);
        let replaced = self.state.listeners.borrow_mut().insert(
            id,
            ImageListeners {
                on_load: Some(on_load),
                _on_error: on_error,
            },
        );
        drop(replaced);
    }

    fn clear_load_listener(&self, element: &HtmlElement) {
        element.set_onload(None);
        let id = self.element_id(element);
        let retired = self
            .state
            .listeners
            .borrow_mut()
            .get_mut(&id)
            .and_then(|listeners| listeners.on_load.take());
        drop(retired);
    }

    fn release(&self, element: &HtmlElement) {
        element.set_onload(None);
        element.set_onerror(None);
        let id = self.element_id(element);
        let released = self.state.listeners.borrow_mut().remove(&id);
        drop(released);
    }

    fn supports_intersection(&self) -> bool {
        *self.state.intersection.get_or_init(probe_intersection)
    }

    fn create_watcher(
        &self,
        options: &ObserverOptions,
        mut callback: IntersectionCallback<HtmlElement>,
    ) -> Option<WebWatcher> {
        let deliver = Closure::wrap(Box::new(move |entries: Array| {
            let batch: EntryBatch = entries
                .iter()
                .filter_map(|value| {
                    let entry = value.dyn_into::<IntersectionObserverEntry>().ok()?;
                    let target = entry.target().dyn_into::<HtmlElement>().ok()?;
                    Some(IntersectionEntry::new(target, entry.is_intersecting()))
                })
                .collect();
            callback(&batch);
        }) as Box<dyn FnMut(Array)>);

        let init = IntersectionObserverInit::new();
        init.set_root_margin(&options.root_margin);
        init.set_threshold(&JsValue::from_f64(options.threshold));

        match IntersectionObserver::new_with_options(deliver.as_ref().unchecked_ref(), &init) {
            Ok(observer) => Some(WebWatcher {
                observer,
                _deliver: deliver,
            }),
            Err(err) => {
                warn_js("IntersectionObserver construction", err);
                None
            }
        }
    }

    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> WebTimer {
        let timer = WebTimer(self.state.next_timer.get());
        self.state.next_timer.set(timer.0 + 1);

        let Some(window) = web_sys::window() else {
            log::warn!(target: LOG_TARGET, "no window, delayed commit {timer:?} dropped");
            return timer;
        };

        let state = Rc::downgrade(&self.state);
        let fire = Closure::once(move || {
            let finished = state
                .upgrade()
                .and_then(|state| state.timers.borrow_mut().remove(&timer.0));
            callback();
            drop(finished);
        });

        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            fire.as_ref().unchecked_ref(),
            delay,
        ) {
            Ok(handle) => {
                self.state.timers.borrow_mut().insert(
                    timer.0,
                    ScheduledTimer {
                        handle,
                        _callback: fire,
                    },
                );
            }
            Err(err) => warn_js("setTimeout", err),
        }
        timer
    }

    fn clear_timeout(&self, timer: WebTimer) {
        let scheduled = self.state.timers.borrow_mut().remove(&timer.0);
        if let (Some(scheduled), Some(window)) = (scheduled, web_sys::window()) {
            window.clear_timeout_with_handle(scheduled.handle);
        }
    }
}

/// One `IntersectionObserver` plus the closure it reports through.
///
/// Dropping the watcher disconnects the observer so the browser never calls
/// into a freed closure.
pub struct WebWatcher {
    observer: IntersectionObserver,
    _deliver: Closure<dyn FnMut(Array)>,
}

impl IntersectionWatcher<HtmlElement> for WebWatcher {
    fn observe(&self, element: &HtmlElement) {
        self.observer.observe(element);
    }

    fn unobserve(&self, element: &HtmlElement) {
        self.observer.unobserve(element);
    }

    fn disconnect(&self) {
        self.observer.disconnect();
    }
}

impl Drop for WebWatcher {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
