//! In-memory host with a virtual clock.
//!
//! Nothing happens on its own: intersection crossings, image completion and
//! the passage of time are all driven explicitly by the test.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use lazyimg_core::{
    ElementCallback, ElementId, ElementKind, IntersectionCallback, IntersectionEntry,
    IntersectionWatcher, ObserverOptions, Phase, Platform, TimerCallback, PHASE_ATTRIBUTE,
    SRC_ATTRIBUTE,
};

struct ElementNode {
    id: ElementId,
    tag: String,
    attributes: RefCell<BTreeMap<String, String>>,
    style: RefCell<BTreeMap<String, String>>,
    attribute_writes: RefCell<Vec<(String, String)>>,
    visible: Cell<bool>,
    load_listener: RefCell<Option<ElementCallback>>,
    load_epoch: Cell<u64>,
    error_listener: RefCell<Option<ElementCallback>>,
    error_epoch: Cell<u64>,
}

/// Element handle. Clones refer to the same element.
#[derive(Clone)]
pub struct TestElement {
    node: Rc<ElementNode>,
}

impl TestElement {
    fn new(id: ElementId, tag: &str) -> Self {
        Self {
            node: Rc::new(ElementNode {
                id,
                tag: tag.to_ascii_lowercase(),
                attributes: RefCell::new(BTreeMap::new()),
                style: RefCell::new(BTreeMap::new()),
                attribute_writes: RefCell::new(Vec::new()),
                visible: Cell::new(false),
                load_listener: RefCell::new(None),
                load_epoch: Cell::new(0),
                error_listener: RefCell::new(None),
                error_epoch: Cell::new(0),
            }),
        }
    }

    pub fn id(&self) -> ElementId {
        self.node.id
    }

    pub fn tag(&self) -> &str {
        &self.node.tag
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.node.attributes.borrow().get(name).cloned()
    }

    pub fn src(&self) -> Option<String> {
        self.attribute(SRC_ATTRIBUTE)
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.node.style.borrow().get(property).cloned()
    }

    /// Phase marker currently set on the element.
    pub fn phase(&self) -> Option<Phase> {
        self.attribute(PHASE_ATTRIBUTE)
            .as_deref()
            .and_then(Phase::from_marker)
    }

    /// Every value ever written to `name`, oldest first.
    pub fn writes_of(&self, name: &str) -> Vec<String> {
        self.node
            .attribute_writes
            .borrow()
            .iter()
            .filter(|(written, _)| written == name)
            .map(|(_, value)| value.clone())
            .collect()
    }

    pub fn is_visible(&self) -> bool {
        self.node.visible.get()
    }

    pub fn has_load_listener(&self) -> bool {
        self.node.load_listener.borrow().is_some()
    }

    pub fn has_error_listener(&self) -> bool {
        self.node.error_listener.borrow().is_some()
    }

    fn write_attribute(&self, name: &str, value: &str) {
        self.node
            .attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
        self.node
            .attribute_writes
            .borrow_mut()
            .push((name.to_string(), value.to_string()));
    }

    /// Runs the listener in `slot`. It is put back afterwards unless it was
    /// replaced or cleared while running.
    fn fire(slot: &RefCell<Option<ElementCallback>>, epoch: &Cell<u64>) -> bool {
        let before = epoch.get();
        let listener = slot.borrow_mut().take();
        let Some(mut listener) = listener else {
            return false;
        };
        listener();
        if epoch.get() == before {
            let mut slot = slot.borrow_mut();
            if slot.is_none() {
                *slot = Some(listener);
            }
        }
        true
    }
}

impl PartialEq for TestElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for TestElement {}

impl fmt::Debug for TestElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestElement")
            .field("id", &self.node.id)
            .field("tag", &self.node.tag)
            .field("attributes", &self.node.attributes.borrow())
            .finish()
    }
}

struct WatcherState {
    options: ObserverOptions,
    observed: RefCell<Vec<ElementId>>,
    callback: RefCell<Option<IntersectionCallback<TestElement>>>,
    disconnected: Cell<bool>,
}

impl WatcherState {
    fn is_observing(&self, id: ElementId) -> bool {
        self.observed.borrow().contains(&id)
    }

    fn deliver(&self, entries: &[IntersectionEntry<TestElement>]) {
        let callback = self.callback.borrow_mut().take();
        let Some(mut callback) = callback else {
            return;
        };
        callback(entries);
        let mut slot = self.callback.borrow_mut();
        if slot.is_none() {
            *slot = Some(callback);
        }
    }
}

/// Watcher handed to the engine.
pub struct TestWatcher {
    state: Rc<WatcherState>,
    platform: Weak<PlatformState>,
}

impl TestWatcher {
    pub fn options(&self) -> &ObserverOptions {
        &self.state.options
    }

    pub fn is_disconnected(&self) -> bool {
        self.state.disconnected.get()
    }
}

impl IntersectionWatcher<TestElement> for TestWatcher {
    fn observe(&self, element: &TestElement) {
        let id = element.id();
        {
            let mut observed = self.state.observed.borrow_mut();
            if observed.contains(&id) {
                return;
            }
            observed.push(id);
        }
        if let Some(platform) = self.platform.upgrade() {
            platform
                .initial_deliveries
                .borrow_mut()
                .push((Rc::downgrade(&self.state), element.clone()));
        }
    }

    fn unobserve(&self, element: &TestElement) {
        let id = element.id();
        self.state.observed.borrow_mut().retain(|observed| *observed != id);
    }

    fn disconnect(&self) {
        self.state.observed.borrow_mut().clear();
        self.state.disconnected.set(true);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestTimer(pub u64);

struct ScheduledTimer {
    due_ms: u64,
    callback: TimerCallback,
}

struct PlatformState {
    next_element: Cell<u64>,
    intersection_supported: Cell<bool>,
    refuse_watchers: Cell<bool>,
    now_ms: Cell<u64>,
    next_timer: Cell<u64>,
    timers: RefCell<BTreeMap<TestTimer, ScheduledTimer>>,
    watchers: RefCell<Vec<Weak<WatcherState>>>,
    watchers_created: Cell<usize>,
    initial_deliveries: RefCell<Vec<(Weak<WatcherState>, TestElement)>>,
}

/// Deterministic [`Platform`]. Clones share the same document and clock.
#[derive(Clone)]
pub struct TestPlatform {
    state: Rc<PlatformState>,
}

impl Default for TestPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPlatform {
    pub fn new() -> Self {
        Self {
            state: Rc::new(PlatformState {
                next_element: Cell::new(1),
                intersection_supported: Cell::new(true),
                refuse_watchers: Cell::new(false),
                now_ms: Cell::new(0),
                next_timer: Cell::new(1),
                timers: RefCell::new(BTreeMap::new()),
                watchers: RefCell::new(Vec::new()),
                watchers_created: Cell::new(0),
                initial_deliveries: RefCell::new(Vec::new()),
            }),
        }
    }

    /// A platform whose capability probe reports no intersection support.
    pub fn without_intersection_support() -> Self {
        let platform = Self::new();
        platform.set_intersection_supported(false);
        platform
    }

    pub fn set_intersection_supported(&self, supported: bool) {
        self.state.intersection_supported.set(supported);
    }

    /// Makes every later watcher construction fail.
    pub fn refuse_watchers(&self, refuse: bool) {
        self.state.refuse_watchers.set(refuse);
    }

    pub fn create_element(&self, tag: &str) -> TestElement {
        let id = self.state.next_element.get();
        self.state.next_element.set(id + 1);
        TestElement::new(ElementId(id), tag)
    }

    pub fn image(&self) -> TestElement {
        self.create_element("img")
    }

    pub fn div(&self) -> TestElement {
        self.create_element("div")
    }

    pub fn now_ms(&self) -> u64 {
        self.state.now_ms.get()
    }

    pub fn pending_timers(&self) -> usize {
        self.state.timers.borrow().len()
    }

    pub fn watchers_created(&self) -> usize {
        self.state.watchers_created.get()
    }

    /// Number of live watchers currently observing `element`.
    pub fn watchers_observing(&self, element: &TestElement) -> usize {
        self.state
            .watchers
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|watcher| watcher.is_observing(element.id()))
            .count()
    }

    /// Moves `element` across the viewport edge and notifies its watchers.
    pub fn set_intersecting(&self, element: &TestElement, intersecting: bool) {
        element.node.visible.set(intersecting);
        self.state
            .initial_deliveries
            .borrow_mut()
            .retain(|(_, queued)| queued != element);

        let watchers: Vec<Rc<WatcherState>> = self
            .state
            .watchers
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|watcher| watcher.is_observing(element.id()))
            .collect();
        let entries = [IntersectionEntry::new(element.clone(), intersecting)];
        for watcher in watchers {
            if watcher.is_observing(element.id()) {
                watcher.deliver(&entries);
            }
        }
    }

    /// Delivers the initial entry a freshly observing watcher receives,
    /// reflecting the element's current visibility.
    pub fn flush_observers(&self) -> usize {
        let queued = std::mem::take(&mut *self.state.initial_deliveries.borrow_mut());
        let mut delivered = 0;
        for (watcher, element) in queued {
            let Some(watcher) = watcher.upgrade() else {
                continue;
            };
            if !watcher.is_observing(element.id()) {
                continue;
            }
            let entries = [IntersectionEntry::new(element.clone(), element.is_visible())];
            watcher.deliver(&entries);
            delivered += 1;
        }
        delivered
    }

    /// Advances the virtual clock, firing due timers in order.
    pub fn advance(&self, ms: u64) {
        let target = self.state.now_ms.get() + ms;
        loop {
            let next = {
                let timers = self.state.timers.borrow();
                timers
                    .iter()
                    .filter(|(_, timer)| timer.due_ms <= target)
                    .min_by_key(|(handle, timer)| (timer.due_ms, **handle))
                    .map(|(handle, _)| *handle)
            };
            let Some(handle) = next else {
                break;
            };
            let timer = self.state.timers.borrow_mut().remove(&handle);
            if let Some(timer) = timer {
                self.state.now_ms.set(timer.due_ms);
                (timer.callback)();
            }
        }
        self.state.now_ms.set(target);
    }

    /// Reports a successful load. Returns whether a listener ran.
    pub fn finish_load(&self, element: &TestElement) -> bool {
        TestElement::fire(&element.node.load_listener, &element.node.load_epoch)
    }

    /// Reports a failed load. Returns whether a listener ran.
    pub fn fail_load(&self, element: &TestElement) -> bool {
        TestElement::fire(&element.node.error_listener, &element.node.error_epoch)
    }
}

impl Platform for TestPlatform {
    type Element = TestElement;
    type Watcher = TestWatcher;
    type Timer = TestTimer;

    fn element_id(&self, element: &TestElement) -> ElementId {
        element.id()
    }

    fn element_kind(&self, element: &TestElement) -> ElementKind {
        if element.tag() == "img" {
            ElementKind::Image
        } else {
            ElementKind::Other
        }
    }

    fn attribute(&self, element: &TestElement, name: &str) -> Option<String> {
        element.attribute(name)
    }

    fn set_attribute(&self, element: &TestElement, name: &str, value: &str) {
        element.write_attribute(name, value);
    }

    fn set_style(&self, element: &TestElement, property: &str, value: &str) {
        element
            .node
            .style
            .borrow_mut()
            .insert(property.to_string(), value.to_string());
    }

    fn listen_image_status(
        &self,
        element: &TestElement,
        on_load: ElementCallback,
        on_error: ElementCallback,
    ) {
        let node = &element.node;
        *node.load_listener.borrow_mut() = Some(on_load);
        node.load_epoch.set(node.load_epoch.get() + 1);
        *node.error_listener.borrow_mut() = Some(on_error);
        node.error_epoch.set(node.error_epoch.get() + 1);
    }

    fn clear_load_listener(&self, element: &TestElement) {
        let node = &element.node;
        *node.load_listener.borrow_mut() = None;
        node.load_epoch.set(node.load_epoch.get() + 1);
    }

    fn release(&self, element: &TestElement) {
        let node = &element.node;
        let load = node.load_listener.borrow_mut().take();
        node.load_epoch.set(node.load_epoch.get() + 1);
        let error = node.error_listener.borrow_mut().take();
        node.error_epoch.set(node.error_epoch.get() + 1);
        drop((load, error));
    }

    fn supports_intersection(&self) -> bool {
        self.state.intersection_supported.get()
    }

    fn create_watcher(
        &self,
        options: &ObserverOptions,
        callback: IntersectionCallback<TestElement>,
    ) -> Option<TestWatcher> {
        if self.state.refuse_watchers.get() {
            return None;
        }
        let state = Rc::new(WatcherState {
            options: options.clone(),
            observed: RefCell::new(Vec::new()),
            callback: RefCell::new(Some(callback)),
            disconnected: Cell::new(false),
        });
        {
            let mut watchers = self.state.watchers.borrow_mut();
            watchers.retain(|watcher| watcher.strong_count() > 0);
            watchers.push(Rc::downgrade(&state));
        }
        self.state
            .watchers_created
            .set(self.state.watchers_created.get() + 1);
        Some(TestWatcher {
            state,
            platform: Rc::downgrade(&self.state),
        })
    }

    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> TestTimer {
        let handle = TestTimer(self.state.next_timer.get());
        self.state.next_timer.set(handle.0 + 1);
        self.state.timers.borrow_mut().insert(
            handle,
            ScheduledTimer {
                due_ms: self.state.now_ms.get() + u64::from(delay_ms),
                callback,
            },
        );
        handle
    }

    fn clear_timeout(&self, timer: TestTimer) {
        self.state.timers.borrow_mut().remove(&timer);
    }
}
