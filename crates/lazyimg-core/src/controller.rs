//! Intersection-driven state machine.
//!
//! Per element: unobserved, observing, pending delay, committed, disconnected.
//! A watcher commits at most once; a delayed commit is cancelled as soon as
//! the element leaves the viewport, and a cancelled timer can never commit
//! because its generation no longer matches the pending entry.

use std::cell::{Cell, OnceCell};
use std::rc::{Rc, Weak};

use web_time::Instant;

use crate::engine::EngineCore;
use crate::logger::LOG_TARGET;
use crate::platform::{
    ElementId, IntersectionCallback, IntersectionEntry, IntersectionWatcher, Platform,
};
use crate::registry::PendingDelay;
use crate::value::LoadDescriptor;

/// One armed watcher and everything it needs to commit.
struct Observation<P: Platform> {
    element: P::Element,
    id: ElementId,
    descriptor: LoadDescriptor<P::Element>,
    watcher: OnceCell<Weak<P::Watcher>>,
    committed: Cell<bool>,
}

impl<P: Platform> EngineCore<P> {
    /// Arms `element`, or loads it right away when the host cannot watch it.
    pub(crate) fn start(self: &Rc<Self>, element: &P::Element, descriptor: LoadDescriptor<P::Element>) {
        if !self.platform.supports_intersection() {
            self.diagnostic(format_args!(
                "IntersectionObserver is not supported, loading {} eagerly",
                descriptor.src
            ));
            self.apply(element, descriptor.target, descriptor.request());
            return;
        }
        self.observe(element, descriptor);
    }

    fn observe(self: &Rc<Self>, element: &P::Element, descriptor: LoadDescriptor<P::Element>) {
        self.teardown(element);

        let id = self.platform.element_id(element);
        let observation = Rc::new(Observation::<P> {
            element: element.clone(),
            id,
            descriptor,
            watcher: OnceCell::new(),
            committed: Cell::new(false),
        });

        let callback: IntersectionCallback<P::Element> = {
            let core = Rc::downgrade(self);
            let observation = observation.clone();
            Box::new(move |entries: &[IntersectionEntry<P::Element>]| {
                let Some(core) = core.upgrade() else {
                    return;
                };
                for entry in entries {
                    core.on_crossing(&observation, entry.is_intersecting);
                }
            })
        };

        let Some(watcher) = self.platform.create_watcher(&self.observer_options(), callback) else {
            self.diagnostic(format_args!(
                "could not create an intersection watcher, loading {} eagerly",
                observation.descriptor.src
            ));
            self.commit(&observation);
            return;
        };

        let watcher = Rc::new(watcher);
        let _ = observation.watcher.set(Rc::downgrade(&watcher));
        let previous = self.registry.borrow_mut().set(id, watcher.clone());
        if let Some(previous) = previous {
            previous.disconnect();
        }
        watcher.observe(element);
        log::trace!(target: LOG_TARGET, "observing {id}");
    }

    fn on_crossing(self: &Rc<Self>, observation: &Rc<Observation<P>>, is_intersecting: bool) {
        if observation.committed.get() {
            return;
        }
        match observation.descriptor.delay {
            None => {
                if is_intersecting {
                    self.commit(observation);
                }
            }
            Some(delay) => {
                if is_intersecting {
                    self.schedule_commit(observation, delay);
                } else {
                    self.cancel_pending(observation.id);
                }
            }
        }
    }

    fn schedule_commit(self: &Rc<Self>, observation: &Rc<Observation<P>>, delay: u32) {
        let generation = {
            let mut pending = self.pending.borrow_mut();
            if pending.contains(observation.id) {
                return;
            }
            pending.next_generation()
        };

        let timer = {
            let core = Rc::downgrade(self);
            let observation = observation.clone();
            self.platform.set_timeout(
                delay,
                Box::new(move || {
                    if let Some(core) = core.upgrade() {
                        core.on_delay_elapsed(&observation, generation);
                    }
                }),
            )
        };

        let inserted = self.pending.borrow_mut().insert(
            observation.id,
            PendingDelay {
                timer,
                generation,
                scheduled_at: Instant::now(),
            },
        );
        match inserted {
            Ok(()) => log::trace!(
                target: LOG_TARGET,
                "{} entered the viewport, committing in {delay}ms",
                observation.id
            ),
            Err(rejected) => self.platform.clear_timeout(rejected.timer),
        }
    }

    fn on_delay_elapsed(self: &Rc<Self>, observation: &Rc<Observation<P>>, generation: u64) {
        let taken = self
            .pending
            .borrow_mut()
            .take_matching(observation.id, generation);
        let Some(pending) = taken else {
            return;
        };
        log::debug!(
            target: LOG_TARGET,
            "delay for {} elapsed after {:?}",
            observation.id,
            pending.scheduled_at.elapsed()
        );
        self.commit(observation);
    }

    fn cancel_pending(&self, id: ElementId) {
        let taken = self.pending.borrow_mut().take(id);
        if let Some(pending) = taken {
            self.platform.clear_timeout(pending.timer);
            log::trace!(target: LOG_TARGET, "delayed commit for {id} cancelled");
        }
    }

    fn commit(self: &Rc<Self>, observation: &Rc<Observation<P>>) {
        if observation.committed.replace(true) {
            return;
        }
        if let Some(watcher) = observation.watcher.get().and_then(Weak::upgrade) {
            watcher.unobserve(&observation.element);
        }
        self.apply(
            &observation.element,
            observation.descriptor.target,
            observation.descriptor.request(),
        );
    }

    /// Cancels any delayed commit and drops the element's watcher.
    /// Returns whether a watcher was registered.
    pub(crate) fn teardown(&self, element: &P::Element) -> bool {
        let id = self.platform.element_id(element);
        self.cancel_pending(id);
        let previous = self.registry.borrow_mut().delete(id);
        match previous {
            Some(watcher) => {
                watcher.unobserve(element);
                watcher.disconnect();
                true
            }
            None => false,
        }
    }
}
