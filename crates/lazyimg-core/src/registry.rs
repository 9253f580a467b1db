//! Identity-keyed side tables.
//!
//! Both tables are pure lookups by [`ElementId`]. Nothing here enumerates
//! elements, so a platform could back them with a weak identity map without
//! any change in behavior.

use std::rc::Rc;

use web_time::Instant;

use crate::collections::map::HashMap;
use crate::platform::ElementId;

/// Element to watcher association. At most one watcher per element.
pub struct ObserverRegistry<W> {
    watchers: HashMap<ElementId, Rc<W>>,
}

impl<W> Default for ObserverRegistry<W> {
    fn default() -> Self {
        Self {
            watchers: HashMap::default(),
        }
    }
}

impl<W> ObserverRegistry<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `watcher` for `id` and returns the one it replaced.
    ///
    /// Unobserving the replaced watcher is the caller's job.
    pub fn set(&mut self, id: ElementId, watcher: Rc<W>) -> Option<Rc<W>> {
        self.watchers.insert(id, watcher)
    }

    pub fn get(&self, id: ElementId) -> Option<Rc<W>> {
        self.watchers.get(&id).cloned()
    }

    pub fn delete(&mut self, id: ElementId) -> Option<Rc<W>> {
        self.watchers.remove(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.watchers.contains_key(&id)
    }
}

/// Outstanding delayed commit for one element.
#[derive(Clone, Copy, Debug)]
pub struct PendingDelay<T> {
    pub timer: T,
    /// Distinguishes this timer from any earlier, already cancelled one.
    pub generation: u64,
    pub scheduled_at: Instant,
}

/// Element to pending-delay association. At most one timer per element.
pub struct PendingDelays<T> {
    entries: HashMap<ElementId, PendingDelay<T>>,
    next_generation: u64,
}

impl<T> Default for PendingDelays<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::default(),
            next_generation: 1,
        }
    }
}

impl<T: Copy> PendingDelays<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Hands out the generation for the next timer, before it is scheduled.
    pub fn next_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    /// Records a scheduled timer. A second timer for the same element is a
    /// caller bug; the existing entry is kept and the new one returned.
    pub fn insert(&mut self, id: ElementId, pending: PendingDelay<T>) -> Result<(), PendingDelay<T>> {
        if self.entries.contains_key(&id) {
            return Err(pending);
        }
        self.entries.insert(id, pending);
        Ok(())
    }

    pub fn take(&mut self, id: ElementId) -> Option<PendingDelay<T>> {
        self.entries.remove(&id)
    }

    /// Removes the entry only when it still belongs to `generation`.
    pub fn take_matching(&mut self, id: ElementId, generation: u64) -> Option<PendingDelay<T>> {
        match self.entries.get(&id) {
            Some(pending) if pending.generation == generation => self.entries.remove(&id),
            _ => None,
        }
    }
}

/// Current load attempt per element.
///
/// Every mount, update or forced load starts a new attempt. Load and error
/// listeners remember the attempt that installed them and stand down once a
/// newer one has started, so a late event from a replaced source cannot
/// touch the current one.
pub struct LoadAttempts {
    current: HashMap<ElementId, u64>,
    next: u64,
}

impl Default for LoadAttempts {
    fn default() -> Self {
        Self {
            current: HashMap::default(),
            next: 1,
        }
    }
}

impl LoadAttempts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, id: ElementId) -> u64 {
        let attempt = self.next;
        self.next += 1;
        self.current.insert(id, attempt);
        attempt
    }

    /// The running attempt, starting one if the element has none.
    pub fn current_or_begin(&mut self, id: ElementId) -> u64 {
        match self.current.get(&id) {
            Some(attempt) => *attempt,
            None => self.begin(id),
        }
    }

    pub fn is_current(&self, id: ElementId, attempt: u64) -> bool {
        self.current.get(&id) == Some(&attempt)
    }

    pub fn end(&mut self, id: ElementId) {
        self.current.remove(&id);
    }
}
