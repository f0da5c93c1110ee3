//! Observer ids and the per-signal observer table.
//!
//! The table is the only shared mutable resource in the engine. A dispatch
//! works on a snapshot of the entries, so observers may subscribe or
//! unsubscribe from inside a callback without disturbing the fan-out in
//! progress.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::transaction::Transaction;

/// Unique identifier for an observer registered on a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Generate a new unique observer ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ObserverId {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered callback.
pub(crate) struct Entry<T> {
    live: Cell<bool>,
    callback: Box<dyn Fn(&Transaction<T>)>,
}

impl<T> Entry<T> {
    /// Invoke the callback unless the entry was removed meanwhile.
    pub(crate) fn call(&self, transaction: &Transaction<T>) {
        if self.live.get() {
            (self.callback)(transaction);
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live.get()
    }
}

pub(crate) type Snapshot<T> = SmallVec<[Rc<Entry<T>>; 8]>;

/// Observers of one signal, in registration order.
pub(crate) struct ObserverTable<T> {
    entries: IndexMap<ObserverId, Rc<Entry<T>>>,
    /// Number of fan-outs currently walking a snapshot of this table.
    dispatching: usize,
    /// Entries unsubscribed mid-dispatch, removed once the fan-out ends.
    pending_removals: SmallVec<[ObserverId; 4]>,
}

impl<T> ObserverTable<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            dispatching: 0,
            pending_removals: SmallVec::new(),
        }
    }

    pub(crate) fn insert<F>(&mut self, id: ObserverId, callback: F) -> Rc<Entry<T>>
    where
        F: Fn(&Transaction<T>) + 'static,
    {
        let entry = Rc::new(Entry {
            live: Cell::new(true),
            callback: Box::new(callback),
        });
        self.entries.insert(id, Rc::clone(&entry));
        entry
    }

    /// Remove an observer. The entry stops receiving immediately; while a
    /// dispatch is running, the slot itself is reclaimed afterwards.
    pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
        let Some(entry) = self.entries.get(&id) else {
            return false;
        };
        if !entry.live.replace(false) {
            return false;
        }
        if self.dispatching > 0 {
            self.pending_removals.push(id);
        } else {
            self.entries.shift_remove(&id);
        }
        true
    }

    /// Start a fan-out and return the entries to deliver to.
    pub(crate) fn begin_dispatch(&mut self) -> Snapshot<T> {
        self.dispatching += 1;
        self.entries.values().cloned().collect()
    }

    /// Finish a fan-out, applying deferred removals once no fan-out is
    /// walking the table any more.
    pub(crate) fn end_dispatch(&mut self) {
        self.dispatching = self.dispatching.saturating_sub(1);
        if self.dispatching == 0 {
            for id in self.pending_removals.drain(..) {
                self.entries.shift_remove(&id);
            }
        }
    }

    /// Number of live observers.
    pub(crate) fn len(&self) -> usize {
        self.entries.values().filter(|entry| entry.is_live()).count()
    }
}
