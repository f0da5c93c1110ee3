//! Transaction-depth counting shared by the multi-parent signals.
//!
//! A node with several upstream paths (a combiner, a gate, a throttle
//! bridging a timer, a join following its outer and inner signals) can see
//! overlapping `Begin`...`End` windows within one cascade. `Settle` counts
//! them so the node emits a single window downstream:
//!
//! - `Begin` is forwarded only on the 0 → 1 depth transition.
//! - The closing transaction is forwarded only on the 1 → 0 transition: an
//!   `End` if something actionable happened during the window and a value
//!   can be produced, a `Cancel` otherwise.

use std::cell::Cell;

use tracing::warn;

use super::signal::Signal;
use super::transaction::Transaction;

#[derive(Debug, Default)]
pub(crate) struct Settle {
    depth: Cell<usize>,
    needs_update: Cell<bool>,
}

impl Settle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Open (or nest into) a window.
    pub(crate) fn begin<R>(&self, out: &Signal<R>)
    where
        R: Clone + 'static,
    {
        let depth = self.depth.get();
        self.depth.set(depth + 1);
        if depth == 0 {
            out.dispatch(&Transaction::Begin);
        }
    }

    /// Close one level of the window. `actionable` records that the closing
    /// parent delivered something worth recomputing for; `compute` is only
    /// run when the outermost window closes with an update pending.
    pub(crate) fn end<R, F>(&self, out: &Signal<R>, actionable: bool, compute: F)
    where
        R: Clone + 'static,
        F: FnOnce() -> Option<R>,
    {
        if self.depth.get() == 0 {
            // A parent ended a window this node never saw begin, e.g. when
            // it subscribed in the middle of an update. Open one so the
            // downstream pairing stays intact.
            warn!(signal = out.id(), "transaction closed without a matching begin");
            self.begin(out);
        }
        if actionable {
            self.needs_update.set(true);
        }

        let depth = self.depth.get() - 1;
        self.depth.set(depth);
        if depth > 0 {
            return;
        }

        let update = if self.needs_update.replace(false) {
            compute()
        } else {
            None
        };
        match update {
            Some(value) => out.dispatch(&Transaction::End(value)),
            None => out.dispatch(&Transaction::Cancel),
        }
    }

    /// Close one level of the window with nothing actionable.
    pub(crate) fn cancel<R, F>(&self, out: &Signal<R>, compute: F)
    where
        R: Clone + 'static,
        F: FnOnce() -> Option<R>,
    {
        self.end(out, false, compute);
    }

    /// Route a parent transaction: every parent `End` counts as actionable.
    pub(crate) fn route<P, R, F>(&self, out: &Signal<R>, transaction: &Transaction<P>, compute: F)
    where
        R: Clone + 'static,
        F: FnOnce() -> Option<R>,
    {
        match transaction {
            Transaction::Begin => self.begin(out),
            Transaction::End(_) => self.end(out, true, compute),
            Transaction::Cancel => self.cancel(out, compute),
        }
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.depth.get()
    }
}
