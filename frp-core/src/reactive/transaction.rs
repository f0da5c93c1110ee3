//! Transactions and latest values.
//!
//! Every update travelling through the graph is bracketed: a `Begin`
//! announces that something upstream is changing, and exactly one `End`
//! (carrying the new value) or `Cancel` (nothing actionable came of it)
//! closes the window. Combinators count these pairs, so the pairing must
//! never be broken on any path.

use std::fmt;
use std::rc::Rc;

/// One step of an update on a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction<T> {
    /// An update is starting.
    Begin,
    /// The update finished with a new value.
    End(T),
    /// The update was started but produced nothing actionable.
    Cancel,
}

impl<T> Transaction<T> {
    pub fn is_begin(&self) -> bool {
        matches!(self, Transaction::Begin)
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Transaction::End(_))
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Transaction::Cancel)
    }

    /// The payload of an `End`, if this is one.
    pub fn value(&self) -> Option<&T> {
        match self {
            Transaction::End(value) => Some(value),
            _ => None,
        }
    }

    /// Transform the payload, keeping the phase.
    pub fn map<U, F>(&self, f: F) -> Transaction<U>
    where
        F: FnOnce(&T) -> U,
    {
        match self {
            Transaction::Begin => Transaction::Begin,
            Transaction::End(value) => Transaction::End(f(value)),
            Transaction::Cancel => Transaction::Cancel,
        }
    }
}

/// What a signal can answer when asked for its current value.
pub enum LatestValue<T> {
    /// The signal has never produced a value (or does not keep one).
    None,
    /// A value held by the signal itself.
    Stored(T),
    /// A value derived on demand from upstream state.
    Computed(Rc<dyn Fn() -> Option<T>>),
}

impl<T> LatestValue<T> {
    /// Resolve to a concrete value, running the computation if needed.
    pub fn value(self) -> Option<T> {
        match self {
            LatestValue::None => None,
            LatestValue::Stored(value) => Some(value),
            LatestValue::Computed(compute) => compute(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, LatestValue::None)
    }
}

impl<T: Clone> Clone for LatestValue<T> {
    fn clone(&self) -> Self {
        match self {
            LatestValue::None => LatestValue::None,
            LatestValue::Stored(value) => LatestValue::Stored(value.clone()),
            LatestValue::Computed(compute) => LatestValue::Computed(Rc::clone(compute)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for LatestValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatestValue::None => f.write_str("None"),
            LatestValue::Stored(value) => f.debug_tuple("Stored").field(value).finish(),
            LatestValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}
