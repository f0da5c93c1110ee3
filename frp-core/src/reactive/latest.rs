//! Latest: a pull-mode cache over a push signal.
//!
//! A `Latest` remembers the payload of the most recent `End` it has seen
//! and answers "current value" queries from that cache instead of
//! re-deriving through the upstream chain. Combinators keep one `Latest`
//! per parent.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;

use super::signal::{NodeKind, Signal};
use super::transaction::{LatestValue, Transaction};

/// A signal that caches its source's most recent value.
pub struct Latest<T> {
    signal: Signal<T>,
}

impl<T> Latest<T>
where
    T: Clone + 'static,
{
    fn wrap(source: &Signal<T>) -> Self {
        let cache: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));

        let stored = Rc::clone(&cache);
        let signal = Signal::with_pull(NodeKind::Latest, move || match stored.borrow().as_ref() {
            Some(value) => LatestValue::Stored(value.clone()),
            None => LatestValue::None,
        });

        signal.attach(source, move |out, transaction| {
            if let Transaction::End(value) = transaction {
                // Cache first so downstream pulls during End see the new value.
                *cache.borrow_mut() = Some(value.clone());
            }
            out.dispatch(transaction);
        });

        Self { signal }
    }

    /// The cached value, if any `End` has been seen.
    pub fn value(&self) -> Option<T> {
        self.signal.value()
    }

    /// The caching signal itself.
    pub fn signal(&self) -> &Signal<T> {
        &self.signal
    }

    /// Unwrap into the caching signal.
    pub fn into_signal(self) -> Signal<T> {
        self.signal
    }
}

impl<T> Signal<T>
where
    T: Clone + 'static,
{
    /// Cache this signal's most recent value.
    ///
    /// Wrapping a signal that already is a `Latest` returns the same node,
    /// so repeated calls do not pile up observer chains.
    pub fn latest(&self) -> Latest<T> {
        if self.kind() == NodeKind::Latest {
            return Latest {
                signal: self.clone(),
            };
        }
        Latest::wrap(self)
    }
}

impl<T> Clone for Latest<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

impl<T> Debug for Latest<T>
where
    T: Clone + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Latest")
            .field("id", &self.signal.id())
            .field("value", &self.value())
            .finish()
    }
}
