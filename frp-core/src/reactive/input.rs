//! Input: the mutable root of a propagation graph.
//!
//! An `Input` is the only place a standalone update originates. Writing to
//! it pushes `Begin` and `End(value)` through every dependent before the
//! write returns.
//!
//! Writing to an `Input` again from inside its own propagation is a cyclic
//! write loop. That is a defect in the graph's topology, not a runtime
//! condition, so it panics with a diagnostic.

use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug};
use std::rc::Rc;

use tracing::error;

use super::signal::{NodeKind, Signal};
use super::transaction::{LatestValue, Transaction};

/// A mutable root signal with single-writer enforcement.
///
/// # Example
///
/// ```rust
/// use frp_core::reactive::Input;
///
/// let zoom = Input::new(10);
/// zoom.set(12);
/// zoom.update(|z| z + 1);
/// assert_eq!(zoom.value(), 13);
/// ```
pub struct Input<T> {
    value: Rc<RefCell<T>>,
    writing: Cell<bool>,
    signal: Signal<T>,
}

/// Clears the in-flight flag when a write finishes, even by unwinding.
struct WriteGuard<'a> {
    writing: &'a Cell<bool>,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.writing.set(false);
    }
}

impl<T> Input<T>
where
    T: Clone + 'static,
{
    /// Create a new input with the given initial value.
    pub fn new(value: T) -> Self {
        let value = Rc::new(RefCell::new(value));
        let stored = Rc::clone(&value);
        let signal = Signal::with_pull(NodeKind::Input, move || {
            LatestValue::Stored(stored.borrow().clone())
        });
        Self {
            value,
            writing: Cell::new(false),
            signal,
        }
    }

    /// Get the current value.
    pub fn value(&self) -> T {
        self.value.borrow().clone()
    }

    /// Set a new value and propagate it.
    ///
    /// # Panics
    ///
    /// Panics if called while a previous write to this input is still
    /// propagating.
    pub fn set(&self, value: T) {
        if self.writing.get() {
            error!(
                signal = self.signal.id(),
                "reentrant write to an input during its own propagation"
            );
            panic!(
                "reentrant write to Input (signal {}): a downstream observer wrote back \
                 into the input that triggered it, which is a cycle in the signal graph",
                self.signal.id()
            );
        }
        self.writing.set(true);
        let _guard = WriteGuard {
            writing: &self.writing,
        };

        self.signal.push_transaction(Transaction::Begin);
        *self.value.borrow_mut() = value.clone();
        self.signal.push_transaction(Transaction::End(value));
    }

    /// Update the value using a function of the current one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = {
            let current = self.value.borrow();
            f(&current)
        };
        self.set(next);
    }

    /// Whether a write to this input is currently propagating.
    pub fn is_writing(&self) -> bool {
        self.writing.get()
    }

    /// The signal carrying this input's values.
    pub fn signal(&self) -> &Signal<T> {
        &self.signal
    }
}

impl<T> Debug for Input<T>
where
    T: Clone + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("id", &self.signal.id())
            .field("value", &self.value())
            .field("writing", &self.is_writing())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_get_and_set() {
        let input = Input::new(0);
        assert_eq!(input.value(), 0);

        input.set(42);
        assert_eq!(input.value(), 42);
        assert_eq!(input.signal().value(), Some(42));
    }

    #[test]
    fn input_update() {
        let input = Input::new(10);
        input.update(|v| v + 5);
        assert_eq!(input.value(), 15);
    }

    #[test]
    fn latest_value_is_always_stored() {
        let input = Input::new("a".to_string());
        assert!(matches!(input.signal().latest_value(), LatestValue::Stored(ref v) if v == "a"));
        assert_eq!(input.signal().kind(), NodeKind::Input);
    }

    #[test]
    fn value_is_stored_before_end_is_delivered() {
        let input = Input::new(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let handle = input.signal().downgrade();
        let _receiver = input.signal().subscribe(move |t| {
            let current = handle.upgrade().and_then(|signal| signal.value());
            sink.borrow_mut().push((t.clone(), current));
        });

        input.set(2);
        let seen = seen.borrow();
        assert_eq!(seen[2], (Transaction::Begin, Some(1)));
        assert_eq!(seen[3], (Transaction::End(2), Some(2)));
    }

    #[test]
    fn writing_flag_is_cleared_after_set() {
        let input = Input::new(0);
        input.set(1);
        assert!(!input.is_writing());
    }

    #[test]
    #[should_panic(expected = "reentrant write to Input")]
    fn reentrant_write_is_fatal() {
        let input = Rc::new(Input::new(0));
        let writer = Rc::downgrade(&input);
        let _output = input.signal().output(move |v| {
            if *v == 1 {
                if let Some(input) = writer.upgrade() {
                    input.set(2);
                }
            }
        });

        input.set(1);
    }
}
