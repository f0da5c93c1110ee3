//! Derived signals that follow a single stream of transactions.
//!
//! None of these combine parents. They rewrite, drop or merge transactions
//! while keeping every `Begin` paired with exactly one `End` or `Cancel`:
//! a value that is filtered out becomes a `Cancel`, never a silent drop,
//! because downstream combinators count the pairs.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use super::signal::{NodeKind, Signal};
use super::transaction::{LatestValue, Transaction};

impl<T> Signal<T>
where
    T: Clone + 'static,
{
    /// Transform every value.
    ///
    /// `Begin` and `Cancel` pass through unchanged. Pulling the mapped
    /// signal transforms the parent's current value.
    pub fn map<U, F>(&self, transform: F) -> Signal<U>
    where
        U: Clone + 'static,
        F: Fn(&T) -> U + 'static,
    {
        let transform = Rc::new(transform);

        let compute: Rc<dyn Fn() -> Option<U>> = {
            let parent = self.clone();
            let transform = Rc::clone(&transform);
            Rc::new(move || parent.value().map(|value| transform(&value)))
        };
        let mapped = Signal::with_pull(NodeKind::Map, move || {
            LatestValue::Computed(Rc::clone(&compute))
        });

        mapped.attach(self, move |out, transaction| {
            out.dispatch(&transaction.map(|value| transform(value)));
        });
        mapped
    }

    /// Keep only values matching `predicate`.
    ///
    /// A rejected value is delivered as `Cancel`.
    pub fn filter<F>(&self, predicate: F) -> Signal<T>
    where
        F: Fn(&T) -> bool + 'static,
    {
        let predicate = Rc::new(predicate);

        let compute: Rc<dyn Fn() -> Option<T>> = {
            let parent = self.clone();
            let predicate = Rc::clone(&predicate);
            Rc::new(move || parent.value().filter(|value| predicate(value)))
        };
        let filtered = Signal::with_pull(NodeKind::Filter, move || {
            LatestValue::Computed(Rc::clone(&compute))
        });

        filtered.attach(self, move |out, transaction| match transaction {
            Transaction::End(value) if !predicate(value) => {
                out.dispatch(&Transaction::Cancel);
            }
            other => out.dispatch(other),
        });
        filtered
    }

    /// Merge this signal's transactions with `other`'s.
    pub fn union(&self, other: &Signal<T>) -> Signal<T> {
        union_all([self, other])
    }
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Suppress values equal to the previously delivered one.
    ///
    /// A repeated value is delivered as `Cancel` and does not update the
    /// remembered value. The result is a pure change stream: it has no
    /// latest value of its own.
    pub fn on_change(&self) -> Signal<T> {
        let last: RefCell<Option<T>> = RefCell::new(None);
        let changes = Signal::with_pull(NodeKind::OnChange, || LatestValue::None);

        changes.attach(self, move |out, transaction| match transaction {
            Transaction::End(value) => {
                let repeated = last.borrow().as_ref() == Some(value);
                if repeated {
                    out.dispatch(&Transaction::Cancel);
                } else {
                    *last.borrow_mut() = Some(value.clone());
                    out.dispatch(transaction);
                }
            }
            other => out.dispatch(other),
        });
        changes
    }
}

impl Signal<bool> {
    /// Fires `true` each time the value changes from `false` to `true`.
    pub fn on_rising_edge(&self) -> Signal<bool> {
        self.on_change().filter(|value| *value)
    }

    /// Fires `false` each time the value changes from `true` to `false`.
    pub fn on_falling_edge(&self) -> Signal<bool> {
        self.on_change().filter(|value| !*value)
    }
}

/// Merge the transactions of several signals, in arrival order.
///
/// No deduplication, synchronisation or combination takes place. The
/// merged signal has no latest value.
pub fn union_all<'a, T, I>(signals: I) -> Signal<T>
where
    T: Clone + 'static,
    I: IntoIterator<Item = &'a Signal<T>>,
{
    let merged = Signal::with_pull(NodeKind::Union, || LatestValue::None);
    let mut parents = 0usize;
    for signal in signals {
        merged.attach(signal, |out, transaction| out.dispatch(transaction));
        parents += 1;
    }
    debug!(signal = merged.id(), parents, "union created");
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Input, Receiver};

    fn record<T: Clone + 'static>(signal: &Signal<T>) -> (Rc<RefCell<Vec<Transaction<T>>>>, Receiver) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let receiver = signal.subscribe(move |t| sink.borrow_mut().push(t.clone()));
        (seen, receiver)
    }

    fn values<T: Clone>(seen: &RefCell<Vec<Transaction<T>>>) -> Vec<T> {
        seen.borrow().iter().filter_map(|t| t.value().cloned()).collect()
    }

    #[test]
    fn map_transforms_values_and_pull() {
        let input = Input::new(2);
        let doubled = input.signal().map(|v| v * 2);
        assert_eq!(doubled.value(), Some(4));

        let (seen, _receiver) = record(&doubled);
        input.set(5);

        assert_eq!(values(&seen), vec![4, 10]);
        assert_eq!(doubled.value(), Some(10));
    }

    #[test]
    fn map_forwards_begin_and_cancel() {
        let source: Signal<i32> = Signal::new();
        let mapped = source.map(|v| v + 1);
        let (seen, _receiver) = record(&mapped);

        source.push_transaction(Transaction::Begin);
        source.push_transaction(Transaction::Cancel);
        assert_eq!(*seen.borrow(), vec![Transaction::Begin, Transaction::Cancel]);
    }

    #[test]
    fn filter_turns_rejections_into_cancel() {
        let input = Input::new(1);
        let even = input.signal().filter(|v| v % 2 == 0);
        let (seen, _receiver) = record(&even);

        // Initial value 1 is odd: nothing to replay.
        assert!(seen.borrow().is_empty());

        input.set(3);
        input.set(4);
        assert_eq!(
            *seen.borrow(),
            vec![
                Transaction::Begin,
                Transaction::Cancel,
                Transaction::Begin,
                Transaction::End(4),
            ]
        );
        assert_eq!(even.value(), Some(4));
    }

    #[test]
    fn on_change_suppresses_repeats() {
        let input = Input::new(0);
        let changes = input.signal().on_change();
        let (seen, _receiver) = record(&changes);

        for v in [6, 6, 7] {
            input.set(v);
        }
        assert_eq!(values(&seen), vec![6, 7]);
        assert_eq!(seen.borrow().iter().filter(|t| t.is_cancel()).count(), 1);
        assert!(changes.latest_value().is_none());
    }

    #[test]
    fn on_change_remembers_initial_value() {
        let input = Input::new(3);
        let changes = input.signal().on_change();
        let (seen, _receiver) = record(&changes);

        input.set(3);
        input.set(4);
        assert_eq!(values(&seen), vec![4]);
    }

    #[test]
    fn rising_and_falling_edges() {
        let input = Input::new(false);
        let (rising, _r) = record(&input.signal().on_rising_edge());
        let (falling, _f) = record(&input.signal().on_falling_edge());

        for v in [true, true, false, false, true] {
            input.set(v);
        }
        assert_eq!(values(&rising), vec![true, true]);
        assert_eq!(values(&falling), vec![false]);
    }

    #[test]
    fn union_merges_in_arrival_order() {
        let a = Input::new(1);
        let b = Input::new(10);
        let merged = a.signal().union(b.signal());
        assert!(merged.latest_value().is_none());
        let (seen, _receiver) = record(&merged);

        a.set(2);
        b.set(20);
        a.set(2);
        assert_eq!(values(&seen), vec![2, 20, 2]);
        assert_eq!(seen.borrow().len(), 6);
    }

    #[test]
    fn union_all_accepts_many_parents() {
        let sources: Vec<Signal<char>> = (0..4).map(|_| Signal::new()).collect();
        let merged = union_all(&sources);
        let (seen, _receiver) = record(&merged);

        for (source, tag) in sources.iter().zip(['a', 'b', 'c', 'd']).rev() {
            source.push_value(tag);
        }
        assert_eq!(values(&seen), vec!['d', 'c', 'b', 'a']);
    }
}
