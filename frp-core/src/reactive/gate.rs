//! Gate: conditional pass-through with deferred flush.
//!
//! While the `open` signal is `false`, values are held back and only the
//! most recent one is remembered. When `open` turns from `false` to `true`,
//! that value is flushed as a single `End`. While open, values pass as
//! they arrive.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use super::latest::Latest;
use super::settle::Settle;
use super::signal::{NodeKind, Signal};
use super::transaction::LatestValue;

#[derive(Default)]
struct GateState {
    settle: Settle,
    /// The value ended during the current window.
    value_changed: Cell<bool>,
    /// A value arrived while closed and has not been flushed yet.
    pending: Cell<bool>,
    /// Whether the gate was open when the previous window settled.
    was_open: Cell<bool>,
}

impl GateState {
    /// Decide what the window that is closing delivers.
    ///
    /// Runs once per settled window, after both parents have finished, so
    /// `open` is read in its post-update state.
    fn resolve<T>(&self, value: &Latest<T>, open: &Latest<bool>) -> Option<T>
    where
        T: Clone + 'static,
    {
        let is_open = open.value() == Some(true);
        let opened = is_open && !self.was_open.replace(is_open);
        let changed = self.value_changed.replace(false);

        if !is_open {
            if changed {
                self.pending.set(true);
            }
            return None;
        }
        let flush = opened && self.pending.get();
        if changed || flush {
            self.pending.set(false);
            value.value()
        } else {
            None
        }
    }
}

/// Let `value` through only while `open` is `true`.
pub fn gate<T>(value: &Signal<T>, open: &Signal<bool>) -> Signal<T>
where
    T: Clone + 'static,
{
    let value = value.latest();
    let open = open.latest();
    let state = Rc::new(GateState::default());

    let gated = {
        let value = value.clone();
        let open = open.clone();
        Signal::with_pull(NodeKind::Gate, move || {
            if open.value() == Some(true) {
                match value.value() {
                    Some(current) => LatestValue::Stored(current),
                    None => LatestValue::None,
                }
            } else {
                LatestValue::None
            }
        })
    };

    {
        let state = Rc::clone(&state);
        let (source, open) = (value.clone(), open.clone());
        gated.attach(value.signal(), move |out, transaction| {
            if transaction.is_end() {
                state.value_changed.set(true);
            }
            state.settle.route(out, transaction, || state.resolve(&source, &open));
        });
    }

    {
        let state = Rc::clone(&state);
        let (source, condition) = (value.clone(), open.clone());
        gated.attach(open.signal(), move |out, transaction| {
            state.settle.route(out, transaction, || state.resolve(&source, &condition));
        });
    }

    debug!(signal = gated.id(), "gate created");
    gated
}

impl<T> Signal<T>
where
    T: Clone + 'static,
{
    /// Let this signal through only while `open` is `true`.
    pub fn gate(&self, open: &Signal<bool>) -> Signal<T> {
        gate(self, open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Input, Output, Transaction};
    use std::cell::RefCell;

    fn capture<T: Clone + 'static>(signal: &Signal<T>) -> (Rc<RefCell<Vec<T>>>, Output) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let output = signal.output(move |v| sink.borrow_mut().push(v.clone()));
        (seen, output)
    }

    #[test]
    fn closed_gate_flushes_latest_on_open() {
        let value = Input::new(0);
        let open = Input::new(false);
        let gated = value.signal().gate(open.signal());
        let (seen, _output) = capture(&gated);

        value.set(5);
        value.set(6);
        assert!(seen.borrow().is_empty());

        open.set(true);
        assert_eq!(*seen.borrow(), vec![6]);
    }

    #[test]
    fn open_gate_passes_values() {
        let value = Input::new(1);
        let open = Input::new(true);
        let gated = gate(value.signal(), open.signal());
        let (seen, _output) = capture(&gated);

        value.set(2);
        value.set(3);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn reopening_without_new_values_does_not_flush() {
        let value = Input::new(1);
        let open = Input::new(true);
        let gated = gate(value.signal(), open.signal());
        let (seen, _output) = capture(&gated);

        open.set(false);
        open.set(true);
        assert_eq!(*seen.borrow(), vec![1]);

        open.set(false);
        value.set(2);
        open.set(true);
        open.set(true);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn closed_gate_has_no_latest_value() {
        let value = Input::new(7);
        let open = Input::new(false);
        let gated = gate(value.signal(), open.signal());
        assert_eq!(gated.value(), None);

        open.set(true);
        assert_eq!(gated.value(), Some(7));
    }

    #[test]
    fn shared_update_resolves_to_one_end() {
        // Value and condition derived from the same input: one write opens
        // the gate and delivers a value inside the same cascade.
        let level = Input::new(0);
        let open = level.signal().map(|v| *v > 2);
        let gated = gate(level.signal(), &open);

        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let _receiver = gated.subscribe(move |t| sink.borrow_mut().push(t.clone()));

        level.set(1);
        level.set(3);
        level.set(4);
        assert_eq!(
            *log.borrow(),
            vec![
                Transaction::Begin,
                Transaction::Cancel,
                Transaction::Begin,
                Transaction::End(3),
                Transaction::Begin,
                Transaction::End(4),
            ]
        );
    }

    #[test]
    fn shared_update_closing_the_gate_swallows_the_value() {
        // The value's End reaches the gate before the condition's, so the
        // gate must not judge openness until the whole update has settled.
        let level = Input::new(3);
        let value = level.signal().map(|v| *v);
        let open = level.signal().map(|v| *v > 2);
        let gated = gate(&value, &open);

        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let _receiver = gated.subscribe(move |t| sink.borrow_mut().push(t.clone()));
        assert_eq!(*log.borrow(), vec![Transaction::Begin, Transaction::End(3)]);
        log.borrow_mut().clear();

        level.set(1);
        assert_eq!(*log.borrow(), vec![Transaction::Begin, Transaction::Cancel]);
        assert_eq!(gated.value(), None);

        level.set(5);
        assert_eq!(
            *log.borrow(),
            vec![
                Transaction::Begin,
                Transaction::Cancel,
                Transaction::Begin,
                Transaction::End(5),
            ]
        );
    }

    #[test]
    fn value_held_while_closing_flushes_on_reopen() {
        let level = Input::new(3);
        let value = level.signal().map(|v| *v);
        let open = level.signal().map(|v| *v > 2);
        let manual = Input::new(true);
        let both = open.combine(manual.signal(), |a, b| a && b);
        let gated = gate(&value, &both);
        let (seen, _output) = capture(&gated);

        level.set(1);
        manual.set(false);
        level.set(4);
        assert_eq!(*seen.borrow(), vec![3]);

        manual.set(true);
        assert_eq!(*seen.borrow(), vec![3, 4]);
    }
}
