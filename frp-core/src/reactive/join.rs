//! Join: flattening a signal of signals.
//!
//! The joined signal follows whichever inner signal the outer signal
//! currently carries. Switching is atomic with respect to observers: the
//! subscription on the old inner signal is released before the new one is
//! attached, callbacks already in flight from the old inner signal are
//! discarded, and the whole switch settles as a single downstream update.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use super::receiver::Receiver;
use super::settle::Settle;
use super::signal::{NodeKind, Signal};
use super::transaction::{LatestValue, Transaction};

struct JoinState<T> {
    settle: Settle,
    inner: RefCell<Option<Receiver>>,
    /// Bumped on every switch; callbacks from older inner signals carry a
    /// stale generation and are ignored.
    generation: Cell<u64>,
    /// Begins forwarded from the current inner signal not yet closed.
    open_inner: Cell<usize>,
    outgoing: RefCell<Option<T>>,
}

impl<T> JoinState<T>
where
    T: Clone + 'static,
{
    fn take_outgoing(&self) -> Option<T> {
        self.outgoing.borrow_mut().take()
    }

    fn on_outer(self: &Rc<Self>, out: &Signal<T>, transaction: &Transaction<Signal<T>>) {
        match transaction {
            Transaction::Begin => self.settle.begin(out),
            Transaction::End(inner) => {
                self.switch(out, inner);
                self.settle.end(out, false, || self.take_outgoing());
            }
            Transaction::Cancel => self.settle.cancel(out, || self.take_outgoing()),
        }
    }

    fn switch(self: &Rc<Self>, out: &Signal<T>, inner: &Signal<T>) {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        let previous = self.inner.borrow_mut().take();
        drop(previous);
        for _ in 0..self.open_inner.replace(0) {
            self.settle.cancel(out, || self.take_outgoing());
        }
        debug!(signal = out.id(), inner = inner.id(), generation, "join switching inner signal");

        let state = Rc::downgrade(self);
        let weak_out = out.downgrade();
        let receiver = inner.subscribe(move |transaction| {
            let (Some(state), Some(out)) = (state.upgrade(), weak_out.upgrade()) else {
                return;
            };
            if state.generation.get() == generation {
                state.on_inner(&out, transaction);
            }
        });
        *self.inner.borrow_mut() = Some(receiver);
    }

    fn on_inner(&self, out: &Signal<T>, transaction: &Transaction<T>) {
        match transaction {
            Transaction::Begin => {
                self.open_inner.set(self.open_inner.get() + 1);
                self.settle.begin(out);
            }
            Transaction::End(value) => {
                self.open_inner.set(self.open_inner.get().saturating_sub(1));
                *self.outgoing.borrow_mut() = Some(value.clone());
                self.settle.end(out, true, || self.take_outgoing());
            }
            Transaction::Cancel => {
                self.open_inner.set(self.open_inner.get().saturating_sub(1));
                self.settle.cancel(out, || self.take_outgoing());
            }
        }
    }
}

impl<T> Signal<Signal<T>>
where
    T: Clone + 'static,
{
    /// Follow the inner signal currently carried by this signal.
    pub fn join(&self) -> Signal<T> {
        let state: Rc<JoinState<T>> = Rc::new(JoinState {
            settle: Settle::new(),
            inner: RefCell::new(None),
            generation: Cell::new(0),
            open_inner: Cell::new(0),
            outgoing: RefCell::new(None),
        });

        let compute: Rc<dyn Fn() -> Option<T>> = {
            let outer = self.clone();
            Rc::new(move || outer.value().and_then(|inner| inner.value()))
        };
        let joined = Signal::with_pull(NodeKind::Join, move || {
            LatestValue::Computed(Rc::clone(&compute))
        });
        joined.attach(self, move |out, transaction| state.on_outer(out, transaction));
        joined
    }
}
