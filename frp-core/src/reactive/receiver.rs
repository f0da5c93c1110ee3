//! Subscription handles.
//!
//! A [`Receiver`] is the only way to stop observing a signal: it subscribes
//! on construction and unsubscribes when dropped. [`Output`] and
//! [`WillOutput`] are receivers that filter for the two phases consumers
//! usually care about.

use std::fmt;
use std::rc::Rc;

use super::observer::ObserverId;
use super::signal::{Detach, Signal};
use super::transaction::Transaction;

/// An ownership-scoped subscription.
///
/// The signal only keeps the observer id; dropping the receiver removes
/// the observer entry synchronously.
#[must_use = "dropping a Receiver immediately ends the subscription"]
pub struct Receiver {
    source: Rc<dyn Detach>,
    id: ObserverId,
}

impl Receiver {
    pub(crate) fn new(source: Rc<dyn Detach>, id: ObserverId) -> Self {
        Self { source, id }
    }

    /// Subscribe `observer` to every transaction on `signal`.
    pub fn observe<T, F>(signal: &Signal<T>, observer: F) -> Self
    where
        T: Clone + 'static,
        F: Fn(&Transaction<T>) + 'static,
    {
        signal.subscribe(observer)
    }

    /// The observer id this receiver holds on its signal.
    pub fn id(&self) -> ObserverId {
        self.id
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        self.source.detach(self.id);
    }
}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver").field("id", &self.id).finish()
    }
}

/// A receiver invoked with the new value on every `End`.
#[must_use = "dropping an Output immediately ends the subscription"]
#[derive(Debug)]
pub struct Output {
    receiver: Receiver,
}

impl Output {
    pub fn new<T, F>(signal: &Signal<T>, on_value: F) -> Self
    where
        T: Clone + 'static,
        F: Fn(&T) + 'static,
    {
        let receiver = signal.subscribe(move |transaction| {
            if let Transaction::End(value) = transaction {
                on_value(value);
            }
        });
        Self { receiver }
    }

    pub fn id(&self) -> ObserverId {
        self.receiver.id()
    }
}

/// A receiver invoked when a change is about to arrive (`Begin`).
#[must_use = "dropping a WillOutput immediately ends the subscription"]
#[derive(Debug)]
pub struct WillOutput {
    receiver: Receiver,
}

impl WillOutput {
    pub fn new<T, F>(signal: &Signal<T>, on_begin: F) -> Self
    where
        T: Clone + 'static,
        F: Fn() + 'static,
    {
        let receiver = signal.subscribe(move |transaction| {
            if transaction.is_begin() {
                on_begin();
            }
        });
        Self { receiver }
    }

    pub fn id(&self) -> ObserverId {
        self.receiver.id()
    }
}

impl<T> Signal<T>
where
    T: Clone + 'static,
{
    /// Observe new values of this signal.
    pub fn output<F>(&self, on_value: F) -> Output
    where
        F: Fn(&T) + 'static,
    {
        Output::new(self, on_value)
    }

    /// Observe the start of every update on this signal.
    pub fn will_output<F>(&self, on_begin: F) -> WillOutput
    where
        F: Fn() + 'static,
    {
        WillOutput::new(self, on_begin)
    }
}
