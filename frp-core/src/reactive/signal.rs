//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive: a broadcast point that
//! fans transactions out to its observers, plus an optional pull-mode
//! answer to "what is the current value?".
//!
//! # How Signals Work
//!
//! 1. An observer subscribes and receives a [`Receiver`]. If the signal
//!    already has a latest value, the new observer is replayed `Begin` and
//!    `End(value)` before `subscribe` returns.
//!
//! 2. A producer pushes a transaction; every registered observer is called
//!    synchronously, in registration order.
//!
//! 3. Dropping the `Receiver` removes the observer.
//!
//! # Ownership
//!
//! Every edge of the graph is a `Receiver` owned by the consumer. A derived
//! node keeps the receivers on its parents alive, so holding a downstream
//! handle keeps the whole upstream chain alive. Parents only reach their
//! children through `Weak` references captured in observer callbacks, which
//! keeps the graph free of reference cycles.
//!
//! # Threading
//!
//! Signals are single-threaded (`Rc` + `RefCell`). Work arriving from other
//! execution contexts must be redispatched onto the owning thread before it
//! touches the graph.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use super::observer::{ObserverId, ObserverTable};
use super::receiver::Receiver;
use super::transaction::{LatestValue, Transaction};

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique signal ID.
fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// The kind of node behind a signal handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A bare broadcast point with no stored value.
    Source,
    /// A mutable root value.
    Input,
    /// A cache of the most recent value.
    Latest,
    Map,
    Filter,
    OnChange,
    Union,
    Combine,
    Gate,
    Throttle,
    Join,
}

/// Anything a [`Receiver`] can detach itself from.
pub(crate) trait Detach {
    fn detach(&self, id: ObserverId);
}

/// Shared state behind every signal handle.
pub(crate) struct Node<T> {
    id: u64,
    kind: NodeKind,
    observers: RefCell<ObserverTable<T>>,
    /// Pull-mode answer for the current value.
    pull: Box<dyn Fn() -> LatestValue<T>>,
    /// Subscriptions this node holds on its parents.
    edges: RefCell<Vec<Receiver>>,
}

impl<T: 'static> Detach for Node<T> {
    fn detach(&self, id: ObserverId) {
        if self.observers.borrow_mut().remove(id) {
            trace!(signal = self.id, ?id, "observer detached");
        }
    }
}

impl<T> Drop for Node<T> {
    fn drop(&mut self) {
        trace!(signal = self.id, kind = ?self.kind, "signal released");
    }
}

/// A push-based observable value stream.
///
/// # Type Parameters
///
/// - `T`: The payload type. Must be `Clone + 'static`; values are cloned
///   into caches and replays.
///
/// # Example
///
/// ```rust
/// use frp_core::reactive::Input;
///
/// let speed = Input::new(50);
/// let label = speed.signal().map(|kmh| format!("{kmh} km/h"));
///
/// let _output = label.output(|text| println!("{text}"));
/// speed.set(80);
/// ```
pub struct Signal<T> {
    node: Rc<Node<T>>,
}

impl<T> Signal<T>
where
    T: Clone + 'static,
{
    /// Create a bare signal with no latest value.
    ///
    /// Values only reach observers through [`Signal::push_value`] or
    /// [`Signal::push_transaction`].
    pub fn new() -> Self {
        Self::with_pull(NodeKind::Source, || LatestValue::None)
    }

    /// Create a node of the given kind answering pulls with `pull`.
    pub(crate) fn with_pull<P>(kind: NodeKind, pull: P) -> Self
    where
        P: Fn() -> LatestValue<T> + 'static,
    {
        let id = next_signal_id();
        trace!(signal = id, ?kind, "signal created");
        Self {
            node: Rc::new(Node {
                id,
                kind,
                observers: RefCell::new(ObserverTable::new()),
                pull: Box::new(pull),
                edges: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.node.id
    }

    /// Get the kind of node behind this handle.
    pub fn kind(&self) -> NodeKind {
        self.node.kind
    }

    /// The signal's pull-mode value.
    pub fn latest_value(&self) -> LatestValue<T> {
        (self.node.pull)()
    }

    /// The current value, if the signal can produce one.
    pub fn value(&self) -> Option<T> {
        self.latest_value().value()
    }

    /// Register an observer for every transaction on this signal.
    ///
    /// If the signal currently has a value, the new observer alone is
    /// replayed `Begin` then `End(value)` before this returns. The
    /// subscription lasts as long as the returned [`Receiver`].
    pub fn subscribe<F>(&self, observer: F) -> Receiver
    where
        F: Fn(&Transaction<T>) + 'static,
    {
        let id = ObserverId::new();
        let entry = self.node.observers.borrow_mut().insert(id, observer);
        let detach: Rc<dyn Detach> = self.node.clone();
        let receiver = Receiver::new(detach, id);
        trace!(signal = self.node.id, ?id, "observer attached");

        if let Some(value) = self.value() {
            entry.call(&Transaction::Begin);
            entry.call(&Transaction::End(value));
        }
        receiver
    }

    /// Deliver a transaction to every registered observer.
    pub fn push_transaction(&self, transaction: Transaction<T>) {
        self.dispatch(&transaction);
    }

    /// Announce and deliver a new value: `Begin` followed by `End(value)`.
    pub fn push_value(&self, value: T) {
        self.dispatch(&Transaction::Begin);
        self.dispatch(&Transaction::End(value));
    }

    pub(crate) fn dispatch(&self, transaction: &Transaction<T>) {
        let snapshot = self.node.observers.borrow_mut().begin_dispatch();
        trace!(signal = self.node.id, observers = snapshot.len(), "fan-out");
        for entry in &snapshot {
            entry.call(transaction);
        }
        self.node.observers.borrow_mut().end_dispatch();
    }

    /// Get the number of live observers.
    pub fn subscriber_count(&self) -> usize {
        self.node.observers.borrow().len()
    }

    /// Whether two handles refer to the same signal.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Subscribe this node to `parent`, keeping the subscription for the
    /// node's lifetime.
    ///
    /// The parent only holds a weak reference back to this node.
    pub(crate) fn attach<P, F>(&self, parent: &Signal<P>, on_parent: F)
    where
        P: Clone + 'static,
        F: Fn(&Signal<T>, &Transaction<P>) + 'static,
    {
        let weak = self.downgrade();
        let receiver = parent.subscribe(move |transaction| {
            if let Some(signal) = weak.upgrade() {
                on_parent(&signal, transaction);
            }
        });
        self.node.edges.borrow_mut().push(receiver);
    }

    pub(crate) fn downgrade(&self) -> WeakSignal<T> {
        WeakSignal(Rc::downgrade(&self.node))
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T> Default for Signal<T>
where
    T: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("value", &self.value())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// A non-owning signal reference, used wherever an upstream callback or a
/// timer must reach a node without keeping it alive.
pub(crate) struct WeakSignal<T>(Weak<Node<T>>);

impl<T> WeakSignal<T> {
    pub(crate) fn upgrade(&self) -> Option<Signal<T>> {
        self.0.upgrade().map(|node| Signal { node })
    }
}

impl<T> Clone for WeakSignal<T> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
