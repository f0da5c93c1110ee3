//! Cooperative timers.
//!
//! Time-based signals (see [`Signal::throttle`](crate::reactive::Signal::throttle))
//! never block. They record what they are waiting for and ask a [`Timer`]
//! to call them back later, on the same thread that owns the signal graph.
//!
//! Two implementations are provided:
//!
//! - [`ManualTimer`]: a virtual clock advanced explicitly. Deterministic, and
//!   what the tests use.
//! - [`TokioTimer`]: real time on a tokio `LocalSet`. Tasks run through
//!   `spawn_local`, so callbacks land back on the graph's thread.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::trace;

/// A deferred callback.
pub type Task = Box<dyn FnOnce()>;

/// A source of time and deferred callbacks on the graph's thread.
pub trait Timer {
    /// The current time.
    fn now(&self) -> Instant;

    /// Run `task` once `delay` has elapsed.
    fn schedule(&self, delay: Duration, task: Task);
}

/// A virtual clock that only moves when told to.
pub struct ManualTimer {
    origin: Instant,
    elapsed: Cell<Duration>,
    /// Pending tasks keyed by (deadline, insertion sequence).
    queue: RefCell<BTreeMap<(Duration, u64), Task>>,
    sequence: Cell<u64>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
            queue: RefCell::new(BTreeMap::new()),
            sequence: Cell::new(0),
        }
    }

    /// Time elapsed on the virtual clock.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    /// Number of tasks waiting to fire.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Move the clock forward by `by`, running every task that becomes due
    /// in deadline order. Tasks scheduled by a running task are honoured if
    /// they fall due within the same advance.
    pub fn advance(&self, by: Duration) {
        let target = self.elapsed.get() + by;
        loop {
            let due = {
                let mut queue = self.queue.borrow_mut();
                let ready = matches!(
                    queue.first_key_value(),
                    Some((&(deadline, _), _)) if deadline <= target
                );
                if ready {
                    queue.pop_first()
                } else {
                    None
                }
            };
            let Some(((deadline, _), task)) = due else {
                break;
            };
            self.elapsed.set(deadline.max(self.elapsed.get()));
            trace!(at = ?deadline, "manual timer firing");
            task();
        }
        self.elapsed.set(target);
    }
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }

    fn schedule(&self, delay: Duration, task: Task) {
        let sequence = self.sequence.get();
        self.sequence.set(sequence + 1);
        let deadline = self.elapsed.get() + delay;
        self.queue.borrow_mut().insert((deadline, sequence), task);
    }
}

impl fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualTimer")
            .field("elapsed", &self.elapsed())
            .field("pending", &self.pending())
            .finish()
    }
}

/// Real-time timer backed by tokio.
///
/// Must be used from within a [`tokio::task::LocalSet`]; scheduling outside
/// one panics, as `spawn_local` does.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTimer;

impl TokioTimer {
    pub fn new() -> Self {
        Self
    }
}

impl Timer for TokioTimer {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn schedule(&self, delay: Duration, task: Task) {
        tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}
