//! Throttle: trailing-edge rate limiting.
//!
//! A value arriving at least `minimum_interval` after the last delivered one
//! goes straight through. A value arriving sooner is held back; only the
//! newest held value survives, and a single deferred delivery is scheduled
//! for the end of the interval. Waiting is a timer callback, never a block.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::settle::Settle;
use super::signal::{NodeKind, Signal, WeakSignal};
use super::transaction::{LatestValue, Transaction};
use crate::timer::Timer;

struct ThrottleState<T> {
    settle: Settle,
    timer: Rc<dyn Timer>,
    interval: Duration,
    last_delivery: Cell<Option<Instant>>,
    /// Last value delivered downstream.
    delivered: RefCell<Option<T>>,
    /// Value to emit when the current window settles.
    outgoing: RefCell<Option<T>>,
    /// Newest value held back until the interval boundary.
    pending: RefCell<Option<T>>,
    armed: Cell<bool>,
    /// Bumped whenever a scheduled delivery is superseded; a timer
    /// callback carrying an older generation does nothing.
    generation: Cell<u64>,
}

impl<T> ThrottleState<T>
where
    T: Clone + 'static,
{
    fn take_outgoing(&self) -> Option<T> {
        let value = self.outgoing.borrow_mut().take()?;
        self.last_delivery.set(Some(self.timer.now()));
        *self.delivered.borrow_mut() = Some(value.clone());
        Some(value)
    }

    fn on_parent(self: &Rc<Self>, out: &Signal<T>, transaction: &Transaction<T>) {
        match transaction {
            Transaction::Begin => self.settle.begin(out),
            Transaction::Cancel => self.settle.cancel(out, || self.take_outgoing()),
            Transaction::End(value) => {
                let now = self.timer.now();
                let since_last = self
                    .last_delivery
                    .get()
                    .map(|last| now.saturating_duration_since(last));

                match since_last {
                    Some(elapsed) if elapsed < self.interval => {
                        *self.pending.borrow_mut() = Some(value.clone());
                        if !self.armed.replace(true) {
                            self.arm(out, self.interval - elapsed);
                        }
                        self.settle.cancel(out, || self.take_outgoing());
                    }
                    _ => {
                        // A fresh value supersedes anything still held back,
                        // and the window restarts now rather than at the
                        // boundary an armed timer was waiting for.
                        self.pending.borrow_mut().take();
                        if self.armed.replace(false) {
                            self.generation.set(self.generation.get() + 1);
                        }
                        *self.outgoing.borrow_mut() = Some(value.clone());
                        self.settle.end(out, true, || self.take_outgoing());
                    }
                }
            }
        }
    }

    fn arm(self: &Rc<Self>, out: &Signal<T>, delay: Duration) {
        trace!(signal = out.id(), ?delay, "throttle deferring delivery");
        let generation = self.generation.get();
        let state: Weak<Self> = Rc::downgrade(self);
        let out: WeakSignal<T> = out.downgrade();
        self.timer.schedule(
            delay,
            Box::new(move || {
                if let (Some(state), Some(out)) = (state.upgrade(), out.upgrade()) {
                    if state.generation.get() == generation {
                        state.fire(&out);
                    }
                }
            }),
        );
    }

    fn fire(&self, out: &Signal<T>) {
        self.armed.set(false);
        let Some(value) = self.pending.borrow_mut().take() else {
            return;
        };
        self.settle.begin(out);
        *self.outgoing.borrow_mut() = Some(value);
        self.settle.end(out, true, || self.take_outgoing());
    }
}

impl<T> Signal<T>
where
    T: Clone + 'static,
{
    /// Deliver at most one value per `minimum_interval`, keeping the newest
    /// value held back for delivery at the end of the interval.
    pub fn throttle(&self, timer: Rc<dyn Timer>, minimum_interval: Duration) -> Signal<T> {
        let state: Rc<ThrottleState<T>> = Rc::new(ThrottleState {
            settle: Settle::new(),
            timer,
            interval: minimum_interval,
            last_delivery: Cell::new(None),
            delivered: RefCell::new(None),
            outgoing: RefCell::new(None),
            pending: RefCell::new(None),
            armed: Cell::new(false),
            generation: Cell::new(0),
        });

        let throttled = {
            let state = Rc::clone(&state);
            Signal::with_pull(NodeKind::Throttle, move || match state.delivered.borrow().as_ref() {
                Some(value) => LatestValue::Stored(value.clone()),
                None => LatestValue::None,
            })
        };
        throttled.attach(self, move |out, transaction| state.on_parent(out, transaction));

        debug!(signal = throttled.id(), ?minimum_interval, "throttle created");
        throttled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Input, Output};
    use crate::timer::ManualTimer;

    fn capture<T: Clone + 'static>(signal: &Signal<T>) -> (Rc<RefCell<Vec<T>>>, Output) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let output = signal.output(move |v| sink.borrow_mut().push(v.clone()));
        (seen, output)
    }

    const INTERVAL: Duration = Duration::from_millis(100);

    #[test]
    fn burst_collapses_to_trailing_value() {
        let timer = Rc::new(ManualTimer::new());
        let input = Input::new(0);
        let throttled = input.signal().throttle(timer.clone(), INTERVAL);
        let (seen, _output) = capture(&throttled);
        assert_eq!(*seen.borrow(), vec![0]);

        input.set(1);
        input.set(2);
        assert_eq!(*seen.borrow(), vec![0]);
        assert_eq!(timer.pending(), 1);

        timer.advance(INTERVAL);
        assert_eq!(*seen.borrow(), vec![0, 2]);
        assert_eq!(throttled.value(), Some(2));
    }

    #[test]
    fn spaced_values_pass_immediately() {
        let timer = Rc::new(ManualTimer::new());
        let input = Input::new(0);
        let throttled = input.signal().throttle(timer.clone(), INTERVAL);
        let (seen, _output) = capture(&throttled);

        timer.advance(Duration::from_millis(150));
        input.set(1);
        timer.advance(Duration::from_millis(100));
        input.set(2);
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn deferred_delivery_waits_for_window_boundary() {
        let timer = Rc::new(ManualTimer::new());
        let input = Input::new(0);
        let throttled = input.signal().throttle(timer.clone(), INTERVAL);
        let (seen, _output) = capture(&throttled);

        timer.advance(Duration::from_millis(60));
        input.set(1);
        timer.advance(Duration::from_millis(39));
        assert_eq!(*seen.borrow(), vec![0]);

        timer.advance(Duration::from_millis(1));
        assert_eq!(*seen.borrow(), vec![0, 1]);

        // The window restarted at the deferred delivery.
        timer.advance(Duration::from_millis(50));
        input.set(2);
        assert_eq!(*seen.borrow(), vec![0, 1]);
        timer.advance(Duration::from_millis(50));
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn suppressed_updates_stay_balanced() {
        let timer = Rc::new(ManualTimer::new());
        let input = Input::new(0);
        let throttled = input.signal().throttle(timer.clone(), INTERVAL);

        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let _receiver = throttled.subscribe(move |t| sink.borrow_mut().push(t.clone()));
        log.borrow_mut().clear();

        input.set(1);
        timer.advance(INTERVAL);
        assert_eq!(
            *log.borrow(),
            vec![
                Transaction::Begin,
                Transaction::Cancel,
                Transaction::Begin,
                Transaction::End(1),
            ]
        );
    }

    #[test]
    fn released_throttle_ignores_timer() {
        let timer = Rc::new(ManualTimer::new());
        let input = Input::new(0);
        let throttled = input.signal().throttle(timer.clone(), INTERVAL);
        input.set(1);
        assert_eq!(timer.pending(), 1);

        drop(throttled);
        assert_eq!(input.signal().subscriber_count(), 0);
        timer.advance(INTERVAL);
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn fresh_delivery_supersedes_armed_timer() {
        let timer = Rc::new(ManualTimer::new());
        let input = Rc::new(Input::new(0));
        let throttled = input.signal().throttle(timer.clone(), INTERVAL);

        let deliveries = Rc::new(RefCell::new(Vec::new()));
        let _output = {
            let sink = deliveries.clone();
            let clock = timer.clone();
            let start = timer.now();
            throttled.output(move |v| sink.borrow_mut().push((*v, clock.now() - start)))
        };

        // Due at the same instant as the deferred delivery of 1, and runs
        // before it: 2 is on time and goes straight through, 3 is early.
        {
            let input = input.clone();
            timer.schedule(
                INTERVAL,
                Box::new(move || {
                    input.set(2);
                    input.set(3);
                }),
            );
        }
        input.set(1);
        assert_eq!(timer.pending(), 2);

        timer.advance(INTERVAL);
        assert_eq!(*deliveries.borrow(), vec![(0, Duration::ZERO), (2, INTERVAL)]);

        timer.advance(INTERVAL);
        assert_eq!(
            *deliveries.borrow(),
            vec![(0, Duration::ZERO), (2, INTERVAL), (3, INTERVAL * 2)]
        );
    }
}
