//! Reactive Primitives
//!
//! This module implements the signal propagation engine: inputs, derived
//! signals, combiners and the subscription handles that keep them alive.
//!
//! # Concepts
//!
//! ## Signals and transactions
//!
//! A [`Signal`] broadcasts [`Transaction`]s to its observers. Every update
//! is bracketed by a `Begin` and closed by exactly one `End(value)` or
//! `Cancel`. Signals can also be asked for their current value
//! ([`LatestValue`]), which lets late subscribers start from the current
//! state instead of waiting for the next change.
//!
//! ## Inputs
//!
//! An [`Input`] is a mutable root. Setting it pushes the new value through
//! every dependent signal synchronously, before `set` returns.
//!
//! ## Receivers
//!
//! Subscribing returns a [`Receiver`] (or an [`Output`] / [`WillOutput`]).
//! The subscription lives exactly as long as that handle.
//!
//! ## Combinators
//!
//! [`combine2`]..[`combine6`], [`gate`], [`Signal::throttle`] and
//! [`Signal::join`] merge several upstream paths. They count overlapping
//! transaction windows and settle once per cascade, so observers never see
//! a value computed from a mix of old and new upstream states.
//!
//! # Implementation Notes
//!
//! The engine is single-threaded and call-stack recursive. There is no
//! scheduler and no global runtime: the graph is the set of `Receiver`s
//! each node holds on its parents.

mod transaction;
mod observer;
mod signal;
mod receiver;
mod input;
mod latest;
mod derived;
mod settle;
mod combine;
mod gate;
mod throttle;
mod join;

pub use transaction::{LatestValue, Transaction};
pub use observer::ObserverId;
pub use signal::{NodeKind, Signal};
pub use receiver::{Output, Receiver, WillOutput};
pub use input::Input;
pub use latest::Latest;
pub use derived::union_all;
pub use combine::{combine2, combine3, combine4, combine5, combine6};
pub use gate::gate;
