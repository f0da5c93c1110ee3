//! Upstream data sources.

use std::fmt;

use tracing::{debug, warn};

use crate::error::AppError;
use crate::reactive::{Latest, Signal};

/// Raw bytes of a fetch, or why there are none.
pub type FetchResult = Result<Vec<u8>, AppError>;

/// An upstream producer of fetch results.
///
/// To the engine a data source is just another root signal: failures are
/// payloads like any other value.
pub trait DataSource {
    /// The results of this source. Has no value until the first fetch
    /// completes.
    fn value(&self) -> Signal<FetchResult>;

    /// Run a fetch and publish its result.
    fn start(&self);
}

/// A data source backed by a synchronous fetch function.
///
/// The transport lives in `fetch`; this type only publishes its results.
pub struct FetchSource<F> {
    name: String,
    fetch: F,
    raw: Signal<FetchResult>,
    latest: Latest<FetchResult>,
}

impl<F> FetchSource<F>
where
    F: Fn() -> FetchResult,
{
    pub fn new(name: impl Into<String>, fetch: F) -> Self {
        let raw = Signal::new();
        let latest = raw.latest();
        Self {
            name: name.into(),
            fetch,
            raw,
            latest,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<F> DataSource for FetchSource<F>
where
    F: Fn() -> FetchResult,
{
    fn value(&self) -> Signal<FetchResult> {
        self.latest.signal().clone()
    }

    fn start(&self) {
        let result = (self.fetch)();
        match &result {
            Ok(bytes) => debug!(source = %self.name, bytes = bytes.len(), "fetch completed"),
            Err(err) => warn!(source = %self.name, error = %err, "fetch failed"),
        }
        self.raw.push_value(result);
    }
}

impl<F> fmt::Debug for FetchSource<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchSource")
            .field("name", &self.name)
            .field("has_value", &self.latest.value().is_some())
            .finish()
    }
}

impl<T, E> Signal<Result<T, E>>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Transform successful payloads, passing errors through.
    pub fn map_ok<U, F>(&self, transform: F) -> Signal<Result<U, E>>
    where
        U: Clone + 'static,
        F: Fn(&T) -> U + 'static,
    {
        self.map(move |result| result.as_ref().map(&transform).map_err(E::clone))
    }
}
