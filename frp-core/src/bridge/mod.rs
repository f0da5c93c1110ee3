//! Collaborator interfaces.
//!
//! The engine performs no I/O. Network fetches and persistent storage are
//! collaborators that plug into the graph through these interfaces:
//!
//! - [`DataSource`]: an upstream producer whose results (success or
//!   failure) arrive as ordinary signal payloads.
//! - [`Store`]: string-keyed persistence, used by [`PersistentSetting`] to
//!   mirror an [`Input`](crate::reactive::Input) to storage.

mod source;
mod store;

pub use source::{DataSource, FetchResult, FetchSource};
pub use store::{MemoryStore, PersistentSetting, Store};
