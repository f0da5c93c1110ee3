//! Error types.
//!
//! The propagation engine itself never fails: "nothing happened" is a
//! `Cancel` or an empty latest value. Errors exist only at the edges, where
//! collaborators fetch, store or configure things. Fetch failures travel
//! through signals as ordinary payloads (`Result<T, AppError>`), which is
//! why [`AppError`] is `Clone`.

use thiserror::Error;

/// Failure reported by an upstream collaborator, carried as a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("network request failed: {0}")]
    Network(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("data source unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize setting: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("storage backend failed: {0}")]
    Backend(String),
}

/// Invalid engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("settings namespace must not be empty")]
    EmptyNamespace,
}
