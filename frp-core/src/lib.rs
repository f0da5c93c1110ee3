//! FRP Core
//!
//! This crate provides a small push-based reactive engine for client
//! applications that turn upstream data and user input into view state.
//! It implements:
//!
//! - Signals that broadcast bracketed transactions (`Begin`, then `End` or `Cancel`)
//! - Mutable inputs and glitch-free combinators over them
//! - Time-based throttling and dynamic switching between signals
//! - Interfaces for data sources and persistent settings
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Signals, transactions, receivers and every combinator
//! - `timer`: Clock and scheduling abstraction used by throttling
//! - `bridge`: Data source and persistent storage collaborators
//! - `config`: Engine configuration loaded from JSON
//! - `error`: Error types for the collaborators at the edges
//!
//! # Example
//!
//! ```rust
//! use frp_core::reactive::{combine2, Input};
//!
//! let query = Input::new(String::new());
//! let limit = Input::new(10usize);
//!
//! let summary = combine2(query.signal(), limit.signal(), |q, n| format!("{q}:{n}"));
//! let latest = summary.latest();
//!
//! query.set("m4".to_string());
//! assert_eq!(latest.value(), Some("m4:10".to_string()));
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod reactive;
pub mod timer;

pub use config::Config;
pub use error::{AppError, ConfigError, StoreError};
