//! Error types for the Storyloom library.
//!
//! This crate provides the foundation error types used throughout the Storyloom ecosystem.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Provider failures are absorbed by fallback chains, persistence failures by the
//! migration service, and parse failures by the narrative parser. Only
//! [`GenerationError`] is meant to reach the person waiting for a story.
//!
//! # Examples
//!
//! ```
//! use storyloom_error::{ProviderError, ProviderErrorKind, StoryloomResult};
//!
//! fn call_provider() -> StoryloomResult<String> {
//!     Err(ProviderError::new("openai", ProviderErrorKind::RateLimited {
//!         retry_after_secs: Some(30),
//!     }))?
//! }
//!
//! assert!(call_provider().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod aggregate;
mod config;
mod error;
mod generation;
mod parse;
mod persistence;
mod provider;
mod storage;

pub use aggregate::{AggregateError, ProviderFailure};
pub use config::ConfigError;
pub use error::{StoryloomError, StoryloomErrorKind, StoryloomResult};
pub use generation::{GenerationError, GenerationErrorKind};
pub use parse::{ParseError, ParseErrorKind};
pub use persistence::{PersistenceError, PersistenceErrorKind};
pub use provider::{ProviderError, ProviderErrorKind, RetryableError};
pub use storage::{StorageError, StorageErrorKind};
