//! Request pacing and retry policy for provider calls.
//!
//! Provides:
//! - [`RateLimiter`] - governor (GCRA) pacing plus a semaphore for in-flight calls
//! - [`BackoffPolicy`] - bounded exponential backoff with jitter (tokio-retry2)
//! - [`retry_after_secs`] - reading a provider's `Retry-After` header

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backoff;
mod error;
mod headers;
mod limiter;

pub use backoff::BackoffPolicy;
pub use error::{RateLimitError, RateLimitErrorKind};
pub use headers::retry_after_secs;
pub use limiter::{RateLimiter, RateLimiterGuard};
