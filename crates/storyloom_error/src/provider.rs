//! Provider error types and retry classification.

use std::time::Duration;

/// Normalized failure conditions for a generative provider call.
///
/// Every adapter translates its provider-specific failures into one of these
/// kinds so fallback chains can treat providers interchangeably.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ProviderErrorKind {
    /// The call exceeded the adapter's hard timeout
    #[display("Request timed out after {}ms", elapsed_ms)]
    Timeout {
        /// Time spent before giving up, in milliseconds
        elapsed_ms: u64,
    },
    /// Credentials were rejected (401/403)
    #[display("Unauthorized: {}", _0)]
    Unauthorized(String),
    /// Provider is throttling requests (429)
    #[display("Rate limited (retry after {:?}s)", retry_after_secs)]
    RateLimited {
        /// Seconds the provider asked us to wait, if it said
        retry_after_secs: Option<u64>,
    },
    /// Provider-side or transport failure (5xx, connection reset)
    #[display("Server error {:?}: {}", status, message)]
    ServerError {
        /// HTTP status code, absent for transport failures
        status: Option<u16>,
        /// Error message or response body
        message: String,
    },
    /// Response did not have the expected shape
    #[display("Invalid response: {}", _0)]
    InvalidResponse(String),
}

impl ProviderErrorKind {
    /// Translate an HTTP status code into a provider error kind.
    ///
    /// Only called for non-success statuses.
    ///
    /// # Examples
    ///
    /// ```
    /// use storyloom_error::ProviderErrorKind;
    ///
    /// let kind = ProviderErrorKind::from_status(503, "overloaded", None);
    /// assert!(matches!(kind, ProviderErrorKind::ServerError { status: Some(503), .. }));
    ///
    /// let kind = ProviderErrorKind::from_status(401, "bad key", None);
    /// assert!(matches!(kind, ProviderErrorKind::Unauthorized(_)));
    /// ```
    pub fn from_status(status: u16, body: impl Into<String>, retry_after_secs: Option<u64>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => ProviderErrorKind::Unauthorized(body),
            429 => ProviderErrorKind::RateLimited { retry_after_secs },
            408 => ProviderErrorKind::Timeout { elapsed_ms: 0 },
            500..=599 => ProviderErrorKind::ServerError {
                status: Some(status),
                message: body,
            },
            _ => ProviderErrorKind::InvalidResponse(format!("HTTP {}: {}", status, body)),
        }
    }

    /// Check if this error type is transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::Timeout { .. }
                | ProviderErrorKind::RateLimited { .. }
                | ProviderErrorKind::ServerError { .. }
        )
    }

    /// How long the provider asked us to wait before trying again.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderErrorKind::RateLimited {
                retry_after_secs: Some(secs),
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use storyloom_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new("fal", ProviderErrorKind::Timeout { elapsed_ms: 30_000 });
/// assert!(format!("{}", err).contains("timed out"));
/// assert_eq!(err.provider, "fal");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error ({}): {} at line {} in {}", provider, kind, line, file)]
pub struct ProviderError {
    /// Name of the adapter that failed
    pub provider: String,
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(provider: impl Into<String>, kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            provider: provider.into(),
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether the provider rejected our credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.kind, ProviderErrorKind::Unauthorized(_))
    }
}

/// Trait for errors that support retry logic.
///
/// # Examples
///
/// ```
/// use storyloom_error::{ProviderError, ProviderErrorKind, RetryableError};
///
/// let err = ProviderError::new("elevenlabs", ProviderErrorKind::ServerError {
///     status: Some(503),
///     message: "Service unavailable".to_string(),
/// });
///
/// assert!(err.is_retryable());
/// assert_eq!(err.retry_after(), None);
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    ///
    /// Transient errors like 503, 429, or timeouts return true. Permanent
    /// errors like 401 or a malformed response return false.
    fn is_retryable(&self) -> bool;

    /// Minimum wait the failing side asked for, e.g. from `Retry-After`.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl RetryableError for ProviderError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    fn retry_after(&self) -> Option<Duration> {
        self.kind.retry_after()
    }
}
