//! Aggregate failure of a fallback chain.

use crate::ProviderError;
use std::time::Duration;

/// One adapter's failure inside a fallback chain, in attempt order.
#[derive(Debug, Clone, derive_more::Display)]
#[display("{}: {}", provider, error)]
pub struct ProviderFailure {
    /// Adapter name
    pub provider: String,
    /// What went wrong
    pub error: ProviderError,
}

/// Every adapter in a chain failed.
///
/// Carries one entry per attempted adapter so the caller can log the full
/// sequence of failures.
///
/// # Examples
///
/// ```
/// use storyloom_error::{AggregateError, ProviderError, ProviderErrorKind, ProviderFailure};
///
/// let err = AggregateError::new(
///     "image",
///     vec![ProviderFailure {
///         provider: "fal".to_string(),
///         error: ProviderError::new("fal", ProviderErrorKind::Timeout { elapsed_ms: 30_000 }),
///     }],
/// );
/// assert_eq!(err.failures.len(), 1);
/// assert!(format!("{}", err).contains("image"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("All {} providers failed at line {} in {}", capability, line, file)]
pub struct AggregateError {
    /// Capability the chain serves
    pub capability: String,
    /// Failures in attempt order
    pub failures: Vec<ProviderFailure>,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl AggregateError {
    /// Create a new AggregateError with automatic location tracking.
    #[track_caller]
    pub fn new(capability: impl Into<String>, failures: Vec<ProviderFailure>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            capability: capability.into(),
            failures,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether any recorded failure was a credential rejection.
    pub fn saw_unauthorized(&self) -> bool {
        self.failures.iter().any(|f| f.error.is_unauthorized())
    }
}

impl crate::RetryableError for AggregateError {
    /// Worth retrying when any adapter failed transiently.
    fn is_retryable(&self) -> bool {
        self.failures.iter().any(|f| f.error.kind.is_retryable())
    }

    /// The longest wait any adapter asked for.
    fn retry_after(&self) -> Option<Duration> {
        self.failures
            .iter()
            .filter_map(|f| f.error.kind.retry_after())
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProviderErrorKind, RetryableError};

    fn failure(provider: &str, kind: ProviderErrorKind) -> ProviderFailure {
        ProviderFailure {
            provider: provider.to_string(),
            error: ProviderError::new(provider, kind),
        }
    }

    #[test]
    fn test_retry_after_is_the_longest_requested_wait() {
        let err = AggregateError::new(
            "speech",
            vec![
                failure(
                    "elevenlabs",
                    ProviderErrorKind::RateLimited {
                        retry_after_secs: Some(2),
                    },
                ),
                failure(
                    "openai-speech",
                    ProviderErrorKind::RateLimited {
                        retry_after_secs: Some(5),
                    },
                ),
                failure("local", ProviderErrorKind::Timeout { elapsed_ms: 10 }),
            ],
        );
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_empty_aggregate_is_permanent() {
        let err = AggregateError::new("speech", Vec::new());
        assert!(!err.is_retryable());
        assert_eq!(err.retry_after(), None);
    }
}
