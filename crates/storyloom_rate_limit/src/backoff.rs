//! Bounded exponential backoff with jitter.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use storyloom_error::RetryableError;
use tokio_retry2::strategy::jitter;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, warn};

/// Exponential backoff: `initial`, `initial * 2`, ... capped at `max_delay`,
/// each delay jittered, at most `retries` retries after the first attempt.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use storyloom_rate_limit::BackoffPolicy;
///
/// let policy = BackoffPolicy::new(Duration::from_millis(500), Duration::from_secs(8), 3);
/// let delays: Vec<Duration> = policy.base_delays().collect();
/// assert_eq!(
///     delays,
///     vec![
///         Duration::from_millis(500),
///         Duration::from_millis(1000),
///         Duration::from_millis(2000),
///     ]
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    initial: Duration,
    max_delay: Duration,
    retries: usize,
}

impl BackoffPolicy {
    /// Doubling backoff from `initial`, capped at `max_delay`.
    pub fn new(initial: Duration, max_delay: Duration, retries: usize) -> Self {
        Self {
            initial,
            max_delay,
            retries,
        }
    }

    /// Number of retries after the first attempt.
    pub fn retries(&self) -> usize {
        self.retries
    }

    /// Delays before each retry, without jitter.
    pub fn base_delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let Self {
            initial,
            max_delay,
            retries,
        } = *self;
        (0..retries).map(move |n| {
            let multiplier = 2u32.saturating_pow(n as u32);
            initial.saturating_mul(multiplier).min(max_delay)
        })
    }

    /// Run `operation`, retrying transient failures.
    ///
    /// Errors whose [`RetryableError::is_retryable`] is false fail immediately.
    pub async fn retry<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + Display,
    {
        self.retry_if(operation, |e: &E| e.is_retryable()).await
    }

    /// Run `operation`, retrying failures that `is_transient` accepts.
    ///
    /// A retried error that asks for a wait through
    /// [`RetryableError::retry_after`] delays the next attempt by at least
    /// that long.
    pub async fn retry_if<F, Fut, T, E, P>(
        &self,
        mut operation: F,
        is_transient: P,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + Display,
        P: Fn(&E) -> bool,
    {
        let strategy = self.base_delays().map(jitter);
        let is_transient = &is_transient;
        let retries = self.retries;
        let mut attempts = 0usize;

        Retry::spawn(strategy, move || {
            attempts += 1;
            let another_attempt = attempts <= retries;
            let attempt = operation();
            async move {
                match attempt.await {
                    Ok(value) => Ok(value),
                    Err(e) if is_transient(&e) => {
                        let retry_after = e.retry_after();
                        warn!(error = %e, ?retry_after, "Transient error, will retry");
                        if let Some(wait) = retry_after
                            && another_attempt
                        {
                            debug!(wait_ms = wait.as_millis() as u64, "Honouring requested wait");
                            tokio::time::sleep(wait).await;
                        }
                        Err(RetryError::Transient {
                            err: e,
                            retry_after,
                        })
                    }
                    Err(e) => {
                        warn!(error = %e, "Permanent error, failing immediately");
                        Err(RetryError::Permanent(e))
                    }
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storyloom_error::{ProviderError, ProviderErrorKind};

    fn quick() -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_millis(1), Duration::from_millis(4), 3)
    }

    #[test]
    fn test_delays_are_capped() {
        let policy = BackoffPolicy::new(Duration::from_millis(500), Duration::from_secs(8), 6);
        let delays: Vec<u128> = policy.base_delays().map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![500, 1000, 2000, 4000, 8000, 8000]);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result: Result<&str, ProviderError> = quick()
            .retry(|| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ProviderError::new(
                            "elevenlabs",
                            ProviderErrorKind::ServerError {
                                status: Some(503),
                                message: "busy".to_string(),
                            },
                        ))
                    } else {
                        Ok("audio")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "audio");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_stop_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result: Result<(), ProviderError> = quick()
            .retry(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ProviderError::new(
                        "elevenlabs",
                        ProviderErrorKind::Unauthorized("bad key".to_string()),
                    ))
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result: Result<(), ProviderError> = quick()
            .retry(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ProviderError::new(
                        "elevenlabs",
                        ProviderErrorKind::Timeout { elapsed_ms: 10 },
                    ))
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_rate_limit_waits_for_retry_after() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let started = std::time::Instant::now();
        let result: Result<&str, ProviderError> = quick()
            .retry(|| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(ProviderError::new(
                            "openai-speech",
                            ProviderErrorKind::RateLimited {
                                retry_after_secs: Some(1),
                            },
                        ))
                    } else {
                        Ok("audio")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "audio");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_rejected_by_predicate_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result: Result<(), ProviderError> = quick()
            .retry_if(
                || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err(ProviderError::new(
                            "elevenlabs",
                            ProviderErrorKind::ServerError {
                                status: Some(503),
                                message: "busy".to_string(),
                            },
                        ))
                    }
                },
                |_| false,
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
