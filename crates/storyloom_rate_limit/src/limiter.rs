//! Rate limiter implementation using governor and Tokio Semaphore.
//!
//! The GCRA (Generic Cell Rate Algorithm) from governor spaces requests out
//! in time, while the semaphore bounds how many are in flight at once.

use crate::{RateLimitError, RateLimitErrorKind};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

// Type alias for our direct rate limiter
type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Paces and bounds calls to one provider.
///
/// Cloning shares the underlying quota and semaphore.
///
/// # Example
///
/// ```
/// use storyloom_rate_limit::RateLimiter;
///
/// # #[tokio::main]
/// # async fn main() {
/// let limiter = RateLimiter::new(Some(60), 1);
/// let guard = limiter.acquire().await.unwrap();
/// // Make API call...
/// drop(guard); // Releases the in-flight slot
/// # }
/// ```
#[derive(Clone)]
pub struct RateLimiter {
    // Request pacing, absent when unlimited
    pacer: Option<Arc<DirectRateLimiter>>,

    // In-flight request semaphore
    concurrent_semaphore: Arc<Semaphore>,
}

impl RateLimiter {
    /// Create a limiter from a requests-per-minute quota and an in-flight cap.
    ///
    /// `None` or zero requests per minute means unpaced. A zero in-flight cap
    /// is raised to one.
    pub fn new(requests_per_minute: Option<u32>, max_concurrent: u32) -> Self {
        let pacer = requests_per_minute.and_then(NonZeroU32::new).map(|n| {
            let quota = Quota::per_minute(n);
            Arc::new(GovernorRateLimiter::direct(quota))
        });

        Self {
            pacer,
            concurrent_semaphore: Arc::new(Semaphore::new(max_concurrent.max(1) as usize)),
        }
    }

    /// Create a limiter that lets one request through per `interval`.
    ///
    /// The first request passes immediately.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuota` for a zero interval.
    pub fn paced(interval: Duration) -> Result<Self, RateLimitError> {
        let quota = Quota::with_period(interval).ok_or_else(|| {
            RateLimitError::new(RateLimitErrorKind::InvalidQuota(
                "pacing interval must be non-zero".to_string(),
            ))
        })?;
        debug!(interval_ms = interval.as_millis() as u64, "Creating paced limiter");

        Ok(Self {
            pacer: Some(Arc::new(GovernorRateLimiter::direct(
                quota.allow_burst(NonZeroU32::MIN),
            ))),
            concurrent_semaphore: Arc::new(Semaphore::new(1)),
        })
    }

    /// Wait until the quota allows a request and an in-flight slot is free.
    ///
    /// Returns a guard that releases the slot when dropped.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the semaphore was closed.
    pub async fn acquire(&self) -> Result<RateLimiterGuard, RateLimitError> {
        if let Some(pacer) = &self.pacer {
            pacer.until_ready().await;
        }

        // Acquire slot last to avoid holding it while waiting on the quota
        let permit = self
            .concurrent_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| RateLimitError::new(RateLimitErrorKind::Closed))?;

        Ok(RateLimiterGuard { _permit: permit })
    }

    /// Try to acquire without waiting.
    ///
    /// Returns None if the quota or the in-flight cap would block.
    pub fn try_acquire(&self) -> Option<RateLimiterGuard> {
        if let Some(pacer) = &self.pacer {
            pacer.check().ok()?;
        }

        let permit = self.concurrent_semaphore.clone().try_acquire_owned().ok()?;

        Some(RateLimiterGuard { _permit: permit })
    }

    /// In-flight slots currently free.
    pub fn available_slots(&self) -> usize {
        self.concurrent_semaphore.available_permits()
    }
}

/// RAII guard for rate limiter.
///
/// Releases the in-flight slot when dropped, even if the call fails or panics.
#[derive(Debug)]
pub struct RateLimiterGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
