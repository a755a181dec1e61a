//! Rate limiting decorator for adapters.

use async_trait::async_trait;
use std::sync::Arc;
use storyloom_core::{Capability, ProviderRequest, RawAsset};
use storyloom_error::{ProviderError, ProviderErrorKind};
use storyloom_interface::ProviderAdapter;
use storyloom_rate_limit::RateLimiter;

/// Waits on a [`RateLimiter`] before every call to the wrapped adapter.
#[derive(Clone)]
pub struct RateLimitedAdapter {
    inner: Arc<dyn ProviderAdapter>,
    limiter: RateLimiter,
}

impl RateLimitedAdapter {
    /// Wrap `inner` with `limiter`.
    pub fn new(inner: Arc<dyn ProviderAdapter>, limiter: RateLimiter) -> Self {
        Self { inner, limiter }
    }

    /// The wrapped adapter.
    pub fn inner(&self) -> &Arc<dyn ProviderAdapter> {
        &self.inner
    }
}

#[async_trait]
impl ProviderAdapter for RateLimitedAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn capability(&self) -> Capability {
        self.inner.capability()
    }

    fn credential_id(&self) -> Option<&str> {
        self.inner.credential_id()
    }

    async fn invoke(&self, request: &ProviderRequest) -> Result<RawAsset, ProviderError> {
        let _guard = self.limiter.acquire().await.map_err(|e| {
            ProviderError::new(
                self.inner.name(),
                ProviderErrorKind::ServerError {
                    status: None,
                    message: e.to_string(),
                },
            )
        })?;
        self.inner.invoke(request).await
    }
}
