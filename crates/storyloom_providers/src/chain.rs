//! Ordered fallback across interchangeable adapters.

use crate::{ProviderHealth, ProviderMetrics};
use std::sync::Arc;
use std::time::Instant;
use storyloom_core::{Capability, ProviderRequest, RawAsset};
use storyloom_error::{AggregateError, ProviderFailure};
use storyloom_interface::ProviderAdapter;
use tracing::{debug, info, instrument, warn};

/// Result of a chain that found a working adapter.
#[derive(Debug, Clone)]
pub struct ChainSuccess {
    /// What the adapter returned
    pub asset: RawAsset,
    /// Name of the adapter that succeeded
    pub provider: String,
    /// Failures of the adapters tried before it, in order
    pub failures: Vec<ProviderFailure>,
}

/// Tries adapters for one capability strictly in configured order.
///
/// The first success short-circuits. Every failure is recorded and the next
/// adapter tried, except that `Unauthorized` ends the chain when every
/// remaining adapter uses the same credential. There is no racing.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use storyloom_core::{Capability, ImageRequest, ProviderRequest, RawAsset};
/// use storyloom_error::ProviderErrorKind;
/// use storyloom_providers::{FallbackChain, MockAdapter, ProviderHealth};
///
/// # #[tokio::main]
/// # async fn main() {
/// let down = Arc::new(MockAdapter::failing(
///     "fal",
///     Capability::Image,
///     ProviderErrorKind::ServerError { status: Some(502), message: "bad gateway".into() },
/// ));
/// let up = Arc::new(MockAdapter::success(
///     "openai",
///     Capability::Image,
///     RawAsset::Url("https://img.example.com/1.png".into()),
/// ));
///
/// let chain = FallbackChain::new(Capability::Image, vec![down, up], ProviderHealth::new());
/// let request = ProviderRequest::from(ImageRequest { prompt: "a fox".into(), size: None });
/// let success = chain.execute(&request).await.unwrap();
///
/// assert_eq!(success.provider, "openai");
/// assert_eq!(success.failures.len(), 1);
/// # }
/// ```
#[derive(Clone)]
pub struct FallbackChain {
    capability: Capability,
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    health: ProviderHealth,
}

impl FallbackChain {
    /// Create a chain over `adapters`, tried in the order given.
    pub fn new(
        capability: Capability,
        adapters: Vec<Arc<dyn ProviderAdapter>>,
        health: ProviderHealth,
    ) -> Self {
        Self {
            capability,
            adapters,
            health,
        }
    }

    /// Capability served.
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Whether the chain has no adapters.
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Number of adapters.
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Adapter names in order.
    pub fn provider_names(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.name().to_string()).collect()
    }

    /// Shared health context.
    pub fn health(&self) -> &ProviderHealth {
        &self.health
    }

    /// Try each adapter in order until one succeeds.
    ///
    /// # Errors
    ///
    /// Returns an [`AggregateError`] holding every failure, in order, when no
    /// adapter succeeds.
    #[instrument(skip(self, request), fields(capability = %self.capability, adapters = self.adapters.len()))]
    pub async fn execute(&self, request: &ProviderRequest) -> Result<ChainSuccess, AggregateError> {
        let metrics = ProviderMetrics::get();
        let mut failures = Vec::new();

        for (position, adapter) in self.adapters.iter().enumerate() {
            let name = adapter.name().to_string();
            debug!(provider = %name, position, "Trying adapter");
            let started = Instant::now();

            match adapter.invoke(request).await {
                Ok(asset) => {
                    metrics.record_request(
                        &name,
                        self.capability,
                        started.elapsed().as_secs_f64(),
                    );
                    self.health.record_success(&name);
                    if !failures.is_empty() {
                        info!(provider = %name, skipped = failures.len(), "Fallback adapter succeeded");
                    }
                    return Ok(ChainSuccess {
                        asset,
                        provider: name,
                        failures,
                    });
                }
                Err(error) => {
                    warn!(provider = %name, error = %error.kind, "Adapter failed");
                    metrics.record_error(&name, self.capability, &error.kind);
                    self.health.record_failure(&error);

                    let stop = error.is_unauthorized()
                        && self.remaining_share_credential(position, adapter.credential_id());
                    failures.push(ProviderFailure {
                        provider: name,
                        error,
                    });
                    if stop {
                        warn!("Remaining adapters share the rejected credential, stopping chain");
                        break;
                    }
                }
            }
        }

        metrics.record_exhausted(self.capability);
        Err(AggregateError::new(self.capability.to_string(), failures))
    }

    fn remaining_share_credential(&self, position: usize, credential: Option<&str>) -> bool {
        let Some(credential) = credential else {
            return false;
        };
        let remaining = &self.adapters[position + 1..];
        !remaining.is_empty()
            && remaining
                .iter()
                .all(|a| a.credential_id() == Some(credential))
    }
}
