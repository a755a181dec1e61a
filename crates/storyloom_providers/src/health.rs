//! Shared provider health context.

use std::collections::HashMap;
use std::sync::Arc;
use storyloom_error::{ProviderError, ProviderErrorKind};
use storyloom_interface::ProviderStatus;
use tokio::sync::watch;
use tracing::debug;

/// Last observed status of every provider.
///
/// Cloning shares the same state. Readers take a snapshot or subscribe to
/// changes.
///
/// # Examples
///
/// ```
/// use storyloom_error::{ProviderError, ProviderErrorKind};
/// use storyloom_interface::ProviderStatus;
/// use storyloom_providers::ProviderHealth;
///
/// let health = ProviderHealth::new();
/// health.record_failure(&ProviderError::new("fal", ProviderErrorKind::Unauthorized("bad key".into())));
/// assert_eq!(health.status("fal"), ProviderStatus::Unauthorized);
///
/// health.record_success("fal");
/// assert!(health.status("fal").is_healthy());
/// ```
#[derive(Debug, Clone)]
pub struct ProviderHealth {
    sender: Arc<watch::Sender<HashMap<String, ProviderStatus>>>,
}

impl Default for ProviderHealth {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderHealth {
    /// Create an empty health context.
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(HashMap::new());
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Record a successful call.
    pub fn record_success(&self, provider: &str) {
        self.set(provider, ProviderStatus::Healthy);
    }

    /// Record a failed call.
    pub fn record_failure(&self, error: &ProviderError) {
        let status = match &error.kind {
            ProviderErrorKind::Unauthorized(_) => ProviderStatus::Unauthorized,
            kind => ProviderStatus::Degraded {
                reason: kind.to_string(),
            },
        };
        self.set(&error.provider, status);
    }

    /// Status of one provider. Providers never seen are healthy.
    pub fn status(&self, provider: &str) -> ProviderStatus {
        self.sender
            .borrow()
            .get(provider)
            .cloned()
            .unwrap_or_default()
    }

    /// Copy of every known status.
    pub fn snapshot(&self) -> HashMap<String, ProviderStatus> {
        self.sender.borrow().clone()
    }

    /// Receive every change from now on.
    pub fn subscribe(&self) -> watch::Receiver<HashMap<String, ProviderStatus>> {
        self.sender.subscribe()
    }

    /// Whether any provider is not healthy.
    pub fn any_degraded(&self) -> bool {
        self.sender.borrow().values().any(|s| !s.is_healthy())
    }

    fn set(&self, provider: &str, status: ProviderStatus) {
        self.sender.send_if_modified(|statuses| {
            if statuses.get(provider) == Some(&status) {
                return false;
            }
            debug!(provider, ?status, "Provider status changed");
            statuses.insert(provider.to_string(), status);
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let health = ProviderHealth::new();
        let mut receiver = health.subscribe();

        health.record_failure(&ProviderError::new(
            "openai",
            ProviderErrorKind::ServerError {
                status: Some(500),
                message: "boom".to_string(),
            },
        ));

        receiver.changed().await.unwrap();
        let statuses = receiver.borrow_and_update().clone();
        assert!(matches!(
            statuses.get("openai"),
            Some(ProviderStatus::Degraded { .. })
        ));
        assert!(health.any_degraded());
    }

    #[test]
    fn test_repeated_status_does_not_notify() {
        let health = ProviderHealth::new();
        let receiver = health.subscribe();
        health.record_success("fal");
        assert!(receiver.has_changed().unwrap());

        let mut receiver = health.subscribe();
        receiver.mark_unchanged();
        health.record_success("fal");
        assert!(!receiver.has_changed().unwrap());
    }
}
