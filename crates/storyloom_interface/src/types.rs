//! Shared types for the interface traits.

use serde::{Deserialize, Serialize};
use storyloom_core::Stage;

/// Health of a single provider as last observed.
///
/// # Examples
///
/// ```
/// use storyloom_interface::ProviderStatus;
///
/// let status = ProviderStatus::Degraded { reason: "timeout".to_string() };
/// assert!(!status.is_healthy());
/// assert!(ProviderStatus::Healthy.is_healthy());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderStatus {
    /// Last call succeeded
    #[default]
    Healthy,
    /// Last call failed transiently or returned garbage
    Degraded {
        /// Description of the last failure
        reason: String,
    },
    /// Credentials were rejected
    Unauthorized,
}

impl ProviderStatus {
    /// Whether the provider's last call succeeded.
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProviderStatus::Healthy)
    }
}

/// A typed notification from the generator or repair engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GenerationEvent {
    /// The pipeline entered a new stage
    StageChanged {
        /// Stage entered
        stage: Stage,
        /// Progress percentage
        progress: u8,
        /// Status line
        label: String,
    },
    /// Progress moved within a stage
    Progress {
        /// Progress percentage
        progress: u8,
        /// Status line
        label: String,
    },
    /// An asset URL was replaced
    AssetFixed {
        /// URL before the fix
        original: String,
        /// URL after the fix
        fixed: String,
    },
}
