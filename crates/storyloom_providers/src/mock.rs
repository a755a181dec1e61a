//! Scripted adapter for tests and local development.

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storyloom_core::{Capability, ProviderRequest, RawAsset};
use storyloom_error::{ProviderError, ProviderErrorKind};
use storyloom_interface::ProviderAdapter;

/// A single mock response (success or error).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// Return this asset
    Success(RawAsset),
    /// Fail with this error
    Error(ProviderErrorKind),
}

type Responder = Arc<dyn Fn(usize, &ProviderRequest) -> MockResponse + Send + Sync>;

/// Behavior configuration for mock responses.
#[derive(Clone)]
pub enum MockBehavior {
    /// Always return the given asset
    Success(RawAsset),
    /// Always return the specified error
    Error(ProviderErrorKind),
    /// Fail N times with the error, then succeed
    FailThenSucceed {
        /// Failures before the first success
        fail_count: usize,
        /// Error to fail with
        error: ProviderErrorKind,
        /// Asset returned afterwards
        success: RawAsset,
    },
    /// Return a sequence of responses; calls past the end fail
    Sequence(Vec<MockResponse>),
    /// Decide per call from the zero-based call index and the request
    Respond(Responder),
}

impl fmt::Debug for MockBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MockBehavior::Success(asset) => f.debug_tuple("Success").field(asset).finish(),
            MockBehavior::Error(kind) => f.debug_tuple("Error").field(kind).finish(),
            MockBehavior::FailThenSucceed { fail_count, .. } => f
                .debug_struct("FailThenSucceed")
                .field("fail_count", fail_count)
                .finish_non_exhaustive(),
            MockBehavior::Sequence(responses) => {
                f.debug_tuple("Sequence").field(&responses.len()).finish()
            }
            MockBehavior::Respond(_) => f.write_str("Respond(..)"),
        }
    }
}

/// Scripted provider adapter.
///
/// Records every request it receives and counts calls, so tests can verify
/// which adapters a chain touched and with what prompts.
///
/// # Examples
///
/// ```
/// use storyloom_core::{Capability, ImageRequest, ProviderRequest, RawAsset};
/// use storyloom_error::ProviderErrorKind;
/// use storyloom_interface::ProviderAdapter;
/// use storyloom_providers::MockAdapter;
///
/// # #[tokio::main]
/// # async fn main() {
/// let mock = MockAdapter::fail_then_succeed(
///     "flaky",
///     Capability::Image,
///     1,
///     ProviderErrorKind::Timeout { elapsed_ms: 5 },
///     RawAsset::Url("https://cdn.example.com/a.png".to_string()),
/// );
/// let request = ProviderRequest::from(ImageRequest { prompt: "a cat".into(), size: None });
///
/// assert!(mock.invoke(&request).await.is_err());
/// assert!(mock.invoke(&request).await.is_ok());
/// assert_eq!(mock.call_count(), 2);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockAdapter {
    name: String,
    capability: Capability,
    credential_id: Option<String>,
    behavior: MockBehavior,
    latency: Option<Duration>,
    call_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl MockAdapter {
    /// Create a mock with custom behavior.
    pub fn new(name: impl Into<String>, capability: Capability, behavior: MockBehavior) -> Self {
        Self {
            name: name.into(),
            capability,
            credential_id: None,
            behavior,
            latency: None,
            call_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always succeeds with the given asset.
    pub fn success(name: impl Into<String>, capability: Capability, asset: RawAsset) -> Self {
        Self::new(name, capability, MockBehavior::Success(asset))
    }

    /// Create a mock that always fails with the given error.
    pub fn failing(name: impl Into<String>, capability: Capability, error: ProviderErrorKind) -> Self {
        Self::new(name, capability, MockBehavior::Error(error))
    }

    /// Create a mock that fails N times, then succeeds.
    pub fn fail_then_succeed(
        name: impl Into<String>,
        capability: Capability,
        fail_count: usize,
        error: ProviderErrorKind,
        success: RawAsset,
    ) -> Self {
        Self::new(
            name,
            capability,
            MockBehavior::FailThenSucceed {
                fail_count,
                error,
                success,
            },
        )
    }

    /// Create a mock with a sequence of responses.
    pub fn sequence(
        name: impl Into<String>,
        capability: Capability,
        responses: Vec<MockResponse>,
    ) -> Self {
        Self::new(name, capability, MockBehavior::Sequence(responses))
    }

    /// Create a mock that decides each response from the call index and request.
    pub fn responding<F>(name: impl Into<String>, capability: Capability, respond: F) -> Self
    where
        F: Fn(usize, &ProviderRequest) -> MockResponse + Send + Sync + 'static,
    {
        Self::new(name, capability, MockBehavior::Respond(Arc::new(respond)))
    }

    /// Canned output for local development without provider keys.
    pub fn canned(name: impl Into<String>, capability: Capability) -> Self {
        let capability_for_responder = capability;
        Self::responding(name, capability, move |call, request| {
            MockResponse::Success(canned_asset(capability_for_responder, call, request))
        })
    }

    /// Report this credential identity.
    pub fn with_credential(mut self, credential_id: impl Into<String>) -> Self {
        self.credential_id = Some(credential_id.into());
        self
    }

    /// Sleep this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of times `invoke` was called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count to zero and forget recorded requests.
    pub fn reset(&self) {
        self.call_count.store(0, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn next_response(&self, request: &ProviderRequest) -> MockResponse {
        let current = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        match &self.behavior {
            MockBehavior::Success(asset) => MockResponse::Success(asset.clone()),
            MockBehavior::Error(kind) => MockResponse::Error(kind.clone()),
            MockBehavior::FailThenSucceed {
                fail_count,
                error,
                success,
            } => {
                if current < *fail_count {
                    MockResponse::Error(error.clone())
                } else {
                    MockResponse::Success(success.clone())
                }
            }
            MockBehavior::Sequence(responses) => {
                responses.get(current).cloned().unwrap_or_else(|| {
                    MockResponse::Error(ProviderErrorKind::InvalidResponse(format!(
                        "Mock sequence exhausted (call {} beyond {} responses)",
                        current + 1,
                        responses.len()
                    )))
                })
            }
            MockBehavior::Respond(respond) => respond(current, request),
        }
    }
}

fn canned_asset(capability: Capability, call: usize, request: &ProviderRequest) -> RawAsset {
    match (capability, request) {
        (Capability::Text, _) => RawAsset::Text(
            "Title: The Borrowed Star\n\n\
             Page 1\nA small star fell into the garden one night.\n\n\
             Page 2\nIt glowed softly under the roses, a little scared.\n\n\
             Page 3\nBy morning it had made a friend and flew home happy."
                .to_string(),
        ),
        (Capability::Image, _) => RawAsset::Url(format!(
            "https://placehold.co/1024x768/png?text=storyloom+{}",
            call + 1
        )),
        (Capability::Speech, _) => RawAsset::Bytes {
            data: b"ID3\x04\x00\x00\x00\x00\x00\x00".to_vec(),
            mime_type: "audio/mpeg".to_string(),
        },
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    fn credential_id(&self) -> Option<&str> {
        self.credential_id.as_deref()
    }

    async fn invoke(&self, request: &ProviderRequest) -> Result<RawAsset, ProviderError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self.next_response(request) {
            MockResponse::Success(asset) => Ok(asset),
            MockResponse::Error(kind) => Err(ProviderError::new(self.name.clone(), kind)),
        }
    }
}
