//! Shared HTTP plumbing for provider adapters.

use reqwest::{Client, Response};
use std::future::Future;
use std::time::{Duration, Instant};
use storyloom_config::AdapterConfig;
use storyloom_error::{ProviderError, ProviderErrorKind};
use storyloom_rate_limit::retry_after_secs;

/// Connection settings shared by the HTTP adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Adapter name
    pub name: String,
    /// API root, without a trailing slash
    pub base_url: String,
    /// Model identifier
    pub model: Option<String>,
    /// API key, absent for unauthenticated endpoints
    pub api_key: Option<String>,
    /// Credential identity shared with other adapters using the same key
    pub credential_id: Option<String>,
    /// Hard timeout per call
    pub timeout: Duration,
    /// Default voice for speech
    pub voice: Option<String>,
    /// Default size hint for images
    pub size: Option<String>,
}

impl HttpSettings {
    /// Settings for a local or test endpoint with no credential.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: None,
            api_key: None,
            credential_id: None,
            timeout: Duration::from_secs(60),
            voice: None,
            size: None,
        }
    }

    /// Settings from configuration and an already-resolved key.
    ///
    /// `default_base_url` is used when the configuration names none.
    pub fn from_config(
        config: &AdapterConfig,
        api_key: Option<String>,
        default_base_url: &str,
    ) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url.to_string());
        Self {
            name: config.name.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            credential_id: config.api_key_env.clone(),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            voice: config.voice.clone(),
            size: config.size.clone(),
        }
    }

    /// Join a path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Model name, or `fallback` when none is configured.
    pub fn model_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(fallback)
    }
}

/// Build the shared HTTP client.
pub(crate) fn client(provider: &str) -> Result<Client, ProviderError> {
    Client::builder().build().map_err(|e| {
        ProviderError::new(
            provider,
            ProviderErrorKind::InvalidResponse(format!("Failed to build HTTP client: {}", e)),
        )
    })
}

/// Run `call` under the adapter's hard timeout.
pub(crate) async fn enforce_timeout<T, F>(
    provider: &str,
    timeout: Duration,
    call: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    let started = Instant::now();
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::new(
            provider,
            ProviderErrorKind::Timeout {
                elapsed_ms: started.elapsed().as_millis() as u64,
            },
        )),
    }
}

/// Translate a transport failure.
pub(crate) fn transport_error(provider: &str, error: reqwest::Error) -> ProviderError {
    let kind = if error.is_timeout() {
        ProviderErrorKind::Timeout { elapsed_ms: 0 }
    } else if error.is_decode() {
        ProviderErrorKind::InvalidResponse(format!("Undecodable body: {}", error))
    } else {
        ProviderErrorKind::ServerError {
            status: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    };
    ProviderError::new(provider, kind)
}

/// Pass successful responses through and translate everything else.
pub(crate) async fn check_status(
    provider: &str,
    response: Response,
) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = retry_after_secs(response.headers());
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::new(
        provider,
        ProviderErrorKind::from_status(status.as_u16(), body, retry_after),
    ))
}

/// Parse a JSON body, translating failures to `InvalidResponse`.
pub(crate) async fn json_body<T: serde::de::DeserializeOwned>(
    provider: &str,
    response: Response,
) -> Result<T, ProviderError> {
    response.json::<T>().await.map_err(|e| {
        ProviderError::new(
            provider,
            ProviderErrorKind::InvalidResponse(format!("Failed to parse response: {}", e)),
        )
    })
}

/// Error for a request variant the adapter does not serve.
pub(crate) fn wrong_capability(provider: &str, wanted: &str) -> ProviderError {
    ProviderError::new(
        provider,
        ProviderErrorKind::InvalidResponse(format!("{} only serves {} requests", provider, wanted)),
    )
}
