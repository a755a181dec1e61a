//! fal.ai image adapter.

use crate::http::{
    HttpSettings, check_status, client, enforce_timeout, json_body, transport_error,
    wrong_capability,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use storyloom_core::{Capability, ProviderRequest, RawAsset};
use storyloom_error::{ProviderError, ProviderErrorKind};
use storyloom_interface::ProviderAdapter;
use tracing::instrument;

/// Default API root for synchronous runs.
pub(crate) const FAL_BASE_URL: &str = "https://fal.run";

#[derive(Debug, Serialize)]
struct FalRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<&'a str>,
    num_images: u32,
}

#[derive(Debug, Deserialize)]
struct FalResponse {
    #[serde(default)]
    images: Vec<FalImage>,
}

#[derive(Debug, Deserialize)]
struct FalImage {
    url: String,
}

/// fal.ai Flux-style image adapter.
///
/// Posts to `{base_url}/{model}` and returns the delivered image URL, which
/// fal expires after a while.
#[derive(Debug, Clone)]
pub struct FalImageAdapter {
    client: Client,
    settings: HttpSettings,
}

impl FalImageAdapter {
    /// Create the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: HttpSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: client(&settings.name)?,
            settings,
        })
    }

    async fn generate(&self, prompt: &str, size: Option<&str>) -> Result<RawAsset, ProviderError> {
        let name = self.settings.name.as_str();
        let body = FalRequest {
            prompt,
            image_size: size.or(self.settings.size.as_deref()),
            num_images: 1,
        };

        let mut builder = self
            .client
            .post(self.settings.url(self.settings.model_or("fal-ai/flux/schnell")))
            .json(&body);
        if let Some(key) = &self.settings.api_key {
            builder = builder.header("Authorization", format!("Key {}", key));
        }

        let response = builder.send().await.map_err(|e| transport_error(name, e))?;
        let response = check_status(name, response).await?;
        let parsed: FalResponse = json_body(name, response).await?;

        parsed
            .images
            .into_iter()
            .next()
            .map(|image| RawAsset::Url(image.url))
            .ok_or_else(|| {
                ProviderError::new(
                    name,
                    ProviderErrorKind::InvalidResponse("Response contained no image".to_string()),
                )
            })
    }
}

#[async_trait]
impl ProviderAdapter for FalImageAdapter {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn capability(&self) -> Capability {
        Capability::Image
    }

    fn credential_id(&self) -> Option<&str> {
        self.settings.credential_id.as_deref()
    }

    #[instrument(skip(self, request), fields(provider = %self.settings.name))]
    async fn invoke(&self, request: &ProviderRequest) -> Result<RawAsset, ProviderError> {
        let ProviderRequest::Image(image) = request else {
            return Err(wrong_capability(&self.settings.name, "image"));
        };
        enforce_timeout(
            &self.settings.name,
            self.settings.timeout,
            self.generate(&image.prompt, image.size.as_deref()),
        )
        .await
    }
}
