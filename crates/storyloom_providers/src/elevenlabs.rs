//! ElevenLabs text-to-speech adapter.

use crate::http::{
    HttpSettings, check_status, client, enforce_timeout, transport_error, wrong_capability,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use storyloom_core::{Capability, ProviderRequest, RawAsset};
use storyloom_error::{ProviderError, ProviderErrorKind};
use storyloom_interface::ProviderAdapter;
use tracing::instrument;

/// Default API root.
pub(crate) const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Voice used when neither request nor configuration names one.
const DEFAULT_VOICE: &str = "21m00Tcm4TlvDq8ikWAM";

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// ElevenLabs text-to-speech adapter returning MP3 bytes.
#[derive(Debug, Clone)]
pub struct ElevenLabsSpeechAdapter {
    client: Client,
    settings: HttpSettings,
}

impl ElevenLabsSpeechAdapter {
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

    async fn speak(&self, text: &str, voice: Option<&str>) -> Result<RawAsset, ProviderError> {
        let name = self.settings.name.as_str();
        let voice = voice
            .or(self.settings.voice.as_deref())
            .unwrap_or(DEFAULT_VOICE);
        let body = SpeechBody {
            text,
            model_id: self.settings.model_or("eleven_multilingual_v2"),
        };

        let mut builder = self
            .client
            .post(self.settings.url(&format!("text-to-speech/{}", voice)))
            .header("Accept", "audio/mpeg")
            .json(&body);
        if let Some(key) = &self.settings.api_key {
            builder = builder.header("xi-api-key", key);
        }

        let response = builder.send().await.map_err(|e| transport_error(name, e))?;
        let response = check_status(name, response).await?;
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("audio/"))
            .unwrap_or("audio/mpeg")
            .to_string();
        let data = response
            .bytes()
            .await
            .map_err(|e| transport_error(name, e))?;
        if data.is_empty() {
            return Err(ProviderError::new(
                name,
                ProviderErrorKind::InvalidResponse("Empty audio body".to_string()),
            ));
        }

        Ok(RawAsset::Bytes {
            data: data.to_vec(),
            mime_type,
        })
    }
}

#[async_trait]
impl ProviderAdapter for ElevenLabsSpeechAdapter {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn capability(&self) -> Capability {
        Capability::Speech
    }

    fn credential_id(&self) -> Option<&str> {
        self.settings.credential_id.as_deref()
    }

    #[instrument(skip(self, request), fields(provider = %self.settings.name))]
    async fn invoke(&self, request: &ProviderRequest) -> Result<RawAsset, ProviderError> {
        let ProviderRequest::Speech(speech) = request else {
            return Err(wrong_capability(&self.settings.name, "speech"));
        };
        enforce_timeout(
            &self.settings.name,
            self.settings.timeout,
            self.speak(&speech.text, speech.voice_id.as_deref()),
        )
        .await
    }
}
