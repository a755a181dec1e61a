//! OpenAI-compatible chat, image, and speech adapters.
//!
//! These speak the OpenAI wire format, which many providers (Groq,
//! OpenRouter, local servers) also accept.

use crate::http::{
    HttpSettings, check_status, client, enforce_timeout, json_body, transport_error,
    wrong_capability,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use storyloom_core::{Capability, ProviderRequest, RawAsset, Role, TextRequest};
use storyloom_error::{ProviderError, ProviderErrorKind};
use storyloom_interface::ProviderAdapter;
use tracing::{debug, instrument};

/// Default API root.
pub(crate) const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn chat_messages(request: &TextRequest) -> Vec<ChatMessage<'_>> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    if !request.system.is_empty() {
        messages.push(ChatMessage {
            role: "system",
            content: &request.system,
        });
    }
    messages.extend(request.history.iter().map(|m| ChatMessage {
        role: role_name(m.role),
        content: &m.content,
    }));
    messages.push(ChatMessage {
        role: "user",
        content: &request.user,
    });
    messages
}

/// OpenAI-compatible `/chat/completions` adapter.
#[derive(Debug, Clone)]
pub struct OpenAiChatAdapter {
    client: Client,
    settings: HttpSettings,
}

impl OpenAiChatAdapter {
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

    async fn complete(&self, request: &TextRequest) -> Result<RawAsset, ProviderError> {
        let name = self.settings.name.as_str();
        let body = ChatRequest {
            model: self.settings.model_or("gpt-4o-mini"),
            messages: chat_messages(request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let mut builder = self
            .client
            .post(self.settings.url("chat/completions"))
            .json(&body);
        if let Some(key) = &self.settings.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| transport_error(name, e))?;
        let response = check_status(name, response).await?;
        let parsed: ChatResponse = json_body(name, response).await?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::new(
                    name,
                    ProviderErrorKind::InvalidResponse("Response contained no text".to_string()),
                )
            })?;

        debug!(chars = text.len(), "Received completion");
        Ok(RawAsset::Text(text))
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiChatAdapter {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn capability(&self) -> Capability {
        Capability::Text
    }

    fn credential_id(&self) -> Option<&str> {
        self.settings.credential_id.as_deref()
    }

    #[instrument(skip(self, request), fields(provider = %self.settings.name))]
    async fn invoke(&self, request: &ProviderRequest) -> Result<RawAsset, ProviderError> {
        let ProviderRequest::Text(text) = request else {
            return Err(wrong_capability(&self.settings.name, "text"));
        };
        enforce_timeout(&self.settings.name, self.settings.timeout, self.complete(text)).await
    }
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

/// OpenAI-compatible `/images/generations` adapter.
///
/// Returns the delivered URL, or an inline `data:` URI when the provider
/// answers with `b64_json`.
#[derive(Debug, Clone)]
pub struct OpenAiImageAdapter {
    client: Client,
    settings: HttpSettings,
}

impl OpenAiImageAdapter {
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
        let body = ImageGenerationRequest {
            model: self.settings.model_or("dall-e-3"),
            prompt,
            n: 1,
            size: size.or(self.settings.size.as_deref()),
        };

        let mut builder = self
            .client
            .post(self.settings.url("images/generations"))
            .json(&body);
        if let Some(key) = &self.settings.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| transport_error(name, e))?;
        let response = check_status(name, response).await?;
        let parsed: ImageGenerationResponse = json_body(name, response).await?;

        match parsed.data.into_iter().next() {
            Some(ImageDatum { url: Some(url), .. }) => Ok(RawAsset::Url(url)),
            Some(ImageDatum {
                b64_json: Some(data),
                ..
            }) => Ok(RawAsset::Url(format!("data:image/png;base64,{}", data))),
            _ => Err(ProviderError::new(
                name,
                ProviderErrorKind::InvalidResponse("Response contained no image".to_string()),
            )),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiImageAdapter {
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

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
}

/// OpenAI-compatible `/audio/speech` adapter.
#[derive(Debug, Clone)]
pub struct OpenAiSpeechAdapter {
    client: Client,
    settings: HttpSettings,
}

impl OpenAiSpeechAdapter {
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
        let body = SpeechBody {
            model: self.settings.model_or("tts-1"),
            input: text,
            voice: voice.or(self.settings.voice.as_deref()).unwrap_or("alloy"),
        };

        let mut builder = self.client.post(self.settings.url("audio/speech")).json(&body);
        if let Some(key) = &self.settings.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| transport_error(name, e))?;
        let response = check_status(name, response).await?;
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
            mime_type: "audio/mpeg".to_string(),
        })
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiSpeechAdapter {
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
