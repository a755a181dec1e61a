//! Provider adapter configuration.

use serde::{Deserialize, Serialize};

/// Which adapter implementation to build.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// OpenAI-compatible chat completions
    #[display("openai_chat")]
    OpenaiChat,
    /// OpenAI-compatible image generations
    #[display("openai_image")]
    OpenaiImage,
    /// fal.ai synchronous image endpoint
    #[display("fal_image")]
    FalImage,
    /// ElevenLabs text-to-speech
    #[display("elevenlabs_speech")]
    ElevenlabsSpeech,
    /// OpenAI-compatible audio speech
    #[display("openai_speech")]
    OpenaiSpeech,
    /// Scripted responses for local development
    #[display("mock")]
    Mock,
}

/// One adapter in a fallback chain.
///
/// # Example
///
/// ```toml
/// [[providers.image]]
/// name = "fal"
/// kind = "fal_image"
/// base_url = "https://fal.run"
/// model = "fal-ai/flux/schnell"
/// api_key_env = "FAL_KEY"
/// timeout_secs = 90
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AdapterConfig {
    /// Name reported in logs and health snapshots
    pub name: String,

    /// Implementation to build
    pub kind: AdapterKind,

    /// API root, adapter default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Environment variable holding the API key
    ///
    /// Also the credential identity: adapters naming the same variable share
    /// a credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Hard timeout for one call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Request pacing, unlimited when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_minute: Option<u32>,

    /// Calls allowed in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: u32,

    /// Default voice for speech adapters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Default size hint for image adapters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_concurrent() -> u32 {
    1
}

impl AdapterConfig {
    /// Minimal adapter entry with defaults for everything optional.
    pub fn new(name: impl Into<String>, kind: AdapterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            base_url: None,
            model: None,
            api_key_env: None,
            timeout_secs: default_timeout_secs(),
            requests_per_minute: None,
            max_concurrent: default_max_concurrent(),
            voice: None,
            size: None,
        }
    }
}

/// Ordered adapter lists per capability.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct ProvidersConfig {
    /// Text adapters, in fallback order
    #[serde(default)]
    pub text: Vec<AdapterConfig>,

    /// Image adapters, in fallback order
    #[serde(default)]
    pub image: Vec<AdapterConfig>,

    /// Speech adapters, in fallback order. Empty disables narration.
    #[serde(default)]
    pub speech: Vec<AdapterConfig>,
}
