//! Provider request types.

use crate::{Capability, Role};
use serde::{Deserialize, Serialize};

/// One prior turn of a text conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Author of the turn
    pub role: Role,
    /// Turn text
    pub content: String,
}

impl Message {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request for free text.
///
/// # Examples
///
/// ```
/// use storyloom_core::TextRequest;
///
/// let request = TextRequest {
///     system: "You write children's stories.".to_string(),
///     history: vec![],
///     user: "Write a story about Luna.".to_string(),
///     max_tokens: Some(2000),
///     temperature: Some(0.8),
/// };
/// assert!(request.history.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TextRequest {
    /// System instructions
    pub system: String,
    /// Prior turns, oldest first
    pub history: Vec<Message>,
    /// The turn being asked
    pub user: String,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

/// Request for a single image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct ImageRequest {
    /// Image description
    pub prompt: String,
    /// Provider-specific size hint, e.g. `1024x1024`
    pub size: Option<String>,
}

/// Request for narration audio.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SpeechRequest {
    /// Text to speak
    pub text: String,
    /// Voice identifier, provider default when absent
    pub voice_id: Option<String>,
}

/// A request to any provider, tagged by capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::From)]
#[serde(tag = "capability", rename_all = "snake_case")]
pub enum ProviderRequest {
    /// Text generation
    Text(TextRequest),
    /// Image generation
    Image(ImageRequest),
    /// Speech synthesis
    Speech(SpeechRequest),
}

impl ProviderRequest {
    /// The capability this request needs.
    ///
    /// # Examples
    ///
    /// ```
    /// use storyloom_core::{Capability, ImageRequest, ProviderRequest};
    ///
    /// let request = ProviderRequest::from(ImageRequest {
    ///     prompt: "a whale".to_string(),
    ///     size: None,
    /// });
    /// assert_eq!(request.capability(), Capability::Image);
    /// ```
    pub fn capability(&self) -> Capability {
        match self {
            ProviderRequest::Text(_) => Capability::Text,
            ProviderRequest::Image(_) => Capability::Image,
            ProviderRequest::Speech(_) => Capability::Speech,
        }
    }
}
