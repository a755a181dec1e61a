//! Asset references, classes, and slots.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Where an asset URL points, in terms of how long it will keep working.
///
/// # Examples
///
/// ```
/// use storyloom_core::AssetClass;
///
/// assert!(AssetClass::Durable.is_settled());
/// assert!(AssetClass::Placeholder.is_settled());
/// assert!(!AssetClass::Ephemeral.is_settled());
/// assert_eq!(format!("{}", AssetClass::InlineData), "inline-data");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
pub enum AssetClass {
    /// Hosted in storage the system controls
    #[display("durable")]
    Durable,
    /// Hosted by a provider that will invalidate it
    #[display("ephemeral")]
    Ephemeral,
    /// A `data:` URI carrying the bytes inline
    #[display("inline-data")]
    InlineData,
    /// One of the bundled themed placeholder images
    #[display("placeholder")]
    Placeholder,
}

impl AssetClass {
    /// Whether this class may appear on a published story.
    pub fn is_settled(self) -> bool {
        matches!(self, AssetClass::Durable | AssetClass::Placeholder)
    }
}

/// A URL together with its classification.
///
/// Never persisted. The classification is recomputed whenever a URL is read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetReference {
    /// The asset URL
    pub url: String,
    /// Derived classification
    pub class: AssetClass,
    /// Key of a client cache copy, when one exists
    pub cache_key: Option<String>,
}

impl AssetReference {
    /// Create a reference with no cache key.
    pub fn new(url: impl Into<String>, class: AssetClass) -> Self {
        Self {
            url: url.into(),
            class,
            cache_key: None,
        }
    }

    /// Whether this reference may appear on a published story.
    pub fn is_settled(&self) -> bool {
        self.class.is_settled()
    }
}

/// Addresses one asset field of a story record.
///
/// # Examples
///
/// ```
/// use storyloom_core::AssetSlot;
///
/// assert_eq!(AssetSlot::Cover.key_stem(), "cover");
/// assert_eq!(AssetSlot::PageImage(2).key_stem(), "page-2-image");
/// assert_eq!(AssetSlot::PageNarration(0).key_stem(), "page-0-narration");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum AssetSlot {
    /// The story cover
    #[display("cover")]
    Cover,
    /// Illustration of the page at this index
    #[display("page_image({})", _0)]
    PageImage(usize),
    /// Narration of the page at this index
    #[display("page_narration({})", _0)]
    PageNarration(usize),
}

impl AssetSlot {
    /// Stem used in deterministic storage keys.
    pub fn key_stem(&self) -> String {
        match self {
            AssetSlot::Cover => "cover".to_string(),
            AssetSlot::PageImage(index) => format!("page-{}-image", index),
            AssetSlot::PageNarration(index) => format!("page-{}-narration", index),
        }
    }

    /// Whether the slot holds audio rather than an image.
    pub fn is_audio(&self) -> bool {
        matches!(self, AssetSlot::PageNarration(_))
    }
}

/// What a provider handed back, before any persistence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawAsset {
    /// Generated text
    Text(String),
    /// A URL, usually ephemeral
    Url(String),
    /// Raw bytes
    Bytes {
        /// Payload
        data: Vec<u8>,
        /// MIME type of the payload
        mime_type: String,
    },
}

impl RawAsset {
    /// The text payload, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawAsset::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Express the asset as a URL.
    ///
    /// Bytes become an inline `data:` URI that the migration service can
    /// decode and re-host. Text has no URL form.
    ///
    /// # Examples
    ///
    /// ```
    /// use storyloom_core::RawAsset;
    ///
    /// let audio = RawAsset::Bytes { data: b"ID3".to_vec(), mime_type: "audio/mpeg".to_string() };
    /// assert_eq!(audio.into_url().as_deref(), Some("data:audio/mpeg;base64,SUQz"));
    ///
    /// assert_eq!(RawAsset::Text("hi".into()).into_url(), None);
    /// ```
    pub fn into_url(self) -> Option<String> {
        match self {
            RawAsset::Text(_) => None,
            RawAsset::Url(url) => Some(url),
            RawAsset::Bytes { data, mime_type } => Some(format!(
                "data:{};base64,{}",
                mime_type,
                base64::engine::general_purpose::STANDARD.encode(data)
            )),
        }
    }
}
