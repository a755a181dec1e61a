//! Story generation parameters.

use serde::{Deserialize, Serialize};
use storyloom_error::{GenerationError, GenerationErrorKind};

/// How demanding the story text should be.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum ReadingLevel {
    /// Short sentences, very common words
    #[display("early")]
    Early,
    /// Simple sentences with some new words
    #[default]
    #[display("developing")]
    Developing,
    /// Longer sentences and richer vocabulary
    #[display("fluent")]
    Fluent,
}

impl ReadingLevel {
    /// Writing guidance for this level.
    pub fn guidance(&self) -> &'static str {
        match self {
            ReadingLevel::Early => {
                "Use very short sentences of five to eight words and only common, concrete words."
            }
            ReadingLevel::Developing => {
                "Use simple sentences and introduce at most a few new words, explained by context."
            }
            ReadingLevel::Fluent => {
                "Use varied sentence lengths, richer vocabulary, and some dialogue."
            }
        }
    }
}

/// What the caller asked for.
///
/// # Examples
///
/// ```
/// use storyloom_core::{ReadingLevel, StoryParams};
///
/// let params = StoryParams::builder()
///     .protagonist_name("Luna")
///     .protagonist_age(6u8)
///     .theme("ocean")
///     .setting("a coral reef")
///     .style("watercolor")
///     .page_count(5usize)
///     .build()
///     .unwrap();
///
/// assert_eq!(params.protagonist_name(), "Luna");
/// assert_eq!(*params.reading_level(), ReadingLevel::Developing);
/// assert_eq!(params.language(), "en");
/// assert!(params.validate(20).is_ok());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct StoryParams {
    /// Name of the story's hero
    protagonist_name: String,
    /// Age of the hero, used to pitch the story
    protagonist_age: u8,
    /// Theme, e.g. `ocean` or `space`
    theme: String,
    /// Where the story takes place
    setting: String,
    /// Illustration style
    style: String,
    /// Number of pages to produce
    page_count: usize,
    /// Reading level of the text
    #[builder(default)]
    #[serde(default)]
    reading_level: ReadingLevel,
    /// Language tag of the story text
    #[builder(default = "String::from(\"en\")")]
    #[serde(default = "default_language")]
    language: String,
    /// Lesson the story should carry
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    moral: Option<String>,
    /// Narration voice
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    voice_id: Option<String>,
}

fn default_language() -> String {
    "en".to_string()
}

impl StoryParamsBuilder {
    /// Build the StoryParams.
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing.
    pub fn build(&self) -> Result<StoryParams, String> {
        self.build_internal().map_err(|e| e.to_string())
    }
}

impl StoryParams {
    /// Creates a new parameters builder.
    pub fn builder() -> StoryParamsBuilder {
        StoryParamsBuilder::default()
    }

    /// Check the parameters before any provider is called.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` for a blank name or theme, or a page count
    /// outside `1..=max_pages`.
    pub fn validate(&self, max_pages: usize) -> Result<(), GenerationError> {
        if self.protagonist_name.trim().is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::InvalidParameters(
                "protagonist name is empty".to_string(),
            )));
        }
        if self.theme.trim().is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::InvalidParameters(
                "theme is empty".to_string(),
            )));
        }
        if self.page_count == 0 || self.page_count > max_pages {
            return Err(GenerationError::new(GenerationErrorKind::InvalidParameters(
                format!(
                    "page count {} outside 1..={}",
                    self.page_count, max_pages
                ),
            )));
        }
        Ok(())
    }
}
