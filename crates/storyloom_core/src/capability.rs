//! Provider capabilities.

use serde::{Deserialize, Serialize};

/// The kind of output a provider produces.
///
/// # Examples
///
/// ```
/// use storyloom_core::Capability;
///
/// assert_eq!(format!("{}", Capability::Image), "image");
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
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Free text (the story narrative)
    #[display("text")]
    Text,
    /// Illustrations and covers
    #[display("image")]
    Image,
    /// Narration audio
    #[display("speech")]
    Speech,
}
