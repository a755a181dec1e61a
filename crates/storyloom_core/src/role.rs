//! Conversation roles for text requests.

use serde::{Deserialize, Serialize};

/// Who authored a turn of a text conversation.
///
/// # Examples
///
/// ```
/// use storyloom_core::Role;
///
/// assert_eq!(format!("{}", Role::Assistant), "assistant");
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
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions framing the conversation
    #[display("system")]
    System,
    /// The requesting side
    #[display("user")]
    User,
    /// The model's prior replies
    #[display("assistant")]
    Assistant,
}
