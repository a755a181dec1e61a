//! Generation stages and their progress bands.

use serde::{Deserialize, Serialize};

/// A step of the generation pipeline.
///
/// Stages advance strictly forward. `Illustrations` and `Narration` may be
/// re-entered while they loop over pages. `Error` is reachable from anywhere
/// and ends the attempt.
///
/// # Examples
///
/// ```
/// use storyloom_core::Stage;
///
/// assert!(Stage::Narrative.can_transition_to(Stage::Cover));
/// assert!(!Stage::Cover.can_transition_to(Stage::Narrative));
/// assert!(Stage::Illustrations.can_transition_to(Stage::Illustrations));
/// assert!(Stage::Cover.can_transition_to(Stage::Error));
/// assert_eq!(Stage::Cover.band(), (50, 55));
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
pub enum Stage {
    /// Validating input and building prompts
    #[display("preparing")]
    Preparing,
    /// Writing the story text
    #[display("narrative")]
    Narrative,
    /// Illustrating the cover
    #[display("cover")]
    Cover,
    /// Illustrating each page
    #[display("illustrations")]
    Illustrations,
    /// Narrating each page
    #[display("narration")]
    Narration,
    /// Story persisted
    #[display("complete")]
    Complete,
    /// Attempt failed
    #[display("error")]
    Error,
}

impl Stage {
    /// Inclusive progress range, in percent, covered by this stage.
    pub fn band(&self) -> (u8, u8) {
        match self {
            Stage::Preparing => (0, 15),
            Stage::Narrative => (15, 50),
            Stage::Cover => (50, 55),
            Stage::Illustrations => (55, 85),
            Stage::Narration => (85, 99),
            Stage::Complete => (100, 100),
            Stage::Error => (0, 0),
        }
    }

    /// Progress at a fraction of the way through this stage.
    ///
    /// `done` is clamped to `total`, and an empty stage reports its start.
    ///
    /// # Examples
    ///
    /// ```
    /// use storyloom_core::Stage;
    ///
    /// assert_eq!(Stage::Illustrations.progress_at(0, 5), 55);
    /// assert_eq!(Stage::Illustrations.progress_at(5, 5), 85);
    /// assert_eq!(Stage::Illustrations.progress_at(2, 4), 70);
    /// ```
    pub fn progress_at(&self, done: usize, total: usize) -> u8 {
        let (start, end) = self.band();
        if total == 0 {
            return start;
        }
        let done = done.min(total);
        let span = (end - start) as usize;
        start + (span * done / total) as u8
    }

    /// Human-readable status line.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Preparing => "Preparing your story",
            Stage::Narrative => "Writing the story",
            Stage::Cover => "Painting the cover",
            Stage::Illustrations => "Illustrating the pages",
            Stage::Narration => "Recording the narration",
            Stage::Complete => "Your story is ready",
            Stage::Error => "Something went wrong",
        }
    }

    fn loops(&self) -> bool {
        matches!(self, Stage::Illustrations | Stage::Narration)
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: Stage) -> bool {
        match (self, next) {
            (Stage::Error | Stage::Complete, _) => false,
            (_, Stage::Error) => true,
            (current, next) if *current == next => current.loops(),
            (current, next) => next > *current,
        }
    }
}
