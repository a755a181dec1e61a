//! In-progress generation state.

use crate::{Capability, Stage, StoryParams};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storyloom_error::{GenerationError, GenerationErrorKind};
use uuid::Uuid;

/// Attempt bookkeeping for one stage and capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GenerationAttempt {
    /// Stage the attempts belong to
    stage: Stage,
    /// Capability being attempted
    capability: Capability,
    /// Failed attempts so far
    failures: u32,
    /// Most recent error message
    last_error: Option<String>,
    /// Most recent provider tried
    last_provider: Option<String>,
    /// When this entry last changed
    updated_at: DateTime<Utc>,
}

impl GenerationAttempt {
    fn new(stage: Stage, capability: Capability) -> Self {
        Self {
            stage,
            capability,
            failures: 0,
            last_error: None,
            last_provider: None,
            updated_at: Utc::now(),
        }
    }
}

/// Mutable state of one generation run.
///
/// Owned by the generator for the duration of a single call and dropped once
/// the story is persisted or the run ends.
///
/// # Examples
///
/// ```
/// use storyloom_core::{Capability, Stage, StoryDraft, StoryParams};
///
/// let params = StoryParams::builder()
///     .protagonist_name("Luna")
///     .protagonist_age(6u8)
///     .theme("ocean")
///     .setting("a reef")
///     .style("watercolor")
///     .page_count(3usize)
///     .build()
///     .unwrap();
///
/// let mut draft = StoryDraft::new(params);
/// draft.advance(Stage::Narrative).unwrap();
/// assert_eq!(*draft.progress(), 15);
/// assert!(draft.advance(Stage::Preparing).is_err());
///
/// draft.record_failure(Stage::Narrative, Capability::Text, "openai", "timeout");
/// assert_eq!(draft.failures(Stage::Narrative, Capability::Text), 1);
/// ```
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct StoryDraft {
    /// Story id, reused for the stored record
    id: Uuid,
    /// Input parameters
    params: StoryParams,
    /// Current stage
    stage: Stage,
    /// Current progress percentage
    progress: u8,
    /// Attempt bookkeeping
    attempts: Vec<GenerationAttempt>,
}

impl StoryDraft {
    /// Start a new draft in `Preparing`.
    pub fn new(params: StoryParams) -> Self {
        Self {
            id: Uuid::new_v4(),
            params,
            stage: Stage::Preparing,
            progress: 0,
            attempts: Vec::new(),
        }
    }

    /// Move to `next`, setting progress to the start of its band.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` when `next` is behind the current stage.
    pub fn advance(&mut self, next: Stage) -> Result<(), GenerationError> {
        if !self.stage.can_transition_to(next) {
            return Err(GenerationError::new(GenerationErrorKind::InvalidTransition {
                from: self.stage.to_string(),
                to: next.to_string(),
            }));
        }
        self.stage = next;
        self.progress = next.band().0;
        Ok(())
    }

    /// Set progress within the current stage. Progress never moves backwards.
    pub fn set_progress(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
    }

    /// Record a failed attempt.
    pub fn record_failure(
        &mut self,
        stage: Stage,
        capability: Capability,
        provider: impl Into<String>,
        error: impl Into<String>,
    ) {
        let entry = match self
            .attempts
            .iter_mut()
            .position(|a| a.stage == stage && a.capability == capability)
        {
            Some(position) => &mut self.attempts[position],
            None => {
                self.attempts.push(GenerationAttempt::new(stage, capability));
                let last = self.attempts.len() - 1;
                &mut self.attempts[last]
            }
        };
        entry.failures += 1;
        entry.last_provider = Some(provider.into());
        entry.last_error = Some(error.into());
        entry.updated_at = Utc::now();
    }

    /// Failed attempts recorded for a stage and capability.
    pub fn failures(&self, stage: Stage, capability: Capability) -> u32 {
        self.attempts
            .iter()
            .find(|a| a.stage == stage && a.capability == capability)
            .map(|a| a.failures)
            .unwrap_or(0)
    }
}
