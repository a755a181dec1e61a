//! Trait definitions for providers, storage of records, and observers.

use crate::GenerationEvent;
use async_trait::async_trait;
use storyloom_core::{AssetSlot, Capability, ProviderRequest, RawAsset, Stage, StoryRecord};
use storyloom_error::{PersistenceError, ProviderError};
use uuid::Uuid;

/// A single generative provider behind a uniform call.
///
/// Implementations enforce their own hard timeout, translate every failure
/// into a [`ProviderError`], never retry internally, and are safe to call
/// concurrently.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider name (e.g., "openai", "fal", "elevenlabs").
    fn name(&self) -> &str;

    /// The capability this adapter serves.
    fn capability(&self) -> Capability;

    /// Name of the credential source this adapter authenticates with.
    ///
    /// Adapters sharing a credential fail together on `Unauthorized`.
    fn credential_id(&self) -> Option<&str> {
        None
    }

    /// Perform one call.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] for timeouts, rejected credentials,
    /// throttling, provider failures, and unusable responses.
    async fn invoke(&self, request: &ProviderRequest) -> Result<RawAsset, ProviderError>;
}

/// Relational store of finished stories.
///
/// Writes are idempotent upserts by id and single-slot patches. The last
/// writer wins.
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Insert or replace a story and all of its pages.
    async fn upsert_story(&self, record: &StoryRecord) -> Result<(), PersistenceError>;

    /// Load a story by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no story has this id.
    async fn load_story(&self, id: Uuid) -> Result<StoryRecord, PersistenceError>;

    /// Ids of every stored story.
    async fn list_story_ids(&self) -> Result<Vec<Uuid>, PersistenceError>;

    /// Replace the URL held in one slot of a stored story.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the story or the addressed page is missing.
    async fn patch_asset(
        &self,
        story_id: Uuid,
        slot: AssetSlot,
        url: &str,
    ) -> Result<(), PersistenceError>;
}

/// Receives progress from the generator and fixes from the repair engine.
///
/// Every method has a no-op default so observers implement only what they
/// care about.
pub trait GenerationObserver: Send + Sync {
    /// The pipeline entered a new stage.
    fn on_stage_change(&self, _stage: Stage, _progress: u8, _label: &str) {}

    /// Progress moved within the current stage.
    fn on_progress(&self, _progress: u8, _label: &str) {}

    /// An asset URL was replaced.
    fn on_asset_fixed(&self, _original: &str, _fixed: &str) {}

    /// Forward a typed event to the matching callback.
    fn notify(&self, event: &GenerationEvent) {
        match event {
            GenerationEvent::StageChanged {
                stage,
                progress,
                label,
            } => self.on_stage_change(*stage, *progress, label),
            GenerationEvent::Progress { progress, label } => self.on_progress(*progress, label),
            GenerationEvent::AssetFixed { original, fixed } => {
                self.on_asset_fixed(original, fixed)
            }
        }
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl GenerationObserver for NoopObserver {}
