//! In-memory story repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use storyloom_core::{AssetSlot, StoryRecord};
use storyloom_error::{PersistenceError, PersistenceErrorKind};
use storyloom_interface::StoryRepository;
use tokio::sync::RwLock;
use uuid::Uuid;

/// HashMap-backed story repository.
///
/// All data is lost when the last clone is dropped.
///
/// # Example
///
/// ```
/// use storyloom_core::StoryRecord;
/// use storyloom_database::InMemoryStoryRepository;
/// use storyloom_interface::StoryRepository;
/// use uuid::Uuid;
///
/// # #[tokio::main]
/// # async fn main() {
/// let repo = InMemoryStoryRepository::new();
/// let record = StoryRecord::new(Uuid::new_v4(), "The Borrowed Star");
///
/// repo.upsert_story(&record).await.unwrap();
/// assert_eq!(repo.load_story(record.id).await.unwrap().title, "The Borrowed Star");
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStoryRepository {
    stories: Arc<RwLock<HashMap<Uuid, StoryRecord>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored stories.
    pub async fn len(&self) -> usize {
        self.stories.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.stories.read().await.is_empty()
    }

    /// Remove every story.
    pub async fn clear(&self) {
        self.stories.write().await.clear();
    }

    /// Make every call fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), PersistenceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PersistenceError::new(PersistenceErrorKind::Database(
                "repository unavailable".to_string(),
            )));
        }
        Ok(())
    }

    fn not_found(id: Uuid) -> PersistenceError {
        PersistenceError::new(PersistenceErrorKind::NotFound(format!("story {}", id)))
    }
}

#[async_trait]
impl StoryRepository for InMemoryStoryRepository {
    #[tracing::instrument(skip(self, record), fields(story_id = %record.id, pages = record.pages.len()))]
    async fn upsert_story(&self, record: &StoryRecord) -> Result<(), PersistenceError> {
        self.check_available()?;
        let mut stories = self.stories.write().await;
        let mut stored = record.clone();
        if let Some(existing) = stories.get(&record.id) {
            stored.created_at = existing.created_at;
        }
        stories.insert(record.id, stored);
        tracing::debug!("Upserted story");
        Ok(())
    }

    async fn load_story(&self, id: Uuid) -> Result<StoryRecord, PersistenceError> {
        self.check_available()?;
        self.stories
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn list_story_ids(&self) -> Result<Vec<Uuid>, PersistenceError> {
        self.check_available()?;
        let stories = self.stories.read().await;
        let mut records: Vec<&StoryRecord> = stories.values().collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records.into_iter().map(|r| r.id).collect())
    }

    #[tracing::instrument(skip(self, slot, url), fields(%slot))]
    async fn patch_asset(
        &self,
        story_id: Uuid,
        slot: AssetSlot,
        url: &str,
    ) -> Result<(), PersistenceError> {
        self.check_available()?;
        let mut stories = self.stories.write().await;
        let record = stories
            .get_mut(&story_id)
            .ok_or_else(|| Self::not_found(story_id))?;
        if !record.set_url(slot, url) {
            return Err(PersistenceError::new(PersistenceErrorKind::NotFound(
                format!("{} on story {}", slot, story_id),
            )));
        }
        tracing::debug!("Patched asset slot");
        Ok(())
    }
}
