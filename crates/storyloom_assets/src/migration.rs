//! Moving at-risk assets into durable storage.

use crate::{AssetClassifier, AssetFetcher, FetchedAsset, decode_data_uri};
use chrono::Utc;
use std::sync::Arc;
use storyloom_cache::ClientAssetCache;
use storyloom_core::{AssetClass, AssetReference, AssetSlot, StoryRecord, StoryStatus};
use storyloom_error::PersistenceError;
use storyloom_interface::StoryRepository;
use storyloom_storage::{MediaType, ObjectMetadata, ObjectStorage};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Where a migrated asset belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationContext {
    /// Owning story, when known
    pub story_id: Option<Uuid>,
    /// Slot on the story, when known
    pub slot: Option<AssetSlot>,
    /// Theme used to pick a placeholder
    pub theme: String,
    /// Patch the stored record after a successful upload
    pub write_back: bool,
}

impl MigrationContext {
    /// Context for one slot of a story.
    pub fn for_slot(story_id: Uuid, slot: AssetSlot, theme: impl Into<String>) -> Self {
        Self {
            story_id: Some(story_id),
            slot: Some(slot),
            theme: theme.into(),
            write_back: false,
        }
    }

    /// Context for a URL with no known owner.
    pub fn detached(theme: impl Into<String>) -> Self {
        Self {
            story_id: None,
            slot: None,
            theme: theme.into(),
            write_back: false,
        }
    }

    /// Ask for the stored record to be patched.
    pub fn with_write_back(mut self) -> Self {
        self.write_back = true;
        self
    }

    fn is_audio(&self) -> bool {
        self.slot.is_some_and(|slot| slot.is_audio())
    }
}

/// How `ensure_durable` resolved a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum MigrationStatus {
    /// Already durable or a placeholder; nothing to do
    #[display("unchanged")]
    Unchanged,
    /// Uploaded to durable storage
    #[display("migrated")]
    Migrated,
    /// Upload failed; an inline copy from the client cache is returned
    #[display("cached_fallback")]
    CachedFallback,
    /// Upload failed; the original URL still works for now
    #[display("original_fallback")]
    OriginalFallback,
    /// The asset could not be recovered; the themed placeholder is returned
    #[display("placeholder_fallback")]
    PlaceholderFallback,
}

impl MigrationStatus {
    /// Whether migration was attempted and did not succeed.
    pub fn is_failure(self) -> bool {
        !matches!(self, MigrationStatus::Unchanged | MigrationStatus::Migrated)
    }
}

/// Result of `ensure_durable`: always a usable reference.
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    /// Best available reference
    pub reference: AssetReference,
    /// How it was obtained
    pub status: MigrationStatus,
    /// Why migration failed, when it did
    pub error: Option<PersistenceError>,
}

impl MigrationOutcome {
    fn unchanged(reference: AssetReference) -> Self {
        Self {
            reference,
            status: MigrationStatus::Unchanged,
            error: None,
        }
    }

    /// The resolved URL.
    pub fn url(&self) -> &str {
        &self.reference.url
    }
}

/// Result of publishing a story record.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    /// The record as stored (or as it would have been)
    pub record: StoryRecord,
    /// Whether the upsert succeeded
    pub persisted: bool,
    /// Slots uploaded during publishing
    pub migrated: usize,
    /// Slots still holding a non-durable reference
    pub unresolved: Vec<AssetSlot>,
    /// Persistence failure, if the upsert failed
    pub error: Option<PersistenceError>,
}

/// The only writer of asset references on stored stories.
///
/// Cloning is cheap and clones share their collaborators.
#[derive(Clone)]
pub struct MigrationService {
    classifier: AssetClassifier,
    fetcher: Arc<dyn AssetFetcher>,
    storage: Arc<dyn ObjectStorage>,
    repository: Arc<dyn StoryRepository>,
    cache: ClientAssetCache,
}

impl MigrationService {
    /// Create the service.
    pub fn new(
        classifier: AssetClassifier,
        fetcher: Arc<dyn AssetFetcher>,
        storage: Arc<dyn ObjectStorage>,
        repository: Arc<dyn StoryRepository>,
        cache: ClientAssetCache,
    ) -> Self {
        Self {
            classifier,
            fetcher,
            storage,
            repository,
            cache,
        }
    }

    /// The classifier in use.
    pub fn classifier(&self) -> &AssetClassifier {
        &self.classifier
    }

    /// The client cache in use.
    pub fn cache(&self) -> &ClientAssetCache {
        &self.cache
    }

    /// The relational store.
    pub fn repository(&self) -> &Arc<dyn StoryRepository> {
        &self.repository
    }

    /// Make sure `url` points at durable storage.
    ///
    /// Durable and placeholder URLs come back unchanged. Everything else is
    /// fetched (or decoded), cached, uploaded, and optionally written back to
    /// the story. Failures are logged and answered with the best reference
    /// still available.
    #[instrument(skip(self, url, context), fields(story_id = ?context.story_id, slot = ?context.slot))]
    pub async fn ensure_durable(&self, url: &str, context: &MigrationContext) -> MigrationOutcome {
        let reference = self.classifier.reference(url);
        if reference.is_settled() {
            debug!(class = %reference.class, "Reference already settled");
            return MigrationOutcome::unchanged(reference);
        }

        let asset = match self.load_bytes(&reference).await {
            Ok(asset) => asset,
            Err(error) => {
                warn!(error = %error, class = %reference.class, "Could not read asset");
                return self.fallback(&reference, context, error, false);
            }
        };

        let durable_url = match self.upload(&asset, context).await {
            Ok(durable_url) => durable_url,
            Err(error) => {
                warn!(error = %error, "Durable upload failed");
                return self.fallback(&reference, context, error, true);
            }
        };

        if context.write_back {
            self.write_back(context, &durable_url).await;
        }

        let reference = self.classifier.reference(&durable_url);
        if reference.class != AssetClass::Durable {
            warn!(
                class = %reference.class,
                "Storage public URL is not on a durable host, add it to classifier.durable_hosts"
            );
        }
        MigrationOutcome {
            reference,
            status: MigrationStatus::Migrated,
            error: None,
        }
    }

    async fn load_bytes(&self, reference: &AssetReference) -> Result<FetchedAsset, PersistenceError> {
        match reference.class {
            AssetClass::InlineData => decode_data_uri(&reference.url),
            _ => {
                let asset = self.fetcher.fetch(&reference.url).await?;
                self.cache
                    .insert(&reference.url, asset.data.clone(), asset.mime_type.clone());
                Ok(asset)
            }
        }
    }

    async fn upload(
        &self,
        asset: &FetchedAsset,
        context: &MigrationContext,
    ) -> Result<String, PersistenceError> {
        let mime_type = if asset.mime_type == "application/octet-stream" {
            let fallback = if context.is_audio() { "audio/mpeg" } else { "image/png" };
            fallback.to_string()
        } else {
            asset.mime_type.clone()
        };
        let key = storage_key(context, &mime_type);
        let metadata = ObjectMetadata::from_mime(mime_type);

        let stored = self.storage.upload(&key, &asset.data, &metadata).await?;
        info!(key = %stored.key, size = stored.size_bytes, "Migrated asset to durable storage");
        Ok(stored.public_url)
    }

    fn fallback(
        &self,
        reference: &AssetReference,
        context: &MigrationContext,
        error: PersistenceError,
        original_readable: bool,
    ) -> MigrationOutcome {
        if let Some(data_uri) = self.cache.data_uri(&reference.url) {
            let mut cached = AssetReference::new(data_uri, AssetClass::InlineData);
            cached.cache_key = Some(reference.url.clone());
            return MigrationOutcome {
                reference: cached,
                status: MigrationStatus::CachedFallback,
                error: Some(error),
            };
        }
        if original_readable {
            return MigrationOutcome {
                reference: reference.clone(),
                status: MigrationStatus::OriginalFallback,
                error: Some(error),
            };
        }
        MigrationOutcome {
            reference: AssetReference::new(
                self.classifier.placeholder_for(&context.theme),
                AssetClass::Placeholder,
            ),
            status: MigrationStatus::PlaceholderFallback,
            error: Some(error),
        }
    }

    /// Patch the context's slot on the stored story. Failures are logged.
    ///
    /// Returns whether the record was patched.
    pub async fn write_back(&self, context: &MigrationContext, url: &str) -> bool {
        let (Some(story_id), Some(slot)) = (context.story_id, context.slot) else {
            debug!("No story slot to write back to");
            return false;
        };
        match self.repository.patch_asset(story_id, slot, url).await {
            Ok(()) => {
                debug!(%story_id, %slot, "Wrote back asset reference");
                true
            }
            Err(error) => {
                warn!(%story_id, %slot, error = %error, "Write-back failed");
                false
            }
        }
    }

    /// Settle every reference on `record` and store it.
    ///
    /// The record is marked published only when every reference ends up
    /// durable or a placeholder; otherwise it is stored pending repair with
    /// the best references available. A failed upsert is reported in the
    /// outcome, never raised.
    #[instrument(skip(self, record), fields(story_id = %record.id, pages = record.pages.len()))]
    pub async fn publish(&self, mut record: StoryRecord) -> PublishOutcome {
        let mut migrated = 0;
        let mut unresolved = Vec::new();

        for (slot, url) in record.asset_urls() {
            let context = MigrationContext::for_slot(record.id, slot, record.theme.clone());
            let outcome = self.ensure_durable(&url, &context).await;
            if outcome.status == MigrationStatus::Migrated {
                migrated += 1;
            }
            if !outcome.reference.is_settled() {
                unresolved.push(slot);
            }
            if outcome.reference.url != url {
                record.set_url(slot, outcome.reference.url);
            }
        }

        record.status = if unresolved.is_empty() {
            StoryStatus::Published
        } else {
            StoryStatus::PendingRepair
        };
        record.updated_at = Utc::now();

        let (persisted, error) = match self.repository.upsert_story(&record).await {
            Ok(()) => {
                info!(status = %record.status, migrated, "Stored story");
                (true, None)
            }
            Err(error) => {
                warn!(error = %error, "Failed to store story");
                (false, Some(error))
            }
        };

        PublishOutcome {
            record,
            persisted,
            migrated,
            unresolved,
            error,
        }
    }
}

/// Storage key for an upload: `stories/{story_id}/{slot}-{unix_millis}.{ext}`.
fn storage_key(context: &MigrationContext, mime_type: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let extension = MediaType::extension_for(mime_type);
    let owner = context
        .story_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unassigned".to_string());
    let stem = context
        .slot
        .map(|slot| slot.key_stem())
        .unwrap_or_else(|| format!("asset-{}", Uuid::new_v4().simple()));
    format!("stories/{}/{}-{}.{}", owner, stem, millis, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_layout() {
        let id = Uuid::new_v4();
        let context = MigrationContext::for_slot(id, AssetSlot::PageNarration(3), "ocean");
        let key = storage_key(&context, "audio/mpeg");

        let prefix = format!("stories/{}/page-3-narration-", id);
        assert!(key.starts_with(&prefix), "{}", key);
        assert!(key.ends_with(".mp3"));
        let millis = &key[prefix.len()..key.len() - 4];
        assert!(millis.parse::<i64>().is_ok());
    }

    #[test]
    fn test_detached_key_is_unassigned() {
        let key = storage_key(&MigrationContext::detached("space"), "image/webp");
        assert!(key.starts_with("stories/unassigned/asset-"));
        assert!(key.ends_with(".webp"));
    }
}
