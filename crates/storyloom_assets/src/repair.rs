//! On-demand repair of broken asset references.

use crate::{MigrationContext, MigrationService, MigrationStatus};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use storyloom_core::{AssetClass, AssetSlot, StoryRecord};
use storyloom_interface::{GenerationObserver, NoopObserver};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Query parameter appended to durable URLs to defeat stale caches.
pub const CACHE_BUST_PARAM: &str = "_cb";

/// URLs the rendering layer failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepairRequest {
    /// Story the URLs belong to, when known
    pub story_id: Option<Uuid>,
    /// Theme used to pick a placeholder
    pub theme: String,
    /// URLs that failed to load
    pub urls: Vec<String>,
}

/// Fixes URLs reported broken by the rendering layer.
///
/// | class | fix |
/// |---|---|
/// | ephemeral, inline data | migrate with write-back, else placeholder (written back) |
/// | durable | append a cache-busting parameter once, then placeholder |
/// | placeholder | left alone |
///
/// Only URLs that changed appear in the result, and each change is reported
/// to the observer.
#[derive(Clone)]
pub struct RepairEngine {
    migration: MigrationService,
    observer: Arc<dyn GenerationObserver>,
}

impl RepairEngine {
    /// Create an engine reporting to no one.
    pub fn new(migration: MigrationService) -> Self {
        Self {
            migration,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Report fixes to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn GenerationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Repair every URL in `request`, returning original → fixed for the
    /// URLs that changed.
    #[instrument(skip(self, request), fields(story_id = ?request.story_id, urls = request.urls.len()))]
    pub async fn repair(&self, request: &RepairRequest) -> HashMap<String, String> {
        let record = self.load_record(request.story_id).await;
        let mut fixes = HashMap::new();

        for url in &request.urls {
            if fixes.contains_key(url) {
                continue;
            }
            let fixed = match self.migration.classifier().classify(url) {
                AssetClass::Placeholder => None,
                AssetClass::Durable => Some(self.bust_cache(url, &request.theme)),
                AssetClass::Ephemeral | AssetClass::InlineData => {
                    let slot = record.as_ref().and_then(|r| slot_holding(r, url));
                    Some(self.rescue(url, request, slot).await)
                }
            };

            if let Some(fixed) = fixed.filter(|fixed| fixed != url) {
                info!(original = %truncate(url), fixed = %truncate(&fixed), "Repaired asset");
                self.observer.on_asset_fixed(url, &fixed);
                fixes.insert(url.clone(), fixed);
            }
        }
        fixes
    }

    async fn load_record(&self, story_id: Option<Uuid>) -> Option<StoryRecord> {
        let story_id = story_id?;
        match self.migration.repository().load_story(story_id).await {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(%story_id, error = %error, "Could not load story for repair");
                None
            }
        }
    }

    async fn rescue(&self, url: &str, request: &RepairRequest, slot: Option<AssetSlot>) -> String {
        let context = MigrationContext {
            story_id: request.story_id,
            slot,
            theme: request.theme.clone(),
            write_back: true,
        };
        let outcome = self.migration.ensure_durable(url, &context).await;
        if outcome.status == MigrationStatus::Migrated {
            return outcome.reference.url;
        }

        debug!(status = %outcome.status, "Migration failed, substituting placeholder");
        let placeholder = self.migration.classifier().placeholder_for(&request.theme);
        self.migration.write_back(&context, &placeholder).await;
        placeholder
    }

    fn bust_cache(&self, url: &str, theme: &str) -> String {
        if has_cache_bust(url) {
            return self.migration.classifier().placeholder_for(theme);
        }
        let separator = if url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}={}",
            url,
            separator,
            CACHE_BUST_PARAM,
            Utc::now().timestamp_millis()
        )
    }
}

fn has_cache_bust(url: &str) -> bool {
    url.split_once('?').is_some_and(|(_, query)| {
        query
            .split('&')
            .any(|param| param.split('=').next() == Some(CACHE_BUST_PARAM))
    })
}

fn slot_holding(record: &StoryRecord, url: &str) -> Option<AssetSlot> {
    record
        .asset_urls()
        .into_iter()
        .find(|(_, held)| held == url)
        .map(|(slot, _)| slot)
}

fn truncate(url: &str) -> &str {
    match url.char_indices().nth(96) {
        Some((end, _)) => &url[..end],
        None => url,
    }
}
