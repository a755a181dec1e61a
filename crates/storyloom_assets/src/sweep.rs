//! Library-wide migration sweep.

use crate::{MigrationContext, MigrationService, MigrationStatus};
use storyloom_core::StoryStatus;
use tracing::{info, instrument, warn};

/// What a sweep did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    /// The sweep was skipped because one ran recently
    pub skipped: bool,
    /// Stories examined
    pub stories: usize,
    /// References migrated
    pub migrated: usize,
    /// References that could not be migrated
    pub failed: usize,
    /// Stories promoted to published
    pub published: usize,
}

/// Migrates every non-durable reference in the stored library.
///
/// Runs at most once per cache sweep window; the guard lives in the client
/// cache so it is scoped to the session.
#[derive(Clone)]
pub struct LibrarySweep {
    migration: MigrationService,
}

impl LibrarySweep {
    /// Create a sweep over the migration service's repository.
    pub fn new(migration: MigrationService) -> Self {
        Self { migration }
    }

    /// Sweep the library unless another sweep started inside the window.
    #[instrument(skip(self))]
    pub async fn run(&self) -> SweepReport {
        if !self.migration.cache().try_mark_swept() {
            info!("Library swept recently, skipping");
            return SweepReport {
                skipped: true,
                ..Default::default()
            };
        }
        self.sweep().await
    }

    async fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let repository = self.migration.repository();

        let ids = match repository.list_story_ids().await {
            Ok(ids) => ids,
            Err(error) => {
                warn!(error = %error, "Could not list stories");
                return report;
            }
        };

        for id in ids {
            let record = match repository.load_story(id).await {
                Ok(record) => record,
                Err(error) => {
                    warn!(story_id = %id, error = %error, "Could not load story");
                    continue;
                }
            };
            report.stories += 1;

            let mut unresolved = 0;
            for (slot, url) in record.asset_urls() {
                let context =
                    MigrationContext::for_slot(id, slot, record.theme.clone()).with_write_back();
                let outcome = self.migration.ensure_durable(&url, &context).await;
                match outcome.status {
                    MigrationStatus::Unchanged => {}
                    MigrationStatus::Migrated => report.migrated += 1,
                    _ => {
                        report.failed += 1;
                        unresolved += 1;
                    }
                }
            }

            if unresolved == 0 && record.status == StoryStatus::PendingRepair {
                match repository.load_story(id).await {
                    Ok(mut refreshed) => {
                        let classifier = self.migration.classifier();
                        let settled = refreshed
                            .asset_urls()
                            .iter()
                            .all(|(_, url)| classifier.classify(url).is_settled());
                        if !settled {
                            warn!(story_id = %id, "References still unsettled after sweep");
                            continue;
                        }
                        refreshed.status = StoryStatus::Published;
                        match repository.upsert_story(&refreshed).await {
                            Ok(()) => report.published += 1,
                            Err(error) => {
                                warn!(story_id = %id, error = %error, "Could not publish story")
                            }
                        }
                    }
                    Err(error) => warn!(story_id = %id, error = %error, "Could not reload story"),
                }
            }
        }

        info!(
            stories = report.stories,
            migrated = report.migrated,
            failed = report.failed,
            published = report.published,
            "Library sweep finished"
        );
        report
    }
}
