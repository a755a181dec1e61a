//! PostgreSQL implementation of StoryRepository.

use crate::schema::{stories, story_pages};
use crate::{PageRow, StoryRow};
use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use std::sync::Arc;
use storyloom_core::{AssetSlot, StoryRecord};
use storyloom_error::{PersistenceError, PersistenceErrorKind};
use storyloom_interface::StoryRepository;
use tokio::sync::Mutex;
use uuid::Uuid;

/// PostgreSQL story repository using Diesel.
///
/// Stories live in `stories`, pages in `story_pages` keyed by
/// `(story_id, page_index)`.
///
/// # Example
/// ```no_run
/// use storyloom_config::DatabaseConfig;
/// use storyloom_database::{PostgresStoryRepository, establish_connection, run_migrations};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut conn = establish_connection(&DatabaseConfig::default())?;
/// run_migrations(&mut conn)?;
/// let repo = PostgresStoryRepository::new(conn);
/// # Ok(())
/// # }
/// ```
pub struct PostgresStoryRepository {
    conn: Arc<Mutex<PgConnection>>,
}

impl PostgresStoryRepository {
    /// Create a repository over one connection.
    pub fn new(conn: PgConnection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

#[async_trait]
impl StoryRepository for PostgresStoryRepository {
    #[tracing::instrument(skip(self, record), fields(story_id = %record.id, pages = record.pages.len()))]
    async fn upsert_story(&self, record: &StoryRecord) -> Result<(), PersistenceError> {
        let mut conn = self.conn.lock().await;
        let story = StoryRow::from(record);
        let pages: Vec<PageRow> = record
            .pages
            .iter()
            .map(|page| PageRow::from_page(record.id, page))
            .collect();

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::insert_into(stories::table)
                .values(&story)
                .on_conflict(stories::id)
                .do_update()
                .set((
                    stories::title.eq(&story.title),
                    stories::cover_url.eq(&story.cover_url),
                    stories::theme.eq(&story.theme),
                    stories::setting.eq(&story.setting),
                    stories::style.eq(&story.style),
                    stories::language.eq(&story.language),
                    stories::voice_id.eq(&story.voice_id),
                    stories::status.eq(&story.status),
                    stories::updated_at.eq(story.updated_at),
                ))
                .execute(conn)?;

            diesel::delete(
                story_pages::table
                    .filter(story_pages::story_id.eq(record.id))
                    .filter(story_pages::page_index.ge(pages.len() as i32)),
            )
            .execute(conn)?;

            for page in &pages {
                diesel::insert_into(story_pages::table)
                    .values(page)
                    .on_conflict((story_pages::story_id, story_pages::page_index))
                    .do_update()
                    .set(page)
                    .execute(conn)?;
            }
            Ok(())
        })?;

        tracing::debug!("Upserted story");
        Ok(())
    }

    async fn load_story(&self, id: Uuid) -> Result<StoryRecord, PersistenceError> {
        let mut conn = self.conn.lock().await;

        let story: StoryRow = stories::table
            .find(id)
            .select(StoryRow::as_select())
            .first(&mut *conn)?;
        let pages: Vec<PageRow> = story_pages::table
            .filter(story_pages::story_id.eq(id))
            .order(story_pages::page_index.asc())
            .select(PageRow::as_select())
            .load(&mut *conn)?;

        story.into_record(pages)
    }

    async fn list_story_ids(&self) -> Result<Vec<Uuid>, PersistenceError> {
        let mut conn = self.conn.lock().await;
        Ok(stories::table
            .select(stories::id)
            .order(stories::created_at.asc())
            .load::<Uuid>(&mut *conn)?)
    }

    #[tracing::instrument(skip(self, slot, url), fields(%slot))]
    async fn patch_asset(
        &self,
        story_id: Uuid,
        slot: AssetSlot,
        url: &str,
    ) -> Result<(), PersistenceError> {
        let mut conn = self.conn.lock().await;
        let now = Utc::now();

        let updated = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let rows = match slot {
                AssetSlot::Cover => diesel::update(stories::table.find(story_id))
                    .set(stories::cover_url.eq(url))
                    .execute(conn)?,
                AssetSlot::PageImage(index) => {
                    diesel::update(story_pages::table.find((story_id, index as i32)))
                        .set(story_pages::image_url.eq(url))
                        .execute(conn)?
                }
                AssetSlot::PageNarration(index) => {
                    diesel::update(story_pages::table.find((story_id, index as i32)))
                        .set(story_pages::narration_url.eq(Some(url)))
                        .execute(conn)?
                }
            };
            if rows > 0 {
                diesel::update(stories::table.find(story_id))
                    .set(stories::updated_at.eq(now))
                    .execute(conn)?;
            }
            Ok(rows)
        })?;

        if updated == 0 {
            return Err(PersistenceError::new(PersistenceErrorKind::NotFound(
                format!("{} on story {}", slot, story_id),
            )));
        }
        tracing::debug!("Patched asset slot");
        Ok(())
    }
}
