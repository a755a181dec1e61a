//! Row types and conversions to story records.

use crate::schema::{stories, story_pages};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::str::FromStr;
use storyloom_core::{PageRecord, StoryRecord, StoryStatus};
use storyloom_error::{PersistenceError, PersistenceErrorKind};
use uuid::Uuid;

/// A row of the `stories` table.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = stories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct StoryRow {
    /// Story id
    pub id: Uuid,
    /// Title
    pub title: String,
    /// Cover URL
    pub cover_url: String,
    /// Theme
    pub theme: String,
    /// Setting
    pub setting: String,
    /// Illustration style
    pub style: String,
    /// Language tag
    pub language: String,
    /// Narration voice
    pub voice_id: Option<String>,
    /// `published` or `pending_repair`
    pub status: String,
    /// First stored
    pub created_at: DateTime<Utc>,
    /// Last changed
    pub updated_at: DateTime<Utc>,
}

/// A row of the `story_pages` table.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = story_pages)]
#[diesel(primary_key(story_id, page_index))]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct PageRow {
    /// Owning story
    pub story_id: Uuid,
    /// Zero-based index
    pub page_index: i32,
    /// Page text
    pub text: String,
    /// Illustration URL
    pub image_url: String,
    /// Narration URL
    pub narration_url: Option<String>,
}

impl From<&StoryRecord> for StoryRow {
    fn from(record: &StoryRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            cover_url: record.cover_url.clone(),
            theme: record.theme.clone(),
            setting: record.setting.clone(),
            style: record.style.clone(),
            language: record.language.clone(),
            voice_id: record.voice_id.clone(),
            status: record.status.to_string(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl PageRow {
    /// Row for one page of a story.
    pub fn from_page(story_id: Uuid, page: &PageRecord) -> Self {
        Self {
            story_id,
            page_index: page.index as i32,
            text: page.text.clone(),
            image_url: page.image_url.clone(),
            narration_url: page.narration_url.clone(),
        }
    }
}

impl StoryRow {
    /// Assemble a record from this row and its page rows.
    ///
    /// # Errors
    ///
    /// Returns a decode error for an unknown status string.
    pub fn into_record(self, pages: Vec<PageRow>) -> Result<StoryRecord, PersistenceError> {
        let status = StoryStatus::from_str(&self.status).map_err(|_| {
            PersistenceError::new(PersistenceErrorKind::Decode(format!(
                "unknown story status '{}'",
                self.status
            )))
        })?;
        Ok(StoryRecord {
            id: self.id,
            title: self.title,
            cover_url: self.cover_url,
            pages: pages
                .into_iter()
                .map(|row| PageRecord {
                    index: row.page_index.max(0) as usize,
                    text: row.text,
                    image_url: row.image_url,
                    narration_url: row.narration_url,
                })
                .collect(),
            theme: self.theme,
            setting: self.setting,
            style: self.style,
            language: self.language,
            voice_id: self.voice_id,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
