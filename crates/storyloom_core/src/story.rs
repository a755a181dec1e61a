//! Persisted story records.

use crate::AssetSlot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication status of a stored story.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    /// Every asset is durable or a placeholder
    #[display("published")]
    #[strum(serialize = "published")]
    Published,
    /// At least one asset still needs migrating
    #[display("pending_repair")]
    #[strum(serialize = "pending_repair")]
    PendingRepair,
}

/// One page of a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Zero-based page index, contiguous within a story
    pub index: usize,
    /// Page text, never empty
    pub text: String,
    /// Illustration URL
    pub image_url: String,
    /// Narration URL, absent when narration was skipped or failed
    pub narration_url: Option<String>,
}

/// A generated story as stored.
///
/// # Examples
///
/// ```
/// use storyloom_core::{AssetSlot, PageRecord, StoryRecord};
/// use uuid::Uuid;
///
/// let mut record = StoryRecord::new(Uuid::new_v4(), "Luna and the Whale");
/// record.cover_url = "https://cdn.example.com/cover.png".to_string();
/// record.pages.push(PageRecord {
///     index: 0,
///     text: "Luna dove in.".to_string(),
///     image_url: "https://cdn.example.com/p0.png".to_string(),
///     narration_url: None,
/// });
///
/// assert_eq!(record.asset_urls().len(), 2);
/// assert!(record.set_url(AssetSlot::PageNarration(0), "https://cdn.example.com/p0.mp3"));
/// assert!(!record.set_url(AssetSlot::PageImage(7), "https://cdn.example.com/p7.png"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRecord {
    /// Story id
    pub id: Uuid,
    /// Story title
    pub title: String,
    /// Cover image URL
    pub cover_url: String,
    /// Pages in reading order
    pub pages: Vec<PageRecord>,
    /// Theme the story was generated for
    pub theme: String,
    /// Where the story takes place
    pub setting: String,
    /// Illustration style
    pub style: String,
    /// Language tag
    pub language: String,
    /// Narration voice used
    pub voice_id: Option<String>,
    /// Publication status
    pub status: StoryStatus,
    /// When the story was first stored
    pub created_at: DateTime<Utc>,
    /// When the story was last changed
    pub updated_at: DateTime<Utc>,
}

impl StoryRecord {
    /// Create an empty record pending repair.
    pub fn new(id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            cover_url: String::new(),
            pages: Vec::new(),
            theme: String::new(),
            setting: String::new(),
            style: String::new(),
            language: "en".to_string(),
            voice_id: None,
            status: StoryStatus::PendingRepair,
            created_at: now,
            updated_at: now,
        }
    }

    /// Every populated asset slot and its URL, cover first.
    pub fn asset_urls(&self) -> Vec<(AssetSlot, String)> {
        let mut urls = Vec::with_capacity(1 + self.pages.len() * 2);
        if !self.cover_url.is_empty() {
            urls.push((AssetSlot::Cover, self.cover_url.clone()));
        }
        for page in &self.pages {
            if !page.image_url.is_empty() {
                urls.push((AssetSlot::PageImage(page.index), page.image_url.clone()));
            }
            if let Some(narration) = &page.narration_url {
                urls.push((AssetSlot::PageNarration(page.index), narration.clone()));
            }
        }
        urls
    }

    /// URL currently held in a slot.
    pub fn url_for(&self, slot: AssetSlot) -> Option<&str> {
        match slot {
            AssetSlot::Cover => Some(self.cover_url.as_str()),
            AssetSlot::PageImage(index) => self.page(index).map(|p| p.image_url.as_str()),
            AssetSlot::PageNarration(index) => {
                self.page(index).and_then(|p| p.narration_url.as_deref())
            }
        }
    }

    /// Replace the URL in a slot. Returns false when the page does not exist.
    pub fn set_url(&mut self, slot: AssetSlot, url: impl Into<String>) -> bool {
        let url = url.into();
        let updated = match slot {
            AssetSlot::Cover => {
                self.cover_url = url;
                true
            }
            AssetSlot::PageImage(index) => match self.page_mut(index) {
                Some(page) => {
                    page.image_url = url;
                    true
                }
                None => false,
            },
            AssetSlot::PageNarration(index) => match self.page_mut(index) {
                Some(page) => {
                    page.narration_url = Some(url);
                    true
                }
                None => false,
            },
        };
        if updated {
            self.updated_at = Utc::now();
        }
        updated
    }

    fn page(&self, index: usize) -> Option<&PageRecord> {
        self.pages.iter().find(|p| p.index == index)
    }

    fn page_mut(&mut self, index: usize) -> Option<&mut PageRecord> {
        self.pages.iter_mut().find(|p| p.index == index)
    }
}
