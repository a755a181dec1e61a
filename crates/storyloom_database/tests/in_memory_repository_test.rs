//! Tests for the in-memory story repository.

use storyloom_core::{AssetSlot, PageRecord, StoryRecord, StoryStatus};
use storyloom_database::InMemoryStoryRepository;
use storyloom_error::PersistenceErrorKind;
use storyloom_interface::StoryRepository;
use uuid::Uuid;

fn record(pages: usize) -> StoryRecord {
    let mut record = StoryRecord::new(Uuid::new_v4(), "Pip Finds the Tide");
    record.cover_url = "https://fal.media/files/cover.png".to_string();
    record.pages = (0..pages)
        .map(|index| PageRecord {
            index,
            text: format!("Page {} text.", index + 1),
            image_url: format!("https://fal.media/files/p{}.png", index),
            narration_url: None,
        })
        .collect();
    record
}

#[tokio::test]
async fn test_upsert_is_idempotent_by_id() {
    let repo = InMemoryStoryRepository::new();
    let mut story = record(2);

    repo.upsert_story(&story).await.unwrap();
    story.status = StoryStatus::Published;
    story.title = "Pip and the Tide".to_string();
    repo.upsert_story(&story).await.unwrap();

    assert_eq!(repo.len().await, 1);
    let loaded = repo.load_story(story.id).await.unwrap();
    assert_eq!(loaded.title, "Pip and the Tide");
    assert_eq!(loaded.status, StoryStatus::Published);
}

#[tokio::test]
async fn test_patch_asset_updates_single_slot() {
    let repo = InMemoryStoryRepository::new();
    let story = record(3);
    repo.upsert_story(&story).await.unwrap();

    repo.patch_asset(
        story.id,
        AssetSlot::PageImage(1),
        "https://cdn.storyloom.app/stories/x/page-1-image-1.png",
    )
    .await
    .unwrap();

    let loaded = repo.load_story(story.id).await.unwrap();
    assert_eq!(
        loaded.pages[1].image_url,
        "https://cdn.storyloom.app/stories/x/page-1-image-1.png"
    );
    assert_eq!(loaded.pages[0].image_url, story.pages[0].image_url);
    assert_eq!(loaded.cover_url, story.cover_url);
}

#[tokio::test]
async fn test_patch_missing_story_or_page_is_not_found() {
    let repo = InMemoryStoryRepository::new();
    let story = record(1);

    let err = repo
        .patch_asset(story.id, AssetSlot::Cover, "https://x/y.png")
        .await
        .unwrap_err();
    assert!(matches!(err.kind, PersistenceErrorKind::NotFound(_)));

    repo.upsert_story(&story).await.unwrap();
    let err = repo
        .patch_asset(story.id, AssetSlot::PageNarration(4), "https://x/y.mp3")
        .await
        .unwrap_err();
    assert!(matches!(err.kind, PersistenceErrorKind::NotFound(_)));
}

#[tokio::test]
async fn test_list_ids_in_creation_order() {
    let repo = InMemoryStoryRepository::new();
    let first = record(1);
    let mut second = record(1);
    second.created_at = first.created_at + chrono::Duration::seconds(5);

    repo.upsert_story(&second).await.unwrap();
    repo.upsert_story(&first).await.unwrap();

    assert_eq!(repo.list_story_ids().await.unwrap(), vec![first.id, second.id]);
}

#[tokio::test]
async fn test_unavailable_repository_fails() {
    let repo = InMemoryStoryRepository::new();
    repo.set_unavailable(true);

    let err = repo.upsert_story(&record(1)).await.unwrap_err();
    assert!(matches!(err.kind, PersistenceErrorKind::Database(_)));
    assert!(repo.is_empty().await);
}
