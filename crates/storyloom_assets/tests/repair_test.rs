//! Repair engine behavior per asset class.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use storyloom_assets::{
    AssetClassifier, ClassifierRules, HostPattern, HttpAssetFetcher, MigrationService,
    RepairEngine, RepairRequest,
};
use storyloom_cache::ClientAssetCache;
use storyloom_core::{PageRecord, StoryRecord};
use storyloom_database::InMemoryStoryRepository;
use storyloom_interface::{GenerationObserver, StoryRepository};
use storyloom_storage::FileSystemStorage;
use tempfile::TempDir;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PUBLIC_BASE: &str = "http://localhost:8080/media";

#[derive(Default)]
struct RecordingObserver {
    fixes: Mutex<Vec<(String, String)>>,
}

impl GenerationObserver for RecordingObserver {
    fn on_asset_fixed(&self, original: &str, fixed: &str) {
        if let Ok(mut fixes) = self.fixes.lock() {
            fixes.push((original.to_string(), fixed.to_string()));
        }
    }
}

fn engine(dir: &TempDir, repository: &InMemoryStoryRepository) -> (RepairEngine, Arc<RecordingObserver>) {
    let classifier = AssetClassifier::new(ClassifierRules {
        durable_hosts: vec![HostPattern::parse("localhost"), HostPattern::parse("*.storyloom.app")],
        ephemeral_hosts: vec![],
        ephemeral_markers: vec!["se=".to_string()],
        placeholder_prefix: "/placeholders/".to_string(),
    });
    let migration = MigrationService::new(
        classifier,
        Arc::new(HttpAssetFetcher::new(Duration::from_secs(5)).unwrap()),
        Arc::new(FileSystemStorage::new(dir.path(), PUBLIC_BASE).unwrap()),
        Arc::new(repository.clone()),
        ClientAssetCache::new(true, Duration::from_secs(3600)),
    );
    let observer = Arc::new(RecordingObserver::default());
    (
        RepairEngine::new(migration).with_observer(observer.clone()),
        observer,
    )
}

#[tokio::test]
async fn test_ephemeral_url_is_migrated_and_written_back() {
    let dir = TempDir::new().unwrap();
    let repository = InMemoryStoryRepository::new();
    let (engine, observer) = engine(&dir, &repository);

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/p0.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()))
        .mount(&server)
        .await;
    let ephemeral = format!("{}/files/p0.png?se=2030", server.uri());

    let mut story = StoryRecord::new(Uuid::new_v4(), "Luna");
    story.pages.push(PageRecord {
        index: 0,
        text: "Luna swam.".to_string(),
        image_url: ephemeral.clone(),
        narration_url: None,
    });
    repository.upsert_story(&story).await.unwrap();

    let fixes = engine
        .repair(&RepairRequest {
            story_id: Some(story.id),
            theme: "ocean".to_string(),
            urls: vec![ephemeral.clone()],
        })
        .await;

    let fixed = fixes.get(&ephemeral).unwrap();
    assert!(fixed.starts_with(&format!("{}/stories/{}/page-0-image-", PUBLIC_BASE, story.id)));
    let stored = repository.load_story(story.id).await.unwrap();
    assert_eq!(&stored.pages[0].image_url, fixed);
    assert_eq!(observer.fixes.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_dead_ephemeral_url_becomes_written_back_placeholder() {
    let dir = TempDir::new().unwrap();
    let repository = InMemoryStoryRepository::new();
    let (engine, _) = engine(&dir, &repository);

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let expired = format!("{}/files/cover.png?se=2020", server.uri());

    let mut story = StoryRecord::new(Uuid::new_v4(), "Luna");
    story.cover_url = expired.clone();
    repository.upsert_story(&story).await.unwrap();

    let fixes = engine
        .repair(&RepairRequest {
            story_id: Some(story.id),
            theme: "ocean".to_string(),
            urls: vec![expired.clone()],
        })
        .await;

    assert_eq!(fixes.get(&expired).map(String::as_str), Some("/placeholders/ocean.png"));
    let stored = repository.load_story(story.id).await.unwrap();
    assert_eq!(stored.cover_url, "/placeholders/ocean.png");
}

#[tokio::test]
async fn test_durable_url_is_cache_busted_once() {
    let dir = TempDir::new().unwrap();
    let repository = InMemoryStoryRepository::new();
    let (engine, observer) = engine(&dir, &repository);
    let durable = "https://cdn.storyloom.app/stories/1/cover-1.png".to_string();

    let first = engine
        .repair(&RepairRequest {
            story_id: None,
            theme: "space".to_string(),
            urls: vec![durable.clone()],
        })
        .await;
    let busted = first.get(&durable).unwrap().clone();
    assert!(busted.starts_with(&format!("{}?_cb=", durable)));

    let second = engine
        .repair(&RepairRequest {
            story_id: None,
            theme: "space".to_string(),
            urls: vec![busted.clone()],
        })
        .await;
    assert_eq!(second.get(&busted).map(String::as_str), Some("/placeholders/space.png"));
    assert_eq!(observer.fixes.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_placeholders_are_left_alone() {
    let dir = TempDir::new().unwrap();
    let repository = InMemoryStoryRepository::new();
    let (engine, observer) = engine(&dir, &repository);

    let fixes = engine
        .repair(&RepairRequest {
            story_id: None,
            theme: "forest".to_string(),
            urls: vec!["/placeholders/forest.png".to_string()],
        })
        .await;

    assert!(fixes.is_empty());
    assert!(observer.fixes.lock().unwrap().is_empty());
}
