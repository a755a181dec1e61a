//! Migration service behavior against a mock origin and a temp directory.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use storyloom_assets::{
    AssetClassifier, ClassifierRules, HostPattern, HttpAssetFetcher, MigrationContext,
    MigrationService, MigrationStatus,
};
use storyloom_cache::ClientAssetCache;
use storyloom_core::{AssetClass, AssetSlot, PageRecord, StoryRecord, StoryStatus};
use storyloom_database::InMemoryStoryRepository;
use storyloom_error::{PersistenceErrorKind, StorageError, StorageErrorKind};
use storyloom_interface::StoryRepository;
use storyloom_storage::{FileSystemStorage, ObjectMetadata, ObjectStorage, StoredObject};
use tempfile::TempDir;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PUBLIC_BASE: &str = "http://localhost:8080/media";

fn classifier() -> AssetClassifier {
    AssetClassifier::new(ClassifierRules {
        durable_hosts: vec![HostPattern::parse("localhost")],
        ephemeral_hosts: vec![HostPattern::parse("*.fal.media")],
        ephemeral_markers: vec!["se=".to_string(), "sig=".to_string()],
        placeholder_prefix: "/placeholders/".to_string(),
    })
}

struct RejectingStorage;

#[async_trait]
impl ObjectStorage for RejectingStorage {
    fn backend(&self) -> &'static str {
        "rejecting"
    }

    async fn upload(
        &self,
        _key: &str,
        _data: &[u8],
        _metadata: &ObjectMetadata,
    ) -> Result<StoredObject, StorageError> {
        Err(StorageError::new(StorageErrorKind::Rejected {
            status: 503,
            message: "bucket offline".to_string(),
        }))
    }

    async fn exists(&self, _key: &str) -> Result<bool, StorageError> {
        Ok(false)
    }

    async fn retrieve(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::new(StorageErrorKind::NotFound(key.to_string())))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", PUBLIC_BASE, key)
    }
}

struct Harness {
    _dir: TempDir,
    service: MigrationService,
    repository: InMemoryStoryRepository,
    storage: Arc<FileSystemStorage>,
}

fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(FileSystemStorage::new(dir.path(), PUBLIC_BASE).unwrap());
    let repository = InMemoryStoryRepository::new();
    let service = MigrationService::new(
        classifier(),
        Arc::new(HttpAssetFetcher::new(Duration::from_secs(5)).unwrap()),
        storage.clone(),
        Arc::new(repository.clone()),
        ClientAssetCache::new(true, Duration::from_secs(3600)),
    );
    Harness {
        _dir: dir,
        service,
        repository,
        storage,
    }
}

fn service_with(storage: Arc<dyn ObjectStorage>, cache: ClientAssetCache) -> MigrationService {
    MigrationService::new(
        classifier(),
        Arc::new(HttpAssetFetcher::new(Duration::from_secs(5)).unwrap()),
        storage,
        Arc::new(InMemoryStoryRepository::new()),
        cache,
    )
}

async fn origin_serving(path_str: &str, body: &[u8], mime: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", mime)
                .set_body_bytes(body.to_vec()),
        )
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_settled_references_are_fixed_points() {
    let h = harness();
    let server = MockServer::start().await;
    let context = MigrationContext::for_slot(Uuid::new_v4(), AssetSlot::Cover, "ocean");

    for url in [
        format!("{}/stories/a/cover-1.png", PUBLIC_BASE),
        "/placeholders/ocean.png".to_string(),
    ] {
        let outcome = h.service.ensure_durable(&url, &context).await;
        assert_eq!(outcome.status, MigrationStatus::Unchanged);
        assert_eq!(outcome.url(), url);

        let again = h.service.ensure_durable(outcome.url(), &context).await;
        assert_eq!(again.url(), url);
    }
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_ephemeral_asset_is_uploaded_and_written_back() {
    let h = harness();
    let server = origin_serving("/files/cover.png", b"png-bytes", "image/png").await;

    let mut story = StoryRecord::new(Uuid::new_v4(), "Luna");
    story.cover_url = format!("{}/files/cover.png", server.uri());
    h.repository.upsert_story(&story).await.unwrap();

    let context =
        MigrationContext::for_slot(story.id, AssetSlot::Cover, "ocean").with_write_back();
    let outcome = h.service.ensure_durable(&story.cover_url, &context).await;

    assert_eq!(outcome.status, MigrationStatus::Migrated);
    assert_eq!(outcome.reference.class, AssetClass::Durable);
    let prefix = format!("{}/stories/{}/cover-", PUBLIC_BASE, story.id);
    assert!(outcome.url().starts_with(&prefix), "{}", outcome.url());
    assert!(outcome.url().ends_with(".png"));

    let key = outcome.url().trim_start_matches(&format!("{}/", PUBLIC_BASE));
    assert_eq!(h.storage.retrieve(key).await.unwrap(), b"png-bytes");

    let stored = h.repository.load_story(story.id).await.unwrap();
    assert_eq!(stored.cover_url, outcome.url());
    assert!(h.service.cache().contains(&story.cover_url));
}

#[tokio::test]
async fn test_inline_audio_is_decoded_and_uploaded() {
    let h = harness();
    let context = MigrationContext::for_slot(Uuid::new_v4(), AssetSlot::PageNarration(0), "ocean");

    let outcome = h
        .service
        .ensure_durable("data:audio/mpeg;base64,SUQzBA==", &context)
        .await;

    assert_eq!(outcome.status, MigrationStatus::Migrated);
    assert!(outcome.url().contains("page-0-narration-"));
    assert!(outcome.url().ends_with(".mp3"));
}

#[tokio::test]
async fn test_expired_url_falls_back_to_placeholder() {
    let h = harness();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let context = MigrationContext::for_slot(Uuid::new_v4(), AssetSlot::PageImage(2), "Deep Ocean");
    let outcome = h
        .service
        .ensure_durable(&format!("{}/files/gone.png", server.uri()), &context)
        .await;

    assert_eq!(outcome.status, MigrationStatus::PlaceholderFallback);
    assert_eq!(outcome.url(), "/placeholders/deep-ocean.png");
    assert!(matches!(
        outcome.error.map(|e| e.kind),
        Some(PersistenceErrorKind::Fetch(_))
    ));
}

#[tokio::test]
async fn test_failed_upload_prefers_cached_copy() {
    let server = origin_serving("/files/p1.png", &[1, 2, 3], "image/png").await;
    let service = service_with(
        Arc::new(RejectingStorage),
        ClientAssetCache::new(true, Duration::from_secs(3600)),
    );
    let url = format!("{}/files/p1.png", server.uri());

    let outcome = service
        .ensure_durable(&url, &MigrationContext::detached("forest"))
        .await;

    assert_eq!(outcome.status, MigrationStatus::CachedFallback);
    assert_eq!(outcome.url(), "data:image/png;base64,AQID");
    assert_eq!(outcome.reference.cache_key.as_deref(), Some(url.as_str()));
    assert!(matches!(
        outcome.error.map(|e| e.kind),
        Some(PersistenceErrorKind::Upload(_))
    ));
}

#[tokio::test]
async fn test_failed_upload_without_cache_keeps_original() {
    let server = origin_serving("/files/p1.png", &[1, 2, 3], "image/png").await;
    let service = service_with(
        Arc::new(RejectingStorage),
        ClientAssetCache::new(false, Duration::from_secs(3600)),
    );
    let url = format!("{}/files/p1.png", server.uri());

    let outcome = service
        .ensure_durable(&url, &MigrationContext::detached("forest"))
        .await;

    assert_eq!(outcome.status, MigrationStatus::OriginalFallback);
    assert_eq!(outcome.url(), url);
}

#[tokio::test]
async fn test_migrated_reference_keeps_its_classification() {
    let dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(dir.path(), "http://media.unlisted.test/m").unwrap();
    let service = service_with(
        Arc::new(storage),
        ClientAssetCache::new(false, Duration::from_secs(3600)),
    );
    let server = origin_serving("/files/p2.png", b"png-bytes", "image/png").await;

    let outcome = service
        .ensure_durable(
            &format!("{}/files/p2.png", server.uri()),
            &MigrationContext::detached("forest"),
        )
        .await;

    assert_eq!(outcome.status, MigrationStatus::Migrated);
    assert!(outcome.url().starts_with("http://media.unlisted.test/m/"));
    assert_eq!(outcome.reference.class, service.classifier().classify(outcome.url()));
    assert_eq!(outcome.reference.class, AssetClass::Ephemeral);
}

#[tokio::test]
async fn test_publish_settles_every_reference() {
    let h = harness();
    let server = origin_serving("/files/img.png", b"img", "image/png").await;
    let ephemeral = format!("{}/files/img.png", server.uri());

    let mut story = StoryRecord::new(Uuid::new_v4(), "Luna and the Whale");
    story.theme = "ocean".to_string();
    story.cover_url = ephemeral.clone();
    story.pages = (0..3)
        .map(|index| PageRecord {
            index,
            text: format!("Page {}.", index + 1),
            image_url: if index == 1 {
                "/placeholders/ocean.png".to_string()
            } else {
                ephemeral.clone()
            },
            narration_url: None,
        })
        .collect();

    let outcome = h.service.publish(story.clone()).await;

    assert!(outcome.persisted);
    assert!(outcome.unresolved.is_empty());
    assert_eq!(outcome.migrated, 3);
    assert_eq!(outcome.record.status, StoryStatus::Published);
    for (_, url) in outcome.record.asset_urls() {
        assert!(h.service.classifier().classify(&url).is_settled(), "{}", url);
    }
    assert_eq!(outcome.record.pages[1].image_url, "/placeholders/ocean.png");

    let stored = h.repository.load_story(story.id).await.unwrap();
    assert_eq!(stored, outcome.record);
}

#[tokio::test]
async fn test_publish_survives_repository_outage() {
    let h = harness();
    h.repository.set_unavailable(true);

    let mut story = StoryRecord::new(Uuid::new_v4(), "Offline");
    story.cover_url = "/placeholders/space.png".to_string();

    let outcome = h.service.publish(story).await;

    assert!(!outcome.persisted);
    assert!(matches!(
        outcome.error.map(|e| e.kind),
        Some(PersistenceErrorKind::Database(_))
    ));
    assert_eq!(outcome.record.status, StoryStatus::Published);
}
