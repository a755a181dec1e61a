//! The wired service, configured with mock adapters and a temp media dir.

use std::sync::Arc;
use storyloom::{
    AdapterConfig, AdapterKind, ChannelObserver, GenerationEvent, InMemoryStoryRepository,
    PersistenceErrorKind, RepairRequest, StoryParams, StoryRepository, StoryStatus, Storyloom,
    StoryloomConfig, StoryloomErrorKind,
};
use tempfile::TempDir;
use uuid::Uuid;

const PUBLIC_BASE: &str = "http://localhost:8080/media";

fn mock_config(dir: &TempDir, with_speech: bool) -> StoryloomConfig {
    let mut config = StoryloomConfig::bundled().unwrap();
    config.providers.text = vec![AdapterConfig::new("mock-writer", AdapterKind::Mock)];
    config.providers.image = vec![AdapterConfig::new("mock-painter", AdapterKind::Mock)];
    config.providers.speech = if with_speech {
        vec![AdapterConfig::new("mock-voice", AdapterKind::Mock)]
    } else {
        Vec::new()
    };
    config.storage.path = Some(dir.path().to_string_lossy().into_owned());
    config.storage.public_base_url = PUBLIC_BASE.to_string();
    config.classifier.durable_hosts.push("placehold.co".to_string());
    config.generation.narration_delay_ms = 10;
    config
}

fn params() -> StoryParams {
    StoryParams::builder()
        .protagonist_name("Milo")
        .protagonist_age(5u8)
        .theme("space")
        .setting("a moon base")
        .style("crayon")
        .page_count(3usize)
        .build()
        .unwrap()
}

fn wire(config: StoryloomConfig) -> (Storyloom, InMemoryStoryRepository) {
    let repository = InMemoryStoryRepository::new();
    let Ok(storyloom) = Storyloom::with_repository(config, Arc::new(repository.clone())) else {
        panic!("mock configuration should wire");
    };
    (storyloom, repository)
}

#[tokio::test]
async fn test_generate_publishes_with_mock_providers() {
    let dir = TempDir::new().unwrap();
    let (storyloom, repository) = wire(mock_config(&dir, false));
    assert!(!storyloom.generator().narration_enabled());

    let story = storyloom.generate(params()).await.unwrap();

    let record = story.record();
    assert_eq!(record.title, "The Borrowed Star");
    assert_eq!(record.pages.len(), 3);
    assert_eq!(record.status, StoryStatus::Published);
    assert!(record.cover_url.starts_with("https://placehold.co/"));
    assert!(record.pages.iter().all(|page| page.narration_url.is_none()));
    assert!(*story.persisted());

    let stored = repository.load_story(record.id).await.unwrap();
    assert_eq!(&stored, record);
    assert_eq!(storyloom.load_story(record.id).await.unwrap(), stored);
}

#[tokio::test]
async fn test_narration_lands_in_durable_storage() {
    let dir = TempDir::new().unwrap();
    let (storyloom, _repository) = wire(mock_config(&dir, true));
    assert!(storyloom.generator().narration_enabled());

    let story = storyloom.generate(params()).await.unwrap();

    for page in &story.record().pages {
        let url = page.narration_url.as_deref().unwrap();
        assert!(url.starts_with(PUBLIC_BASE), "{url}");
        assert!(url.ends_with(".mp3"), "{url}");
    }
}

#[tokio::test]
async fn test_generate_with_streams_stage_events() {
    let dir = TempDir::new().unwrap();
    let (storyloom, _repository) = wire(mock_config(&dir, false));
    let (observer, mut events) = ChannelObserver::channel();

    storyloom
        .generate_with(params(), &storyloom::CancellationFlag::new(), &observer)
        .await
        .unwrap();
    drop(observer);

    let mut last_progress = None;
    while let Some(event) = events.recv().await {
        if let GenerationEvent::StageChanged { progress, .. } = event {
            last_progress = Some(progress);
        }
    }
    assert_eq!(last_progress, Some(100));
}

#[tokio::test]
async fn test_repair_busts_durable_url_then_falls_back() {
    let dir = TempDir::new().unwrap();
    let (storyloom, _repository) = wire(mock_config(&dir, false));
    let url = format!("{}/stories/a/cover.png", PUBLIC_BASE);

    let first = storyloom
        .repair(&RepairRequest {
            story_id: None,
            theme: "Space".to_string(),
            urls: vec![url.clone()],
        })
        .await;
    let busted = first.get(&url).unwrap();
    assert!(busted.starts_with(&format!("{}?_cb=", url)), "{busted}");

    let (observer, mut events) = ChannelObserver::channel();
    let second = storyloom
        .repair_observed(
            &RepairRequest {
                story_id: None,
                theme: "Space".to_string(),
                urls: vec![busted.clone()],
            },
            Arc::new(observer),
        )
        .await;
    assert_eq!(second.get(busted).unwrap(), "/placeholders/space.png");
    assert!(matches!(
        events.recv().await,
        Some(GenerationEvent::AssetFixed { .. })
    ));
}

#[tokio::test]
async fn test_sweep_runs_once_per_window() {
    let dir = TempDir::new().unwrap();
    let (storyloom, _repository) = wire(mock_config(&dir, false));
    storyloom.generate(params()).await.unwrap();

    let report = storyloom.sweep().await;
    assert!(!report.skipped);
    assert_eq!(report.stories, 1);
    assert_eq!(report.failed, 0);

    assert!(storyloom.sweep().await.skipped);
}

#[tokio::test]
async fn test_missing_text_provider_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let mut config = mock_config(&dir, false);
    config.providers.text.clear();

    let Err(error) = Storyloom::with_repository(config, Arc::new(InMemoryStoryRepository::new()))
    else {
        panic!("an empty text chain should not wire");
    };
    assert!(matches!(error.kind(), StoryloomErrorKind::Config(_)));
}

#[tokio::test]
async fn test_unset_key_variable_skips_adapter() {
    let dir = TempDir::new().unwrap();
    let mut config = mock_config(&dir, false);
    let mut keyed = AdapterConfig::new("keyed-writer", AdapterKind::Mock);
    keyed.api_key_env = Some("STORYLOOM_TEST_KEY_THAT_IS_NEVER_SET".to_string());
    config.providers.text = vec![keyed];

    let Err(error) = Storyloom::with_repository(config, Arc::new(InMemoryStoryRepository::new()))
    else {
        panic!("a text chain with only keyless adapters should not wire");
    };
    assert!(matches!(error.kind(), StoryloomErrorKind::Config(_)));
}

#[tokio::test]
async fn test_adapter_in_wrong_capability_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = mock_config(&dir, false);
    config
        .providers
        .text
        .push(AdapterConfig::new("fal", AdapterKind::FalImage));

    let Err(error) = Storyloom::with_repository(config, Arc::new(InMemoryStoryRepository::new()))
    else {
        panic!("an image adapter in the text chain should not wire");
    };
    assert!(matches!(error.kind(), StoryloomErrorKind::Config(_)));
}

#[tokio::test]
async fn test_load_unknown_story_is_not_found() {
    let dir = TempDir::new().unwrap();
    let (storyloom, _repository) = wire(mock_config(&dir, false));

    let error = storyloom.load_story(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(error.kind, PersistenceErrorKind::NotFound(_)));
}

#[tokio::test]
async fn test_relative_public_base_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let mut config = mock_config(&dir, false);
    config.storage.public_base_url = "/media".to_string();

    let Err(error) = Storyloom::with_repository(config, Arc::new(InMemoryStoryRepository::new()))
    else {
        panic!("a host-less public base URL should not wire");
    };
    assert!(matches!(error.kind(), StoryloomErrorKind::Config(_)));
}
