//! End-to-end generator scenarios with scripted providers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use storyloom_assets::{
    AssetClassifier, ClassifierRules, HostPattern, HttpAssetFetcher, MigrationService,
};
use storyloom_cache::ClientAssetCache;
use storyloom_config::GenerationConfig;
use storyloom_core::{Capability, ProviderRequest, RawAsset, Stage, StoryParams, StoryStatus};
use storyloom_database::InMemoryStoryRepository;
use storyloom_error::{GenerationErrorKind, ProviderErrorKind};
use storyloom_interface::{GenerationEvent, GenerationObserver, StoryRepository};
use storyloom_narrative::{
    CancellationFlag, ChannelObserver, GeneratedStory, ProviderChains, StoryGenerator,
};
use storyloom_providers::{FallbackChain, MockAdapter, MockResponse, ProviderHealth};
use storyloom_storage::FileSystemStorage;
use tempfile::TempDir;

const PUBLIC_BASE: &str = "http://localhost:8080/media";
const OCEAN_PLACEHOLDER: &str = "/placeholders/ocean.png";

fn luna(pages: usize) -> StoryParams {
    StoryParams::builder()
        .protagonist_name("Luna")
        .protagonist_age(6u8)
        .theme("ocean")
        .setting("a coral reef")
        .style("watercolor")
        .page_count(pages)
        .build()
        .unwrap()
}

fn story_text(pages: usize) -> String {
    let mut text = "Title: Luna and the Singing Whale\n\n".to_string();
    for page in 1..=pages {
        text.push_str(&format!("Page {}\nLuna found wonder number {}.\n\n", page, page));
    }
    text
}

fn page_of(request: &ProviderRequest) -> Option<usize> {
    let ProviderRequest::Image(image) = request else {
        return None;
    };
    (1..=20).find(|page| image.prompt.contains(&format!("style, page {}.", page)))
}

fn page_url(page: usize) -> String {
    format!("{}/fixtures/page-{}.png", PUBLIC_BASE, page)
}

fn cover_url() -> String {
    format!("{}/fixtures/cover.png", PUBLIC_BASE)
}

fn server_error() -> ProviderErrorKind {
    ProviderErrorKind::ServerError {
        status: Some(503),
        message: "overloaded".to_string(),
    }
}

/// Paints every page at a durable fixture URL, failing pages listed in `broken`.
fn painter(name: &str, broken: &'static [usize]) -> MockAdapter {
    MockAdapter::responding(name, Capability::Image, move |_, request| match page_of(request) {
        Some(page) if broken.contains(&page) => MockResponse::Error(server_error()),
        Some(page) => MockResponse::Success(RawAsset::Url(page_url(page))),
        None => MockResponse::Success(RawAsset::Url(cover_url())),
    })
}

fn writer(text: String) -> MockAdapter {
    MockAdapter::success("writer", Capability::Text, RawAsset::Text(text))
}

fn chain(capability: Capability, adapters: Vec<MockAdapter>) -> FallbackChain {
    FallbackChain::new(
        capability,
        adapters
            .into_iter()
            .map(|adapter| Arc::new(adapter) as Arc<dyn storyloom_interface::ProviderAdapter>)
            .collect(),
        ProviderHealth::new(),
    )
}

struct Harness {
    _dir: TempDir,
    repository: InMemoryStoryRepository,
    generator: StoryGenerator,
}

fn harness(
    text: Vec<MockAdapter>,
    image: Vec<MockAdapter>,
    speech: Option<Vec<MockAdapter>>,
    config: GenerationConfig,
) -> Harness {
    let dir = TempDir::new().unwrap();
    let repository = InMemoryStoryRepository::new();
    let migration = MigrationService::new(
        AssetClassifier::new(ClassifierRules {
            durable_hosts: vec![HostPattern::parse("localhost")],
            placeholder_prefix: "/placeholders/".to_string(),
            ..Default::default()
        }),
        Arc::new(HttpAssetFetcher::new(Duration::from_secs(5)).unwrap()),
        Arc::new(FileSystemStorage::new(dir.path(), PUBLIC_BASE).unwrap()),
        Arc::new(repository.clone()),
        ClientAssetCache::new(true, Duration::from_secs(3600)),
    );
    let chains = ProviderChains {
        text: chain(Capability::Text, text),
        image: chain(Capability::Image, image),
        speech: speech.map(|adapters| chain(Capability::Speech, adapters)),
    };
    Harness {
        _dir: dir,
        repository,
        generator: StoryGenerator::new(chains, migration, config),
    }
}

fn quick_config() -> GenerationConfig {
    GenerationConfig {
        narration_delay_ms: 1,
        narration_backoff_ms: 1,
        narration_max_backoff_secs: 1,
        ..Default::default()
    }
}

fn image_urls(story: &GeneratedStory) -> Vec<String> {
    story
        .record()
        .pages
        .iter()
        .map(|page| page.image_url.clone())
        .collect()
}

struct CancelOnStage {
    stage: Stage,
    flag: CancellationFlag,
}

impl GenerationObserver for CancelOnStage {
    fn on_stage_change(&self, stage: Stage, _progress: u8, _label: &str) {
        if stage == self.stage {
            self.flag.cancel();
        }
    }
}

#[tokio::test]
async fn test_luna_retried_page_shows_eventual_image() {
    let page_two_calls = Arc::new(AtomicUsize::new(0));
    let counter = page_two_calls.clone();
    let image = MockAdapter::responding("painter", Capability::Image, move |_, request| {
        match page_of(request) {
            Some(2) if counter.fetch_add(1, Ordering::SeqCst) < 2 => {
                MockResponse::Error(server_error())
            }
            Some(page) => MockResponse::Success(RawAsset::Url(page_url(page))),
            None => MockResponse::Success(RawAsset::Url(cover_url())),
        }
    });
    let h = harness(
        vec![writer(story_text(5))],
        vec![image.clone()],
        None,
        quick_config(),
    );

    let story = h.generator.generate(luna(5)).await.unwrap();

    assert_eq!(story.record().pages.len(), 5);
    assert_eq!(image_urls(&story), (1..=5).map(page_url).collect::<Vec<_>>());
    assert!(story.placeholder_pages().is_empty());
    assert_eq!(page_two_calls.load(Ordering::SeqCst), 3);
    assert_eq!(image.call_count(), 1 + 5 + 2);
    assert_eq!(story.record().status, StoryStatus::Published);
    assert!(*story.persisted());
}

#[tokio::test]
async fn test_provider_failing_twice_then_succeeding() {
    let image = MockAdapter::fail_then_succeed(
        "painter",
        Capability::Image,
        2,
        server_error(),
        RawAsset::Url(cover_url()),
    );
    let h = harness(
        vec![writer(story_text(5))],
        vec![image],
        None,
        quick_config(),
    );

    let story = h.generator.generate(luna(5)).await.unwrap();

    assert_eq!(story.record().cover_url, cover_url());
    assert_eq!(story.record().pages.len(), 5);
    assert!(story.placeholder_pages().is_empty());
    assert!(image_urls(&story).iter().all(|url| url != OCEAN_PLACEHOLDER));
}

#[tokio::test]
async fn test_page_three_failing_everywhere_becomes_placeholder() {
    let first = painter("fal", &[3]);
    let second = painter("openai", &[3]);
    let h = harness(
        vec![writer(story_text(5))],
        vec![first.clone(), second.clone()],
        None,
        quick_config(),
    );

    let story = h.generator.generate(luna(5)).await.unwrap();

    assert_eq!(
        image_urls(&story),
        vec![
            page_url(1),
            page_url(2),
            OCEAN_PLACEHOLDER.to_string(),
            page_url(4),
            page_url(5),
        ]
    );
    assert_eq!(story.placeholder_pages(), &vec![2]);
    // Page 3 spends the whole budget; the second adapter only sees page 3
    assert_eq!(first.call_count(), 1 + 4 + 3);
    assert_eq!(second.call_count(), 3);
    assert_eq!(story.record().status, StoryStatus::Published);
}

#[tokio::test]
async fn test_missing_title_uses_protagonist() {
    let text = "Page 1\nLuna waved.\nPage 2\nThe whale waved back.".to_string();
    let h = harness(vec![writer(text)], vec![painter("painter", &[])], None, quick_config());

    let story = h.generator.generate(luna(2)).await.unwrap();

    assert_eq!(story.record().title, "Story of Luna");
    assert_eq!(story.parse_issues().len(), 1);
}

#[tokio::test]
async fn test_page_count_is_always_honoured() {
    for pages in [1, 3, 7] {
        let h = harness(
            vec![writer(story_text(2))],
            vec![painter("painter", &[])],
            None,
            quick_config(),
        );
        let story = h.generator.generate(luna(pages)).await.unwrap();
        let record = story.record();
        assert_eq!(record.pages.len(), pages);
        assert!(record.pages.iter().all(|page| !page.text.trim().is_empty()));
        assert_eq!(
            record.pages.iter().map(|page| page.index).collect::<Vec<_>>(),
            (0..pages).collect::<Vec<_>>()
        );
    }
}

#[tokio::test]
async fn test_cover_falls_back_to_first_page() {
    let image = MockAdapter::responding("painter", Capability::Image, |_, request| {
        match page_of(request) {
            Some(page) => MockResponse::Success(RawAsset::Url(page_url(page))),
            None => MockResponse::Error(server_error()),
        }
    });
    let h = harness(
        vec![writer(story_text(3))],
        vec![image.clone()],
        None,
        quick_config(),
    );

    let story = h.generator.generate(luna(3)).await.unwrap();

    assert_eq!(story.record().cover_url, page_url(1));
    assert_eq!(image.call_count(), 3 + 3);
}

#[tokio::test]
async fn test_cancellation_stops_calls_and_persists_nothing() {
    let image = painter("painter", &[]);
    let h = harness(
        vec![writer(story_text(4))],
        vec![image.clone()],
        None,
        quick_config(),
    );
    let flag = CancellationFlag::new();
    let observer = CancelOnStage {
        stage: Stage::Illustrations,
        flag: flag.clone(),
    };

    let err = h
        .generator
        .generate_with(luna(4), &flag, &observer)
        .await
        .unwrap_err();

    assert_eq!(err.kind, GenerationErrorKind::Cancelled);
    assert_eq!(image.call_count(), 1);
    assert!(h.repository.is_empty().await);
}

#[tokio::test]
async fn test_cancelled_before_start_calls_nothing() {
    let text = writer(story_text(2));
    let h = harness(
        vec![text.clone()],
        vec![painter("painter", &[])],
        None,
        quick_config(),
    );
    let flag = CancellationFlag::new();
    flag.cancel();

    let (observer, _events) = ChannelObserver::channel();
    let err = h
        .generator
        .generate_with(luna(2), &flag, &observer)
        .await
        .unwrap_err();

    assert_eq!(err.kind, GenerationErrorKind::Cancelled);
    assert_eq!(text.call_count(), 0);
}

#[tokio::test]
async fn test_total_text_failure_is_retryable() {
    let text = MockAdapter::failing("writer", Capability::Text, server_error());
    let image = painter("painter", &[]);
    let h = harness(vec![text], vec![image.clone()], None, quick_config());

    let err = h.generator.generate(luna(3)).await.unwrap_err();

    assert!(matches!(err.kind, GenerationErrorKind::NarrativeUnavailable(_)));
    assert!(err.is_retryable());
    assert_eq!(image.call_count(), 0);
    assert!(h.repository.is_empty().await);
}

#[tokio::test]
async fn test_placeholder_ceiling_fails_attempt() {
    let config = GenerationConfig {
        placeholder_ceiling: Some(0),
        ..quick_config()
    };
    let h = harness(
        vec![writer(story_text(5))],
        vec![painter("painter", &[3])],
        None,
        config,
    );

    let err = h.generator.generate(luna(5)).await.unwrap_err();

    assert_eq!(
        err.kind,
        GenerationErrorKind::AttemptCeilingExceeded {
            placeholders: 1,
            ceiling: 0
        }
    );
    assert!(err.is_retryable());
    assert!(h.repository.is_empty().await);
}

#[tokio::test]
async fn test_invalid_parameters_call_no_provider() {
    let text = writer(story_text(1));
    let h = harness(
        vec![text.clone()],
        vec![painter("painter", &[])],
        None,
        quick_config(),
    );

    let err = h.generator.generate(luna(0)).await.unwrap_err();

    assert!(matches!(err.kind, GenerationErrorKind::InvalidParameters(_)));
    assert_eq!(text.call_count(), 0);
}

#[tokio::test]
async fn test_narration_is_migrated_per_page() {
    let speech = MockAdapter::fail_then_succeed(
        "voice",
        Capability::Speech,
        1,
        server_error(),
        RawAsset::Bytes {
            data: b"ID3audio".to_vec(),
            mime_type: "audio/mpeg".to_string(),
        },
    );
    let h = harness(
        vec![writer(story_text(3))],
        vec![painter("painter", &[])],
        Some(vec![speech.clone()]),
        quick_config(),
    );

    let story = h.generator.generate(luna(3)).await.unwrap();
    let record = story.record();

    for page in &record.pages {
        let narration = page.narration_url.as_deref().unwrap();
        let prefix = format!(
            "{}/stories/{}/page-{}-narration-",
            PUBLIC_BASE, record.id, page.index
        );
        assert!(narration.starts_with(&prefix), "{}", narration);
        assert!(narration.ends_with(".mp3"));
    }
    assert_eq!(speech.call_count(), 4);
    let stored = h.repository.load_story(record.id).await.unwrap();
    assert_eq!(&stored, record);
}

#[tokio::test]
async fn test_failed_narration_leaves_pages_silent() {
    let speech = MockAdapter::failing(
        "voice",
        Capability::Speech,
        ProviderErrorKind::Unauthorized("bad key".to_string()),
    );
    let h = harness(
        vec![writer(story_text(2))],
        vec![painter("painter", &[])],
        Some(vec![speech.clone()]),
        quick_config(),
    );

    let story = h.generator.generate(luna(2)).await.unwrap();

    assert!(story.record().pages.iter().all(|page| page.narration_url.is_none()));
    // Unauthorized is permanent, so no backoff retries
    assert_eq!(speech.call_count(), 2);
    assert_eq!(story.record().status, StoryStatus::Published);
}

#[tokio::test]
async fn test_cancel_during_narration_stops_speech_retries() {
    let flag = CancellationFlag::new();
    let cancel_on_call = flag.clone();
    let speech = MockAdapter::responding("voice", Capability::Speech, move |_, _| {
        cancel_on_call.cancel();
        MockResponse::Error(server_error())
    });
    let h = harness(
        vec![writer(story_text(2))],
        vec![painter("painter", &[])],
        Some(vec![speech.clone()]),
        quick_config(),
    );

    let (observer, _events) = ChannelObserver::channel();
    let err = h
        .generator
        .generate_with(luna(2), &flag, &observer)
        .await
        .unwrap_err();

    assert_eq!(err.kind, GenerationErrorKind::Cancelled);
    assert_eq!(speech.call_count(), 1);
    assert!(h.repository.is_empty().await);
}

#[tokio::test]
async fn test_stage_events_are_ordered() {
    let h = harness(
        vec![writer(story_text(2))],
        vec![painter("painter", &[])],
        None,
        quick_config(),
    );
    let (observer, mut events) = ChannelObserver::channel();

    h.generator
        .generate_with(luna(2), &CancellationFlag::new(), &observer)
        .await
        .unwrap();

    let mut stages = Vec::new();
    let mut last_progress = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            GenerationEvent::StageChanged {
                stage, progress, ..
            } => {
                stages.push(stage);
                assert!(progress >= last_progress);
                last_progress = progress;
            }
            GenerationEvent::Progress { progress, .. } => {
                assert!(progress >= last_progress);
                last_progress = progress;
            }
            GenerationEvent::AssetFixed { .. } => {}
        }
    }
    assert_eq!(
        stages,
        vec![
            Stage::Preparing,
            Stage::Narrative,
            Stage::Cover,
            Stage::Illustrations,
            Stage::Complete
        ]
    );
    assert_eq!(last_progress, 100);
}
