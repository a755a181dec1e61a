//! The fixed story pipeline: text, cover, page illustrations, narration.

use crate::{CancellationFlag, ParsedNarrative, parse_narrative, prompts};
use std::sync::Arc;
use std::time::Duration;
use storyloom_assets::{MigrationContext, MigrationService};
use storyloom_config::GenerationConfig;
use storyloom_core::{
    AssetClass, AssetSlot, Capability, PageRecord, ProviderRequest, Stage, StoryDraft,
    StoryParams, StoryRecord,
};
use storyloom_error::{
    AggregateError, GenerationError, GenerationErrorKind, ParseError, PersistenceError,
    RetryableError,
};
use storyloom_interface::{GenerationObserver, NoopObserver};
use storyloom_providers::FallbackChain;
use storyloom_rate_limit::{BackoffPolicy, RateLimiter};
use tracing::{debug, error, info, instrument, warn};

/// One fallback chain per capability.
///
/// Narration is skipped when `speech` is absent or empty.
#[derive(Clone)]
pub struct ProviderChains {
    /// Story text
    pub text: FallbackChain,
    /// Cover and page illustrations
    pub image: FallbackChain,
    /// Page narration
    pub speech: Option<FallbackChain>,
}

/// A finished generation.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct GeneratedStory {
    /// The record as stored, or as it would have been stored
    record: StoryRecord,
    /// Whether the record reached the repository
    persisted: bool,
    /// Indices of pages illustrated with the themed placeholder
    placeholder_pages: Vec<usize>,
    /// Slots still holding a non-durable reference
    unresolved: Vec<AssetSlot>,
    /// Problems the narrative parser recovered from
    parse_issues: Vec<ParseError>,
    /// Persistence failure, when the record could not be stored
    persistence_error: Option<PersistenceError>,
}

/// Drives one story through every stage and hands it to the migration
/// service for publishing.
///
/// Each asset is made durable as soon as it is generated, so an expiring
/// provider URL is never held longer than one stage.
///
/// # Example
///
/// ```no_run
/// use storyloom_core::StoryParams;
/// use storyloom_narrative::StoryGenerator;
///
/// # async fn example(generator: StoryGenerator) -> Result<(), Box<dyn std::error::Error>> {
/// let params = StoryParams::builder()
///     .protagonist_name("Luna")
///     .protagonist_age(6u8)
///     .theme("ocean")
///     .setting("a coral reef")
///     .style("watercolor")
///     .page_count(5usize)
///     .build()?;
///
/// let story = generator.generate(params).await?;
/// println!("{} ({} pages)", story.record().title, story.record().pages.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct StoryGenerator {
    chains: ProviderChains,
    migration: MigrationService,
    config: GenerationConfig,
    observer: Arc<dyn GenerationObserver>,
}

impl StoryGenerator {
    /// Create a generator reporting to no one.
    pub fn new(chains: ProviderChains, migration: MigrationService, config: GenerationConfig) -> Self {
        Self {
            chains,
            migration,
            config,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Report progress to `observer` by default.
    pub fn with_observer(mut self, observer: Arc<dyn GenerationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Limits in force.
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Whether the narration stage will run.
    pub fn narration_enabled(&self) -> bool {
        self.chains
            .speech
            .as_ref()
            .is_some_and(|chain| !chain.is_empty())
    }

    /// Generate a story that cannot be cancelled.
    ///
    /// # Errors
    ///
    /// See [`StoryGenerator::generate_with`].
    pub async fn generate(&self, params: StoryParams) -> Result<GeneratedStory, GenerationError> {
        self.generate_with(params, &CancellationFlag::new(), self.observer.as_ref())
            .await
    }

    /// Generate a story, honouring `cancel` and reporting to `observer`.
    ///
    /// # Errors
    ///
    /// - `InvalidParameters` before any provider is called
    /// - `NarrativeUnavailable` when no text provider produced a story
    /// - `AttemptCeilingExceeded` when too many pages fell back to placeholders
    /// - `Cancelled` when `cancel` was set; nothing is persisted
    #[instrument(
        skip(self, params, cancel, observer),
        fields(
            protagonist = %params.protagonist_name(),
            theme = %params.theme(),
            pages = params.page_count()
        )
    )]
    pub async fn generate_with(
        &self,
        params: StoryParams,
        cancel: &CancellationFlag,
        observer: &dyn GenerationObserver,
    ) -> Result<GeneratedStory, GenerationError> {
        let mut draft = StoryDraft::new(params);
        let mut run = Run {
            generator: self,
            draft: &mut draft,
            cancel,
            observer,
        };

        match run.execute().await {
            Ok(story) => Ok(story),
            Err(e) => {
                let draft_id = *draft.id();
                let stage = *draft.stage();
                if draft.advance(Stage::Error).is_err() {
                    debug!(%stage, "Draft already terminal");
                }
                observer.on_stage_change(Stage::Error, 0, Stage::Error.label());
                match e.kind {
                    GenerationErrorKind::Cancelled => {
                        info!(story_id = %draft_id, %stage, "Generation cancelled")
                    }
                    _ => error!(story_id = %draft_id, %stage, error = %e, "Generation failed"),
                }
                Err(e)
            }
        }
    }
}

// State borrowed for one call to `generate_with`.
struct Run<'a> {
    generator: &'a StoryGenerator,
    draft: &'a mut StoryDraft,
    cancel: &'a CancellationFlag,
    observer: &'a dyn GenerationObserver,
}

impl Run<'_> {
    async fn execute(&mut self) -> Result<GeneratedStory, GenerationError> {
        let generator = self.generator;
        let config = &generator.config;
        self.observer
            .on_stage_change(Stage::Preparing, 0, Stage::Preparing.label());
        self.draft.params().validate(config.max_pages)?;
        let params = self.draft.params().clone();
        let story_id = *self.draft.id();
        info!(%story_id, "Starting generation");

        let narrative = self.narrative(&params).await?;
        let cover = self.cover(&params, &narrative.title).await?;
        let (pages, cover_url, placeholder_pages) =
            self.illustrations(&params, &narrative, cover).await?;

        if let Some(ceiling) = config.placeholder_ceiling
            && placeholder_pages.len() > ceiling
        {
            return Err(GenerationError::new(
                GenerationErrorKind::AttemptCeilingExceeded {
                    placeholders: placeholder_pages.len(),
                    ceiling,
                },
            ));
        }

        let pages = if generator.narration_enabled() {
            self.narration(&params, pages).await?
        } else {
            debug!("No speech providers configured, skipping narration");
            pages
        };

        self.cancel.check()?;
        let record = StoryRecord {
            title: narrative.title.clone(),
            cover_url,
            pages,
            theme: params.theme().clone(),
            setting: params.setting().clone(),
            style: params.style().clone(),
            language: params.language().clone(),
            voice_id: self.voice(&params),
            ..StoryRecord::new(story_id, narrative.title.clone())
        };
        let published = generator.migration.publish(record).await;

        self.enter(Stage::Complete)?;
        info!(
            %story_id,
            status = %published.record.status,
            placeholders = placeholder_pages.len(),
            persisted = published.persisted,
            "Story complete"
        );

        Ok(GeneratedStory {
            record: published.record,
            persisted: published.persisted,
            placeholder_pages,
            unresolved: published.unresolved,
            parse_issues: narrative.issues,
            persistence_error: published.error,
        })
    }

    fn enter(&mut self, stage: Stage) -> Result<(), GenerationError> {
        self.draft.advance(stage)?;
        info!(%stage, progress = *self.draft.progress(), "Entering stage");
        self.observer
            .on_stage_change(stage, *self.draft.progress(), stage.label());
        Ok(())
    }

    fn progress(&mut self, stage: Stage, done: usize, total: usize) {
        self.draft.set_progress(stage.progress_at(done, total));
        self.observer
            .on_progress(*self.draft.progress(), stage.label());
    }

    async fn narrative(&mut self, params: &StoryParams) -> Result<ParsedNarrative, GenerationError> {
        self.cancel.check()?;
        self.enter(Stage::Narrative)?;

        let request = ProviderRequest::from(prompts::narrative_request(params));
        let result = self.generator.chains.text.execute(&request).await;
        self.cancel.check()?;

        let success = result.map_err(|e| {
            for failure in &e.failures {
                self.draft.record_failure(
                    Stage::Narrative,
                    Capability::Text,
                    failure.provider.clone(),
                    failure.error.kind.to_string(),
                );
            }
            GenerationError::new(GenerationErrorKind::NarrativeUnavailable(e.to_string()))
        })?;

        let text = match success.asset.as_text() {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                return Err(GenerationError::new(
                    GenerationErrorKind::NarrativeUnavailable(format!(
                        "{} returned no story text",
                        success.provider
                    )),
                ));
            }
        };

        let parsed = parse_narrative(text, *params.page_count(), params.protagonist_name());
        for issue in &parsed.issues {
            debug!(issue = %issue.kind, "Recovered from narrative parse problem");
        }
        info!(
            provider = %success.provider,
            title = %parsed.title,
            padded = parsed.padded_pages,
            "Story text ready"
        );
        self.progress(Stage::Narrative, 1, 1);
        Ok(parsed)
    }

    // Returns the migrated cover, or None when every attempt failed.
    async fn cover(
        &mut self,
        params: &StoryParams,
        title: &str,
    ) -> Result<Option<String>, GenerationError> {
        self.cancel.check()?;
        self.enter(Stage::Cover)?;

        let request = ProviderRequest::from(prompts::cover_request(params, title));
        let attempts = self.generator.config.cover_regenerations + 1;
        for attempt in 1..=attempts {
            self.cancel.check()?;
            let url = self.image(&request, Stage::Cover).await;
            self.cancel.check()?;
            if let Some(url) = url {
                let context = MigrationContext::for_slot(
                    *self.draft.id(),
                    AssetSlot::Cover,
                    params.theme().clone(),
                );
                let durable = self.migrate(&url, &context).await?;
                self.progress(Stage::Cover, 1, 1);
                return Ok(Some(durable));
            }
            warn!(attempt, attempts, "Cover illustration failed");
        }
        Ok(None)
    }

    async fn illustrations(
        &mut self,
        params: &StoryParams,
        narrative: &ParsedNarrative,
        mut cover: Option<String>,
    ) -> Result<(Vec<PageRecord>, String, Vec<usize>), GenerationError> {
        self.cancel.check()?;
        self.enter(Stage::Illustrations)?;

        let budget = self.generator.config.illustration_retry_budget;
        let placeholder = self
            .generator
            .migration
            .classifier()
            .placeholder_for(params.theme());
        let total = narrative.pages.len();
        let mut pages = Vec::with_capacity(total);
        let mut placeholder_pages = Vec::new();
        let mut failures = 0;
        let mut index = 0;

        while index < total {
            self.cancel.check()?;
            let text = &narrative.pages[index];
            let request = ProviderRequest::from(prompts::page_request(params, index, text));
            let url = self.image(&request, Stage::Illustrations).await;
            self.cancel.check()?;

            let image_url = match url {
                Some(url) => {
                    let context = MigrationContext::for_slot(
                        *self.draft.id(),
                        AssetSlot::PageImage(index),
                        params.theme().clone(),
                    );
                    self.migrate(&url, &context).await?
                }
                None => {
                    failures += 1;
                    if failures < budget {
                        warn!(page = index, failures, budget, "Page illustration failed, retrying");
                        continue;
                    }
                    warn!(page = index, failures, budget, "Illustration budget spent, using placeholder");
                    placeholder_pages.push(index);
                    placeholder.clone()
                }
            };

            if index == 0 && cover.is_none() {
                let borrowed = if placeholder_pages.contains(&0) {
                    placeholder.clone()
                } else {
                    image_url.clone()
                };
                info!(cover = %borrowed, "Using first page for the cover");
                cover = Some(borrowed);
            }

            pages.push(PageRecord {
                index,
                text: text.clone(),
                image_url,
                narration_url: None,
            });
            index += 1;
            self.progress(Stage::Illustrations, index, total);
        }

        let cover = cover.unwrap_or(placeholder);
        Ok((pages, cover, placeholder_pages))
    }

    async fn narration(
        &mut self,
        params: &StoryParams,
        mut pages: Vec<PageRecord>,
    ) -> Result<Vec<PageRecord>, GenerationError> {
        let Some(chain) = self.generator.chains.speech.clone() else {
            return Ok(pages);
        };
        self.cancel.check()?;
        self.enter(Stage::Narration)?;

        let config = &self.generator.config;
        let pacer = RateLimiter::paced(Duration::from_millis(config.narration_delay_ms.max(1)))
            .map_err(|e| {
                GenerationError::new(GenerationErrorKind::InvalidParameters(e.to_string()))
            })?;
        let backoff = BackoffPolicy::new(
            Duration::from_millis(config.narration_backoff_ms),
            Duration::from_secs(config.narration_max_backoff_secs),
            config.narration_retries,
        );
        let voice = self.voice(params);
        let total = pages.len();
        let (pacer, chain, cancel) = (&pacer, &chain, self.cancel);

        for page in pages.iter_mut() {
            self.cancel.check()?;
            let request =
                ProviderRequest::from(prompts::narration_request(&page.text, voice.as_deref()));

            let request = &request;
            let result = backoff
                .retry_if(
                    || async move {
                        // An empty failure list is never retried.
                        if cancel.is_cancelled() {
                            return Err(AggregateError::new(
                                Capability::Speech.to_string(),
                                Vec::new(),
                            ));
                        }
                        let _slot = pacer.acquire().await;
                        chain.execute(request).await
                    },
                    |e: &AggregateError| !cancel.is_cancelled() && e.is_retryable(),
                )
                .await;
            self.cancel.check()?;

            match result.map(|success| success.asset.into_url()) {
                Ok(Some(url)) => {
                    let context = MigrationContext::for_slot(
                        *self.draft.id(),
                        AssetSlot::PageNarration(page.index),
                        params.theme().clone(),
                    );
                    let outcome = self.generator.migration.ensure_durable(&url, &context).await;
                    if outcome.reference.class == AssetClass::Placeholder {
                        warn!(page = page.index, "Narration could not be stored, dropping it");
                    } else {
                        page.narration_url = Some(outcome.reference.url);
                    }
                }
                Ok(None) => warn!(page = page.index, "Speech provider returned no audio"),
                Err(e) => {
                    for failure in &e.failures {
                        self.draft.record_failure(
                            Stage::Narration,
                            Capability::Speech,
                            failure.provider.clone(),
                            failure.error.kind.to_string(),
                        );
                    }
                    warn!(page = page.index, error = %e, "Narration failed, page stays silent");
                }
            }
            self.progress(Stage::Narration, page.index + 1, total);
        }
        Ok(pages)
    }

    // One chain execution for an image. Failures are recorded on the draft.
    async fn image(&mut self, request: &ProviderRequest, stage: Stage) -> Option<String> {
        match self.generator.chains.image.execute(request).await {
            Ok(success) => {
                let url = success.asset.into_url();
                if url.is_none() {
                    self.draft.record_failure(
                        stage,
                        Capability::Image,
                        success.provider,
                        "image provider returned text",
                    );
                }
                url
            }
            Err(e) => {
                for failure in &e.failures {
                    self.draft.record_failure(
                        stage,
                        Capability::Image,
                        failure.provider.clone(),
                        failure.error.kind.to_string(),
                    );
                }
                None
            }
        }
    }

    async fn migrate(
        &mut self,
        url: &str,
        context: &MigrationContext,
    ) -> Result<String, GenerationError> {
        self.cancel.check()?;
        let outcome = self.generator.migration.ensure_durable(url, context).await;
        if outcome.status.is_failure() {
            warn!(slot = ?context.slot, status = %outcome.status, "Asset kept a fallback reference");
        }
        Ok(outcome.reference.url)
    }

    fn voice(&self, params: &StoryParams) -> Option<String> {
        params
            .voice_id()
            .clone()
            .or_else(|| self.generator.config.default_voice.clone())
    }
}
