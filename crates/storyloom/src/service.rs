//! Configuration-driven wiring of the whole pipeline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use storyloom_assets::{
    AssetClassifier, ClassifierRules, HttpAssetFetcher, LibrarySweep, MigrationService,
    RepairEngine, RepairRequest, SweepReport,
};
use storyloom_cache::ClientAssetCache;
use storyloom_config::StoryloomConfig;
use storyloom_core::{Capability, StoryParams, StoryRecord};
use storyloom_database::InMemoryStoryRepository;
use storyloom_error::{ConfigError, GenerationError, PersistenceError, StoryloomResult};
use storyloom_interface::{GenerationObserver, StoryRepository};
use storyloom_narrative::{CancellationFlag, GeneratedStory, ProviderChains, StoryGenerator};
use storyloom_providers::{ProviderHealth, build_chain};
use storyloom_storage::storage_from_config;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a host application needs, built from one configuration.
///
/// Cloning is cheap and clones share providers, storage, cache and store.
///
/// # Example
///
/// ```no_run
/// use storyloom::{Storyloom, StoryParams};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let storyloom = Storyloom::load()?;
/// let params = StoryParams::builder()
///     .protagonist_name("Luna")
///     .protagonist_age(6u8)
///     .theme("ocean")
///     .setting("a coral reef")
///     .style("watercolor")
///     .page_count(5usize)
///     .build()?;
///
/// let story = storyloom.generate(params).await?;
/// println!("{}: {}", story.record().id, story.record().title);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Storyloom {
    config: StoryloomConfig,
    health: ProviderHealth,
    migration: MigrationService,
    generator: StoryGenerator,
    sweep: LibrarySweep,
}

impl Storyloom {
    /// Read `.env`, load layered configuration, and wire everything.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails to load or cannot be wired.
    pub fn load() -> StoryloomResult<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "No .env file loaded");
        }
        let config = StoryloomConfig::load()?;
        Self::from_config(config)
    }

    /// Wire everything from `config`, choosing the story store from
    /// `database.url_env`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when no text provider is available, an
    /// adapter cannot serve its capability, or storage is misconfigured.
    pub fn from_config(config: StoryloomConfig) -> StoryloomResult<Self> {
        let repository = repository_from_config(&config)?;
        Self::with_repository(config, repository)
    }

    /// Wire everything from `config` around an existing story store.
    ///
    /// # Errors
    ///
    /// See [`Storyloom::from_config`].
    #[instrument(skip_all, fields(storage = ?config.storage.backend))]
    pub fn with_repository(
        config: StoryloomConfig,
        repository: Arc<dyn StoryRepository>,
    ) -> StoryloomResult<Self> {
        let health = ProviderHealth::new();
        let text = build_chain(Capability::Text, &config.providers.text, &health)?;
        if text.is_empty() {
            return Err(ConfigError::new(
                "No text provider available: set the API key variable of at least one providers.text entry",
            )
            .into());
        }
        let image = build_chain(Capability::Image, &config.providers.image, &health)?;
        if image.is_empty() {
            warn!("No image provider available, every illustration will be a placeholder");
        }
        let speech = build_chain(Capability::Speech, &config.providers.speech, &health)?;
        let speech = (!speech.is_empty()).then_some(speech);

        let storage = storage_from_config(&config.storage)?;
        let rules = ClassifierRules::from_config(&config.classifier)
            .with_durable_url(&config.storage.public_base_url);
        let fetcher = HttpAssetFetcher::new(FETCH_TIMEOUT)?;
        let migration = MigrationService::new(
            AssetClassifier::new(rules),
            Arc::new(fetcher),
            storage.clone(),
            repository,
            ClientAssetCache::from_config(&config.cache),
        );

        let generator = StoryGenerator::new(
            ProviderChains {
                text,
                image,
                speech,
            },
            migration.clone(),
            config.generation.clone(),
        );
        info!(
            backend = storage.backend(),
            narration = generator.narration_enabled(),
            "Storyloom ready"
        );

        Ok(Self {
            sweep: LibrarySweep::new(migration.clone()),
            config,
            health,
            migration,
            generator,
        })
    }

    /// Configuration in force.
    pub fn config(&self) -> &StoryloomConfig {
        &self.config
    }

    /// Last observed provider health, shared by every chain.
    pub fn health(&self) -> &ProviderHealth {
        &self.health
    }

    /// The story generator.
    pub fn generator(&self) -> &StoryGenerator {
        &self.generator
    }

    /// The migration service.
    pub fn migration(&self) -> &MigrationService {
        &self.migration
    }

    /// Generate and publish a story.
    ///
    /// # Errors
    ///
    /// See [`StoryGenerator::generate_with`].
    pub async fn generate(&self, params: StoryParams) -> Result<GeneratedStory, GenerationError> {
        self.generator.generate(params).await
    }

    /// Generate a story the caller can cancel and watch.
    ///
    /// # Errors
    ///
    /// See [`StoryGenerator::generate_with`].
    pub async fn generate_with(
        &self,
        params: StoryParams,
        cancel: &CancellationFlag,
        observer: &dyn GenerationObserver,
    ) -> Result<GeneratedStory, GenerationError> {
        self.generator.generate_with(params, cancel, observer).await
    }

    /// Fix URLs the rendering layer could not load.
    pub async fn repair(&self, request: &RepairRequest) -> HashMap<String, String> {
        RepairEngine::new(self.migration.clone()).repair(request).await
    }

    /// Fix URLs, reporting each fix to `observer`.
    pub async fn repair_observed(
        &self,
        request: &RepairRequest,
        observer: Arc<dyn GenerationObserver>,
    ) -> HashMap<String, String> {
        RepairEngine::new(self.migration.clone())
            .with_observer(observer)
            .repair(request)
            .await
    }

    /// Migrate leftovers across the stored library, at most once per window.
    pub async fn sweep(&self) -> SweepReport {
        self.sweep.run().await
    }

    /// Load a stored story.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn load_story(&self, id: Uuid) -> Result<StoryRecord, PersistenceError> {
        self.migration.repository().load_story(id).await
    }
}

#[cfg(feature = "postgres")]
fn repository_from_config(config: &StoryloomConfig) -> StoryloomResult<Arc<dyn StoryRepository>> {
    if std::env::var(&config.database.url_env).is_err() {
        info!(url_env = %config.database.url_env, "No database URL, using in-memory story store");
        return Ok(Arc::new(InMemoryStoryRepository::new()));
    }
    let mut conn = storyloom_database::establish_connection(&config.database)?;
    storyloom_database::run_migrations(&mut conn)?;
    info!("Using PostgreSQL story store");
    Ok(Arc::new(storyloom_database::PostgresStoryRepository::new(conn)))
}

#[cfg(not(feature = "postgres"))]
fn repository_from_config(config: &StoryloomConfig) -> StoryloomResult<Arc<dyn StoryRepository>> {
    info!(url_env = %config.database.url_env, "Using in-memory story store");
    Ok(Arc::new(InMemoryStoryRepository::new()))
}
