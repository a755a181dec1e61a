//! Storyloom - illustrated, narrated children's stories
//!
//! Storyloom turns a handful of story parameters into a finished, published
//! story: a titled narrative split into pages, a cover, one illustration per
//! page, and optional narration. Every capability is served by an ordered
//! chain of providers, so one provider outage degrades to the next instead of
//! failing the story.
//!
//! Generated media usually arrives at short-lived provider URLs. The asset
//! layer copies it into durable object storage before a story is published,
//! repairs stories whose URLs stop loading, and sweeps the library for
//! leftovers.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use storyloom::{Storyloom, StoryParams, init_observability};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_observability()?;
//!     let storyloom = Storyloom::load()?;
//!
//!     let params = StoryParams::builder()
//!         .protagonist_name("Luna")
//!         .protagonist_age(6u8)
//!         .theme("space")
//!         .setting("a moon base")
//!         .style("crayon")
//!         .page_count(5usize)
//!         .build()?;
//!
//!     let story = storyloom.generate(params).await?;
//!     println!("Published {}", story.record().title);
//!     Ok(())
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `postgres` - PostgreSQL story store, chosen when the configured URL variable is set
//! - `observability` - OpenTelemetry span export alongside the log output
//!
//! # Architecture
//!
//! - `storyloom_error` - Error types
//! - `storyloom_core` - Story, page, asset, and request types
//! - `storyloom_interface` - Provider, repository, and observer traits
//! - `storyloom_config` - Layered TOML configuration
//! - `storyloom_rate_limit` - Request pacing and retry backoff
//! - `storyloom_providers` - Provider adapters and fallback chains
//! - `storyloom_storage` - Durable object storage
//! - `storyloom_cache` - Client-side asset cache
//! - `storyloom_assets` - Classification, migration, repair, and library sweep
//! - `storyloom_database` - Story persistence
//! - `storyloom_narrative` - The generation pipeline
//!
//! This crate re-exports the commonly used items and wires them together in
//! [`Storyloom`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod observability;
mod service;

pub use observability::{
    ObservabilityConfig, init_observability, init_observability_with_config,
    shutdown_observability,
};
pub use service::Storyloom;

pub use storyloom_assets::{
    AssetClassifier, ClassifierRules, LibrarySweep, MigrationService, RepairEngine, RepairRequest,
    SweepReport,
};
pub use storyloom_cache::ClientAssetCache;
pub use storyloom_config::*;
pub use storyloom_core::*;
pub use storyloom_database::InMemoryStoryRepository;
pub use storyloom_error::*;
pub use storyloom_interface::*;
pub use storyloom_narrative::{
    CancellationFlag, ChannelObserver, GeneratedStory, ProviderChains, StoryGenerator,
};
pub use storyloom_providers::{FallbackChain, ProviderHealth, build_chain};
pub use storyloom_rate_limit::{BackoffPolicy, RateLimiter};
pub use storyloom_storage::{ObjectStorage, storage_from_config};

#[cfg(feature = "postgres")]
pub use storyloom_database::PostgresStoryRepository;
