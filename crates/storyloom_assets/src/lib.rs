//! Asset lifecycle for Storyloom: classification, migration, and repair.
//!
//! Providers hand back URLs that stop working after minutes or hours. This
//! crate decides which URLs are at risk ([`AssetClassifier`]), copies at-risk
//! assets into durable storage ([`MigrationService`]), sweeps the stored
//! library for leftovers ([`LibrarySweep`]), and fixes broken references on
//! demand when the rendering layer reports them ([`RepairEngine`]).
//!
//! Failures here never break a story. Every operation degrades to the best
//! reference still available: a cached inline copy, the original URL, or a
//! themed placeholder.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod classifier;
mod fetcher;
mod migration;
mod repair;
mod rules;
mod sweep;

pub use classifier::{AssetClassifier, theme_slug};
pub use fetcher::{AssetFetcher, FetchedAsset, HttpAssetFetcher, decode_data_uri};
pub use migration::{
    MigrationContext, MigrationOutcome, MigrationService, MigrationStatus, PublishOutcome,
};
pub use repair::{CACHE_BUST_PARAM, RepairEngine, RepairRequest};
pub use rules::{ClassifierRules, HostPattern};
pub use sweep::{LibrarySweep, SweepReport};
