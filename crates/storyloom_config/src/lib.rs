//! Layered configuration for Storyloom.
//!
//! The configuration system supports:
//! - Bundled defaults (include_str! from storyloom.toml)
//! - User overrides (~/.config/storyloom/storyloom.toml, then ./storyloom.toml)
//! - Environment overrides (`STORYLOOM__GENERATION__MAX_PAGES=10`)
//!
//! Later sources override earlier ones key by key. Arrays such as adapter
//! lists are replaced whole.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod loader;
mod providers;
mod sections;

pub use loader::StoryloomConfig;
pub use providers::{AdapterConfig, AdapterKind, ProvidersConfig};
pub use sections::{
    CacheConfig, ClassifierConfig, DatabaseConfig, GenerationConfig, StorageBackend,
    StorageConfig,
};
