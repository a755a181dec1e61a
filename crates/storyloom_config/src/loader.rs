//! Top-level configuration and layered loading.

use crate::{
    CacheConfig, ClassifierConfig, DatabaseConfig, GenerationConfig, ProvidersConfig,
    StorageConfig,
};
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Serialize};
use std::path::Path;
use storyloom_error::{ConfigError, StoryloomResult};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../storyloom.toml");

/// Top-level Storyloom configuration.
///
/// # Example
///
/// ```no_run
/// use storyloom_config::StoryloomConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = StoryloomConfig::load()?;
/// println!("max pages: {}", config.generation.max_pages);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct StoryloomConfig {
    /// Adapter chains per capability
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Durable storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Asset classification rules
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Pipeline limits
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Client asset cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Relational store
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl StoryloomConfig {
    /// Load configuration with precedence: env > current dir > home dir > bundled.
    ///
    /// User config files are optional and silently skipped if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if any present source fails to parse.
    #[instrument]
    pub fn load() -> StoryloomResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled");

        let mut builder = Self::bundled_builder();

        if let Some(config_dir) = dirs::config_dir() {
            let home_config = config_dir.join("storyloom/storyloom.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("storyloom").required(false))
            .add_source(
                Environment::with_prefix("STORYLOOM")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::finish(builder)
    }

    /// Load only the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled file is malformed.
    pub fn bundled() -> StoryloomResult<Self> {
        Self::finish(Self::bundled_builder())
    }

    /// Load the bundled defaults overlaid with one file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn with_override_file(path: impl AsRef<Path>) -> StoryloomResult<Self> {
        debug!("Loading configuration override");
        let builder = Self::bundled_builder().add_source(File::from(path.as_ref()));
        Self::finish(builder)
    }

    /// Parse a complete configuration from TOML text, without defaults layered in.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse.
    pub fn from_toml_str(text: &str) -> StoryloomResult<Self> {
        Self::finish(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    fn bundled_builder() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> StoryloomResult<Self> {
        let config = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AdapterKind, StorageBackend};

    #[test]
    fn test_bundled_defaults_parse() {
        let config = StoryloomConfig::bundled().unwrap();
        assert_eq!(config.generation.max_pages, 20);
        assert_eq!(config.generation.cover_regenerations, 2);
        assert_eq!(config.generation.illustration_retry_budget, 3);
        assert_eq!(config.generation.placeholder_ceiling, None);
        assert_eq!(config.storage.backend, StorageBackend::Filesystem);
        assert_eq!(config.classifier.placeholder_prefix, "/placeholders/");
        assert_eq!(config.providers.text[0].kind, AdapterKind::OpenaiChat);
        assert!(!config.providers.speech.is_empty());
    }

    #[test]
    fn test_sections_default_when_missing() {
        let config = StoryloomConfig::from_toml_str("[generation]\nmax_pages = 8\n").unwrap();
        assert_eq!(config.generation.max_pages, 8);
        assert_eq!(config.generation.narration_retries, 3);
        assert!(config.providers.text.is_empty());
        assert!(config.cache.enabled);
        assert_eq!(config.database.url_env, "DATABASE_URL");
    }

    #[test]
    fn test_unknown_adapter_kind_is_rejected() {
        let text = r#"
            [[providers.text]]
            name = "mystery"
            kind = "carrier_pigeon"
        "#;
        assert!(StoryloomConfig::from_toml_str(text).is_err());
    }
}
