//! Backend selection from configuration.

use crate::{FileSystemStorage, ObjectStorage, RestObjectStorage};
use std::sync::Arc;
use storyloom_config::{StorageBackend, StorageConfig};
use storyloom_error::{ConfigError, StoryloomResult};

const DEFAULT_MEDIA_PATH: &str = "./storyloom-media";

/// Build the configured storage backend.
///
/// # Errors
///
/// Returns a [`ConfigError`] when `public_base_url` is not an absolute URL
/// with a host or when the REST backend lacks its endpoint or bucket or key.
/// Returns a storage error if the filesystem root cannot be created.
#[tracing::instrument(skip(config), fields(backend = ?config.backend))]
pub fn storage_from_config(config: &StorageConfig) -> StoryloomResult<Arc<dyn ObjectStorage>> {
    require_absolute_base(&config.public_base_url)?;
    match config.backend {
        StorageBackend::Filesystem => {
            let path = config.path.as_deref().unwrap_or(DEFAULT_MEDIA_PATH);
            let storage = FileSystemStorage::new(path, config.public_base_url.clone())?;
            Ok(Arc::new(storage))
        }
        StorageBackend::Rest => {
            let endpoint = config
                .endpoint
                .as_deref()
                .ok_or_else(|| ConfigError::new("storage.endpoint is required for rest"))?;
            let bucket = config
                .bucket
                .as_deref()
                .ok_or_else(|| ConfigError::new("storage.bucket is required for rest"))?;
            let key_env = config
                .api_key_env
                .as_deref()
                .ok_or_else(|| ConfigError::new("storage.api_key_env is required for rest"))?;
            let api_key = std::env::var(key_env)
                .map_err(|_| ConfigError::new(format!("{} is not set", key_env)))?;

            let storage =
                RestObjectStorage::new(endpoint, bucket, api_key, config.public_base_url.clone())?;
            Ok(Arc::new(storage))
        }
    }
}

// Stored URLs are classified by host, so a relative base would never read
// back as durable.
fn require_absolute_base(public_base_url: &str) -> Result<(), ConfigError> {
    match reqwest::Url::parse(public_base_url) {
        Ok(url) if url.host_str().is_some() => Ok(()),
        _ => Err(ConfigError::new(format!(
            "storage.public_base_url must be an absolute URL with a host, got '{}'",
            public_base_url
        ))),
    }
}
