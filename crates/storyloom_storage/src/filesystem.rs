//! Filesystem-based object storage.
//!
//! Objects live at `{base_path}/{key}` and are expected to be served by a
//! static file server mounted at the public base URL.

use crate::{ObjectMetadata, ObjectStorage, StoredObject, validate_key};
use std::path::{Path, PathBuf};
use storyloom_error::{StorageError, StorageErrorKind};

/// Filesystem storage backend.
///
/// # Example Structure
///
/// ```text
/// ./storyloom-media/
/// └── stories/
///     └── 9b2f.../
///         ├── cover-1700000000000.png
///         ├── page-0-image-1700000001000.png
///         └── page-0-narration-1700000002000.mp3
/// ```
///
/// Writes go to a temp file that is renamed into place, so readers never see
/// a partial object.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    base_path: PathBuf,
    public_base_url: String,
}

impl FileSystemStorage {
    /// Create a new filesystem storage backend.
    ///
    /// Creates the base directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(base_path, public_base_url))]
    pub fn new(
        base_path: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Created filesystem storage");
        Ok(Self {
            base_path,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Root directory.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }
}

#[async_trait::async_trait]
impl ObjectStorage for FileSystemStorage {
    fn backend(&self) -> &'static str {
        "filesystem"
    }

    #[tracing::instrument(skip(self, data, metadata), fields(size = data.len(), media_type = %metadata.media_type))]
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        metadata: &ObjectMetadata,
    ) -> Result<StoredObject, StorageError> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::Write(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::Write(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        let stored = StoredObject::new(key, self.public_url(key), data, metadata);
        tracing::info!(
            key,
            hash = %stored.content_hash,
            size = data.len(),
            "Stored object"
        );
        Ok(stored)
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }

    #[tracing::instrument(skip(self))]
    async fn retrieve(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;

        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(key.to_string()))
            } else {
                StorageError::new(StorageErrorKind::Read(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        tracing::debug!(key, size = data.len(), "Retrieved object");
        Ok(data)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
