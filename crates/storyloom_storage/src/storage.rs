//! Storage trait definition.

use crate::{ObjectMetadata, StoredObject};
use storyloom_error::StorageError;

/// Trait for pluggable durable storage backends.
///
/// Keys are relative, slash-separated paths chosen by the caller. Writing the
/// same key twice replaces the object, so uploads are idempotent per key.
/// There is no delete: durable assets outlive the stories that reference them.
#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Backend name for logs (e.g. "filesystem", "rest").
    fn backend(&self) -> &'static str;

    /// Store `data` under `key` and return its stable public URL.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::InvalidKey`](crate::StorageErrorKind::InvalidKey)
    /// for keys that escape the storage root, and a write or rejection error
    /// when the backend refuses the object.
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        metadata: &ObjectMetadata,
    ) -> Result<StoredObject, StorageError>;

    /// Check whether an object exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Read an object back.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::NotFound`](crate::StorageErrorKind::NotFound)
    /// when nothing is stored under `key`.
    async fn retrieve(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Public URL an object under `key` is served from.
    fn public_url(&self, key: &str) -> String;
}
