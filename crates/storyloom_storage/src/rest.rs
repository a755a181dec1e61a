//! REST object store backend.

use crate::{ObjectMetadata, ObjectStorage, StoredObject, validate_key};
use reqwest::{Client, StatusCode};
use storyloom_error::{StorageError, StorageErrorKind};

/// Object store reached over a Supabase-style REST API.
///
/// Uploads `POST {endpoint}/object/{bucket}/{key}` with `x-upsert: true`, so
/// re-uploading a key overwrites it. Objects are served from
/// `{public_base_url}/{key}`.
#[derive(Debug, Clone)]
pub struct RestObjectStorage {
    client: Client,
    endpoint: String,
    bucket: String,
    api_key: String,
    public_base_url: String,
}

impl RestObjectStorage {
    /// Create the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        api_key: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let client = Client::builder().build().map_err(|e| {
            StorageError::new(StorageErrorKind::Unavailable(format!(
                "Failed to build HTTP client: {}",
                e
            )))
        })?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            api_key: api_key.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/object/{}/{}", self.endpoint, self.bucket, key)
    }

    fn unavailable(error: reqwest::Error) -> StorageError {
        StorageError::new(StorageErrorKind::Unavailable(error.to_string()))
    }
}

#[async_trait::async_trait]
impl ObjectStorage for RestObjectStorage {
    fn backend(&self) -> &'static str {
        "rest"
    }

    #[tracing::instrument(skip(self, data, metadata), fields(size = data.len(), bucket = %self.bucket))]
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        metadata: &ObjectMetadata,
    ) -> Result<StoredObject, StorageError> {
        validate_key(key)?;

        let response = self
            .client
            .post(self.object_url(key))
            .bearer_auth(&self.api_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, &metadata.mime_type)
            .body(data.to_vec())
            .send()
            .await
            .map_err(Self::unavailable)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(key, status = status.as_u16(), "Object store rejected upload");
            return Err(StorageError::new(StorageErrorKind::Rejected {
                status: status.as_u16(),
                message,
            }));
        }

        let stored = StoredObject::new(key, self.public_url(key), data, metadata);
        tracing::info!(key, hash = %stored.content_hash, size = data.len(), "Uploaded object");
        Ok(stored)
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        let response = self
            .client
            .head(self.public_url(key))
            .send()
            .await
            .map_err(Self::unavailable)?;
        Ok(response.status().is_success())
    }

    #[tracing::instrument(skip(self))]
    async fn retrieve(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(key)?;
        let response = self
            .client
            .get(self.object_url(key))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(Self::unavailable)?;

        match response.status() {
            status if status.is_success() => {
                let bytes = response.bytes().await.map_err(|e| {
                    StorageError::new(StorageErrorKind::Read(e.to_string()))
                })?;
                Ok(bytes.to_vec())
            }
            StatusCode::NOT_FOUND => Err(StorageError::new(StorageErrorKind::NotFound(
                key.to_string(),
            ))),
            status => Err(StorageError::new(StorageErrorKind::Read(format!(
                "HTTP {} for {}",
                status.as_u16(),
                key
            )))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
