//! Object metadata and upload results.

use crate::MediaType;
use sha2::{Digest, Sha256};

/// Metadata sent alongside an upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectMetadata {
    /// Image or audio
    pub media_type: MediaType,
    /// MIME type (e.g., "image/png", "audio/mpeg")
    pub mime_type: String,
}

impl ObjectMetadata {
    /// Create metadata.
    pub fn new(media_type: MediaType, mime_type: impl Into<String>) -> Self {
        Self {
            media_type,
            mime_type: mime_type.into(),
        }
    }

    /// Metadata with the media type inferred from the MIME type.
    pub fn from_mime(mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        Self {
            media_type: MediaType::from_mime(&mime_type),
            mime_type,
        }
    }
}

/// A successfully stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredObject {
    /// Key the object was stored under
    pub key: String,
    /// Stable public URL
    pub public_url: String,
    /// SHA-256 of the content, hex encoded
    pub content_hash: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Image or audio
    pub media_type: MediaType,
    /// MIME type
    pub mime_type: String,
}

impl StoredObject {
    pub(crate) fn new(key: &str, public_url: String, data: &[u8], metadata: &ObjectMetadata) -> Self {
        Self {
            key: key.to_string(),
            public_url,
            content_hash: content_hash(data),
            size_bytes: data.len() as u64,
            media_type: metadata.media_type,
            mime_type: metadata.mime_type.clone(),
        }
    }
}

/// Compute the hex SHA-256 of `data`.
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
