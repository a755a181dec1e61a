//! Downloading and decoding asset bytes.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use std::time::Duration;
use storyloom_error::{PersistenceError, PersistenceErrorKind};

/// Bytes of an asset and their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    /// Raw content
    pub data: Vec<u8>,
    /// MIME type, `application/octet-stream` when unknown
    pub mime_type: String,
}

/// Retrieves the bytes behind an ephemeral URL.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Download `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceErrorKind::Fetch`] error when the URL cannot be
    /// downloaded, which usually means it has already expired.
    async fn fetch(&self, url: &str) -> Result<FetchedAsset, PersistenceError>;
}

/// Fetcher over plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    client: Client,
}

impl HttpAssetFetcher {
    /// Create a fetcher with a per-download timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, PersistenceError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            PersistenceError::new(PersistenceErrorKind::Config(format!(
                "Failed to build HTTP client: {}",
                e
            )))
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedAsset, PersistenceError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            PersistenceError::new(PersistenceErrorKind::Fetch(format!("{}: {}", url, e)))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PersistenceError::new(PersistenceErrorKind::Fetch(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            ))));
        }

        let header_mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or_default().trim().to_string())
            .filter(|v| !v.is_empty() && v != "application/octet-stream");

        let data = response.bytes().await.map_err(|e| {
            PersistenceError::new(PersistenceErrorKind::Fetch(format!("{}: {}", url, e)))
        })?;
        if data.is_empty() {
            return Err(PersistenceError::new(PersistenceErrorKind::Fetch(format!(
                "empty body for {}",
                url
            ))));
        }

        let mime_type = header_mime.unwrap_or_else(|| mime_from_extension(url).to_string());
        tracing::debug!(size = data.len(), %mime_type, "Fetched asset");
        Ok(FetchedAsset {
            data: data.to_vec(),
            mime_type,
        })
    }
}

fn mime_from_extension(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        _ => "application/octet-stream",
    }
}

/// Decode a base64 `data:` URI.
///
/// # Examples
///
/// ```
/// use storyloom_assets::decode_data_uri;
///
/// let asset = decode_data_uri("data:image/png;base64,AQID").unwrap();
/// assert_eq!(asset.data, vec![1, 2, 3]);
/// assert_eq!(asset.mime_type, "image/png");
/// ```
///
/// # Errors
///
/// Returns a [`PersistenceErrorKind::Decode`] error for anything that is not
/// a base64 `data:` URI with a non-empty payload.
pub fn decode_data_uri(uri: &str) -> Result<FetchedAsset, PersistenceError> {
    let decode_error =
        |reason: &str| PersistenceError::new(PersistenceErrorKind::Decode(reason.to_string()));

    let uri = uri.trim();
    let rest = match uri.get(..5) {
        Some(scheme) if scheme.eq_ignore_ascii_case("data:") => &uri[5..],
        _ => return Err(decode_error("not a data URI")),
    };
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| decode_error("data URI has no payload"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| decode_error("data URI is not base64 encoded"))?;

    let data = STANDARD
        .decode(payload.trim())
        .map_err(|e| decode_error(&format!("invalid base64: {}", e)))?;
    if data.is_empty() {
        return Err(decode_error("data URI payload is empty"));
    }

    let mime_type = if mime.is_empty() {
        "application/octet-stream".to_string()
    } else {
        mime.to_string()
    };
    Ok(FetchedAsset { data, mime_type })
}
