//! Asset cache implementation.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use storyloom_config::CacheConfig;

/// Cached copy of a fetched asset.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct CachedAsset {
    data: Vec<u8>,
    mime_type: String,
    cached_at: DateTime<Utc>,
}

impl CachedAsset {
    /// Render the asset as a `data:` URI.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CachedAsset>,
    last_swept: Option<DateTime<Utc>>,
}

/// Shared, session-scoped asset cache.
///
/// Cloning is cheap and clones share state. There is no eviction; the cache
/// lives as long as the session.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use storyloom_cache::ClientAssetCache;
///
/// let cache = ClientAssetCache::new(true, Duration::from_secs(3600));
/// cache.insert("https://fal.media/files/a.png", vec![1, 2, 3], "image/png");
///
/// let uri = cache.data_uri("https://fal.media/files/a.png").unwrap();
/// assert_eq!(uri, "data:image/png;base64,AQID");
///
/// assert!(!cache.recently_swept());
/// assert!(cache.try_mark_swept());
/// assert!(cache.recently_swept());
/// ```
#[derive(Debug, Clone)]
pub struct ClientAssetCache {
    state: Arc<RwLock<CacheState>>,
    enabled: bool,
    sweep_window: Duration,
}

impl ClientAssetCache {
    /// Create a cache.
    pub fn new(enabled: bool, sweep_window: Duration) -> Self {
        tracing::debug!(enabled, sweep_window = ?sweep_window, "Creating asset cache");
        Self {
            state: Arc::new(RwLock::new(CacheState::default())),
            enabled,
            sweep_window,
        }
    }

    /// Create a cache from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.enabled, Duration::from_secs(config.sweep_window_secs))
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether inserts are kept.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Cache a copy of the asset fetched from `url`.
    #[tracing::instrument(skip(self, data, mime_type), fields(size = data.len()))]
    pub fn insert(&self, url: &str, data: Vec<u8>, mime_type: impl Into<String>) {
        if !self.enabled {
            tracing::debug!("Cache disabled, skipping insert");
            return;
        }
        let asset = CachedAsset {
            data,
            mime_type: mime_type.into(),
            cached_at: Utc::now(),
        };
        self.write().entries.insert(url.to_string(), asset);
    }

    /// Cached copy for `url`, if any.
    pub fn get(&self, url: &str) -> Option<CachedAsset> {
        self.read().entries.get(url).cloned()
    }

    /// Cached copy for `url` as a `data:` URI.
    pub fn data_uri(&self, url: &str) -> Option<String> {
        self.read().entries.get(url).map(CachedAsset::data_uri)
    }

    /// Whether `url` is cached.
    pub fn contains(&self, url: &str) -> bool {
        self.read().entries.contains_key(url)
    }

    /// Drop the cached copy for `url`.
    pub fn remove(&self, url: &str) -> Option<CachedAsset> {
        self.write().entries.remove(url)
    }

    /// Number of cached assets.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    /// Clear all cached assets. The sweep timestamp is kept.
    pub fn clear(&self) {
        let mut state = self.write();
        let count = state.entries.len();
        state.entries.clear();
        tracing::info!(cleared = count, "Cleared asset cache");
    }

    /// When the library was last swept this session.
    pub fn last_swept(&self) -> Option<DateTime<Utc>> {
        self.read().last_swept
    }

    /// Whether a sweep finished inside the sweep window.
    pub fn recently_swept(&self) -> bool {
        self.swept_within(Utc::now())
    }

    fn swept_within(&self, now: DateTime<Utc>) -> bool {
        let Some(last) = self.read().last_swept else {
            return false;
        };
        (now - last)
            .to_std()
            .map(|elapsed| elapsed < self.sweep_window)
            .unwrap_or(true)
    }

    /// Claim the sweep window.
    ///
    /// Returns `false` when a sweep already claimed it. The check and the
    /// timestamp update happen under one write lock, so concurrent callers
    /// see exactly one `true` per window.
    pub fn try_mark_swept(&self) -> bool {
        let now = Utc::now();
        let mut state = self.write();
        let claimed = state.last_swept.is_none_or(|last| {
            (now - last)
                .to_std()
                .is_ok_and(|elapsed| elapsed >= self.sweep_window)
        });
        if claimed {
            state.last_swept = Some(now);
        }
        claimed
    }
}

impl Default for ClientAssetCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let cache = ClientAssetCache::default();
        let other = cache.clone();

        other.insert("https://x/a.mp3", vec![9], "audio/mpeg");

        let asset = cache.get("https://x/a.mp3").unwrap();
        assert_eq!(asset.data(), &vec![9]);
        assert_eq!(asset.mime_type(), "audio/mpeg");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_disabled_cache_keeps_nothing() {
        let cache = ClientAssetCache::new(false, Duration::from_secs(60));
        cache.insert("https://x/a.png", vec![1], "image/png");
        assert!(cache.is_empty());
        assert!(cache.data_uri("https://x/a.png").is_none());
    }

    #[test]
    fn test_sweep_window_expires() {
        let cache = ClientAssetCache::new(true, Duration::from_secs(3600));
        assert!(cache.try_mark_swept());

        let later = Utc::now() + chrono::Duration::seconds(3601);
        assert!(cache.recently_swept());
        assert!(!cache.swept_within(later));
    }

    #[test]
    fn test_sweep_window_is_claimed_once() {
        let cache = ClientAssetCache::new(true, Duration::from_secs(3600));
        let other = cache.clone();

        assert!(cache.try_mark_swept());
        assert!(!other.try_mark_swept());
        assert!(cache.recently_swept());
    }

    #[test]
    fn test_expired_window_can_be_claimed_again() {
        let cache = ClientAssetCache::new(true, Duration::ZERO);
        assert!(cache.try_mark_swept());
        assert!(cache.try_mark_swept());
    }

    #[test]
    fn test_clear_keeps_sweep_timestamp() {
        let cache = ClientAssetCache::default();
        cache.insert("https://x/a.png", vec![1], "image/png");
        assert!(cache.try_mark_swept());
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.last_swept().is_some());
    }
}
