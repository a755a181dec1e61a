//! Storage, classifier, generation, cache, and database sections.

use serde::{Deserialize, Serialize};

/// Durable storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Local directory served at `public_base_url`
    #[default]
    Filesystem,
    /// REST object store (Supabase-style `object/{bucket}/{key}`)
    Rest,
}

/// Where durable assets are written.
///
/// # Example
///
/// ```toml
/// [storage]
/// backend = "rest"
/// endpoint = "https://xyz.supabase.co/storage/v1"
/// bucket = "stories"
/// api_key_env = "SUPABASE_SERVICE_KEY"
/// public_base_url = "https://xyz.supabase.co/storage/v1/object/public/stories"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct StorageConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: StorageBackend,

    /// Root directory for the filesystem backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Public URL prefix under which stored keys are served
    #[serde(default)]
    pub public_base_url: String,

    /// REST store API root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// REST store bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    /// Environment variable holding the REST store key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

/// Rule table for asset classification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct ClassifierConfig {
    /// Hosts we control; exact names or `*.suffix` wildcards
    #[serde(default)]
    pub durable_hosts: Vec<String>,

    /// Hosts known to expire their URLs
    #[serde(default)]
    pub ephemeral_hosts: Vec<String>,

    /// Query fragments that mark a short-lived signed URL
    #[serde(default)]
    pub ephemeral_markers: Vec<String>,

    /// Path prefix of the bundled placeholder images
    #[serde(default = "default_placeholder_prefix")]
    pub placeholder_prefix: String,
}

fn default_placeholder_prefix() -> String {
    "/placeholders/".to_string()
}

/// Generation pipeline limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Largest page count accepted
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Extra cover attempts after the first
    #[serde(default = "default_cover_regenerations")]
    pub cover_regenerations: u32,

    /// Failed page illustrations tolerated per story before placeholders
    #[serde(default = "default_illustration_retry_budget")]
    pub illustration_retry_budget: u32,

    /// Placeholder pages tolerated before the attempt fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_ceiling: Option<usize>,

    /// Pause between narration requests
    #[serde(default = "default_narration_delay_ms")]
    pub narration_delay_ms: u64,

    /// Retries per narration page
    #[serde(default = "default_narration_retries")]
    pub narration_retries: usize,

    /// First narration backoff
    #[serde(default = "default_narration_backoff_ms")]
    pub narration_backoff_ms: u64,

    /// Narration backoff cap
    #[serde(default = "default_narration_max_backoff_secs")]
    pub narration_max_backoff_secs: u64,

    /// Voice used when the caller names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_voice: Option<String>,
}

fn default_max_pages() -> usize {
    20
}

fn default_cover_regenerations() -> u32 {
    2
}

fn default_illustration_retry_budget() -> u32 {
    3
}

fn default_narration_delay_ms() -> u64 {
    1000
}

fn default_narration_retries() -> usize {
    3
}

fn default_narration_backoff_ms() -> u64 {
    500
}

fn default_narration_max_backoff_secs() -> u64 {
    8
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            cover_regenerations: default_cover_regenerations(),
            illustration_retry_budget: default_illustration_retry_budget(),
            placeholder_ceiling: None,
            narration_delay_ms: default_narration_delay_ms(),
            narration_retries: default_narration_retries(),
            narration_backoff_ms: default_narration_backoff_ms(),
            narration_max_backoff_secs: default_narration_max_backoff_secs(),
            default_voice: None,
        }
    }
}

/// Client asset cache.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Whether fetched assets are cached
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Library sweeps inside this window are skipped
    #[serde(default = "default_sweep_window_secs")]
    pub sweep_window_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_sweep_window_secs() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            sweep_window_secs: default_sweep_window_secs(),
        }
    }
}

/// Relational store connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Environment variable holding the connection URL. In-memory when unset.
    #[serde(default = "default_url_env")]
    pub url_env: String,
}

fn default_url_env() -> String {
    "DATABASE_URL".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url_env: default_url_env(),
        }
    }
}
