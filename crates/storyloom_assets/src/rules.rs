//! Classification rule table.

use storyloom_config::ClassifierConfig;

/// A host name pattern: an exact name or a `*.suffix` wildcard.
///
/// # Examples
///
/// ```
/// use storyloom_assets::HostPattern;
///
/// let pattern = HostPattern::parse("*.fal.media");
/// assert!(pattern.matches("v3.fal.media"));
/// assert!(!pattern.matches("fal.media"));
/// assert!(HostPattern::parse("fal.media").matches("FAL.media"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostPattern {
    /// Matches one host name
    Exact(String),
    /// Matches any subdomain of the suffix, not the suffix itself
    Suffix(String),
}

impl HostPattern {
    /// Parse a pattern from configuration.
    pub fn parse(pattern: &str) -> Self {
        let pattern = pattern.trim().to_ascii_lowercase();
        match pattern.strip_prefix("*.") {
            Some(suffix) => HostPattern::Suffix(suffix.to_string()),
            None => HostPattern::Exact(pattern),
        }
    }

    /// Whether `host` matches.
    pub fn matches(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        match self {
            HostPattern::Exact(name) => host == *name,
            HostPattern::Suffix(suffix) => host
                .strip_suffix(suffix.as_str())
                .is_some_and(|rest| rest.len() > 1 && rest.ends_with('.')),
        }
    }
}

/// Explicit rules the classifier applies, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassifierRules {
    /// Hosts the system controls
    pub durable_hosts: Vec<HostPattern>,
    /// Hosts known to expire their URLs
    pub ephemeral_hosts: Vec<HostPattern>,
    /// Query parameter prefixes that mark a short-lived signed URL
    pub ephemeral_markers: Vec<String>,
    /// Path prefix of the bundled placeholder images
    pub placeholder_prefix: String,
}

impl ClassifierRules {
    /// Build rules from configuration.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            durable_hosts: config.durable_hosts.iter().map(|h| HostPattern::parse(h)).collect(),
            ephemeral_hosts: config
                .ephemeral_hosts
                .iter()
                .map(|h| HostPattern::parse(h))
                .collect(),
            ephemeral_markers: config.ephemeral_markers.clone(),
            placeholder_prefix: config.placeholder_prefix.clone(),
        }
    }

    /// Add a durable host, typically the storage backend's public host.
    pub fn with_durable_host(mut self, host: &str) -> Self {
        let pattern = HostPattern::parse(host);
        if !self.durable_hosts.contains(&pattern) {
            self.durable_hosts.push(pattern);
        }
        self
    }

    /// Add the host of `url` as durable. URLs without a host change nothing.
    pub fn with_durable_url(self, url: &str) -> Self {
        let host = reqwest::Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_string));
        match host {
            Some(host) => self.with_durable_host(&host),
            None => self,
        }
    }

    pub(crate) fn is_durable_host(&self, host: &str) -> bool {
        self.durable_hosts.iter().any(|p| p.matches(host))
    }

    pub(crate) fn is_ephemeral_host(&self, host: &str) -> bool {
        self.ephemeral_hosts.iter().any(|p| p.matches(host))
    }

    pub(crate) fn has_ephemeral_marker(&self, query: &str) -> bool {
        query.split('&').any(|param| {
            self.ephemeral_markers
                .iter()
                .any(|marker| !marker.is_empty() && param.starts_with(marker.as_str()))
        })
    }
}
