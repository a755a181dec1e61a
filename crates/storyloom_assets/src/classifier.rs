//! URL classification.

use crate::ClassifierRules;
use reqwest::Url;
use storyloom_core::{AssetClass, AssetReference};

/// Pure classifier over an explicit rule table.
///
/// Rules apply in order, first match wins:
///
/// 1. `data:` URI → inline data
/// 2. durable host → durable
/// 3. ephemeral host, or a signed-URL marker in the query → ephemeral
/// 4. placeholder path prefix → placeholder
/// 5. anything else → ephemeral
///
/// Unknown hosts are treated as ephemeral because an unknown URL may expire.
///
/// # Examples
///
/// ```
/// use storyloom_assets::{AssetClassifier, ClassifierRules, HostPattern};
/// use storyloom_core::AssetClass;
///
/// let classifier = AssetClassifier::new(ClassifierRules {
///     durable_hosts: vec![HostPattern::parse("*.storyloom.app")],
///     ephemeral_hosts: vec![HostPattern::parse("fal.media")],
///     ephemeral_markers: vec!["sig=".to_string()],
///     placeholder_prefix: "/placeholders/".to_string(),
/// });
///
/// assert_eq!(classifier.classify("https://cdn.storyloom.app/a.png"), AssetClass::Durable);
/// assert_eq!(classifier.classify("https://fal.media/files/a.png"), AssetClass::Ephemeral);
/// assert_eq!(classifier.classify("data:image/png;base64,AA=="), AssetClass::InlineData);
/// assert_eq!(classifier.classify("/placeholders/ocean.png"), AssetClass::Placeholder);
/// assert_eq!(classifier.classify("https://unknown.example/a.png"), AssetClass::Ephemeral);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetClassifier {
    rules: ClassifierRules,
}

impl AssetClassifier {
    /// Create a classifier.
    pub fn new(rules: ClassifierRules) -> Self {
        Self { rules }
    }

    /// The rule table.
    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    /// Classify a URL.
    pub fn classify(&self, url: &str) -> AssetClass {
        let url = url.trim();
        if url
            .get(..5)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
        {
            return AssetClass::InlineData;
        }

        let (host, path, query) = match Url::parse(url) {
            Ok(parsed) => (
                parsed.host_str().map(str::to_string),
                parsed.path().to_string(),
                parsed.query().unwrap_or_default().to_string(),
            ),
            Err(_) => {
                let (path, query) = url.split_once('?').unwrap_or((url, ""));
                (None, path.to_string(), query.to_string())
            }
        };

        if let Some(host) = host.as_deref() {
            if self.rules.is_durable_host(host) {
                return AssetClass::Durable;
            }
            if self.rules.is_ephemeral_host(host) {
                return AssetClass::Ephemeral;
            }
        }
        if self.rules.has_ephemeral_marker(&query) {
            return AssetClass::Ephemeral;
        }
        if !self.rules.placeholder_prefix.is_empty()
            && path.starts_with(&self.rules.placeholder_prefix)
        {
            return AssetClass::Placeholder;
        }
        AssetClass::Ephemeral
    }

    /// Classify a URL into a reference.
    pub fn reference(&self, url: &str) -> AssetReference {
        AssetReference::new(url, self.classify(url))
    }

    /// Placeholder image for a theme.
    ///
    /// ```
    /// use storyloom_assets::{AssetClassifier, ClassifierRules};
    ///
    /// let classifier = AssetClassifier::new(ClassifierRules {
    ///     placeholder_prefix: "/placeholders/".to_string(),
    ///     ..Default::default()
    /// });
    /// assert_eq!(classifier.placeholder_for("Deep Ocean!"), "/placeholders/deep-ocean.png");
    /// assert_eq!(classifier.placeholder_for(""), "/placeholders/default.png");
    /// ```
    pub fn placeholder_for(&self, theme: &str) -> String {
        format!("{}{}.png", self.rules.placeholder_prefix, theme_slug(theme))
    }
}

/// Lowercase, dash-separated form of a theme, `default` when empty.
pub fn theme_slug(theme: &str) -> String {
    let mut slug = String::with_capacity(theme.len());
    for c in theme.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "default".to_string()
    } else {
        slug.to_string()
    }
}
