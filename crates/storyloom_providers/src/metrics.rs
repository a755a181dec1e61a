//! Metrics for provider calls.
//!
//! Provides OpenTelemetry-based metrics for tracking provider latency and
//! failures. Without an installed meter provider these are no-ops.

use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::OnceLock;
use storyloom_core::Capability;
use storyloom_error::ProviderErrorKind;

static METRICS: OnceLock<ProviderMetrics> = OnceLock::new();

/// Metrics for provider calls, labeled by provider and capability.
#[derive(Clone)]
pub struct ProviderMetrics {
    /// Meter handle kept alive for metric instruments
    _meter: Meter,
    /// Successful provider calls
    pub requests: Counter<u64>,
    /// Failed provider calls
    pub errors: Counter<u64>,
    /// Provider call duration in seconds
    pub duration: Histogram<f64>,
    /// Chains where every adapter failed
    pub exhausted: Counter<u64>,
}

impl ProviderMetrics {
    fn init() -> Self {
        let meter = global::meter("storyloom_providers");

        Self {
            _meter: meter.clone(),
            requests: meter
                .u64_counter("provider.requests")
                .with_description("Successful provider calls")
                .build(),
            errors: meter
                .u64_counter("provider.errors")
                .with_description("Failed provider calls")
                .build(),
            duration: meter
                .f64_histogram("provider.duration")
                .with_unit("seconds")
                .with_description("Provider call duration")
                .build(),
            exhausted: meter
                .u64_counter("provider.chain.exhausted")
                .with_description("Fallback chains where every adapter failed")
                .build(),
        }
    }

    /// Get the global provider metrics instance.
    pub fn get() -> &'static Self {
        METRICS.get_or_init(Self::init)
    }

    /// Record a successful call.
    pub fn record_request(&self, provider: &str, capability: Capability, duration_secs: f64) {
        let labels = &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("capability", capability.to_string()),
        ];
        self.requests.add(1, labels);
        self.duration.record(duration_secs, labels);
    }

    /// Record a failed call.
    pub fn record_error(&self, provider: &str, capability: Capability, kind: &ProviderErrorKind) {
        let labels = &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("capability", capability.to_string()),
            KeyValue::new("error_type", error_label(kind)),
        ];
        self.errors.add(1, labels);
    }

    /// Record a chain that ran out of adapters.
    pub fn record_exhausted(&self, capability: Capability) {
        self.exhausted
            .add(1, &[KeyValue::new("capability", capability.to_string())]);
    }
}

/// Classify error type for metrics labeling.
///
/// Returns one of: "timeout", "auth", "rate_limit", "server", "invalid_response"
pub fn error_label(kind: &ProviderErrorKind) -> &'static str {
    match kind {
        ProviderErrorKind::Timeout { .. } => "timeout",
        ProviderErrorKind::Unauthorized(_) => "auth",
        ProviderErrorKind::RateLimited { .. } => "rate_limit",
        ProviderErrorKind::ServerError { .. } => "server",
        ProviderErrorKind::InvalidResponse(_) => "invalid_response",
    }
}
