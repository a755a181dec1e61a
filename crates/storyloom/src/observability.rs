//! Logging and tracing setup for host applications.

use std::env;
use storyloom_error::{ConfigError, StoryloomResult};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "observability")]
use opentelemetry::{KeyValue, global, trace::TracerProvider};
#[cfg(feature = "observability")]
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};

/// How logs and spans are emitted.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name attached to exported spans
    pub service_name: String,
    /// Service version attached to exported spans
    pub service_version: String,
    /// Filter used when `RUST_LOG` is unset, e.g. `info` or `storyloom_assets=debug`
    pub log_level: String,
    /// One JSON object per line instead of human-readable text
    pub json_logs: bool,
}

impl ObservabilityConfig {
    /// Defaults for `service_name`, reading the level from `RUST_LOG`.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            json_logs: false,
        }
    }

    /// Set the service version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Set the fallback filter.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable JSON-formatted logs.
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"))
    }
}

/// Install the global subscriber with default settings.
///
/// # Errors
///
/// See [`init_observability_with_config`].
pub fn init_observability() -> StoryloomResult<()> {
    init_observability_with_config(ObservabilityConfig::default())
}

/// Install the global subscriber.
///
/// Logs go to stdout as text or JSON. With the `observability` feature,
/// spans are also exported through OpenTelemetry's stdout exporter.
///
/// # Errors
///
/// Returns a [`ConfigError`] for an unparseable filter, or when a global
/// subscriber is already installed.
pub fn init_observability_with_config(config: ObservabilityConfig) -> StoryloomResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| ConfigError::new(format!("Invalid log filter '{}': {}", config.log_level, e)))?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .boxed()
    };

    let registry = tracing_subscriber::registry().with(env_filter).with(fmt_layer);

    #[cfg(feature = "observability")]
    let registry = {
        let resource = Resource::builder()
            .with_service_name(config.service_name.clone())
            .with_attributes(vec![KeyValue::new(
                "service.version",
                config.service_version.clone(),
            )])
            .build();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .with_resource(resource)
            .build();
        global::set_tracer_provider(provider.clone());
        let tracer = provider.tracer(config.service_name.clone());
        registry.with(tracing_opentelemetry::layer().with_tracer(tracer))
    };

    registry
        .try_init()
        .map_err(|e| ConfigError::new(format!("Tracing subscriber already installed: {}", e)))?;

    tracing::debug!(
        service = %config.service_name,
        version = %config.service_version,
        json = config.json_logs,
        "Observability initialized"
    );
    Ok(())
}

/// Flush exported spans before exit.
///
/// The stdout exporter flushes when its provider drops, so this only
/// exists to give hosts a stable shutdown hook.
pub fn shutdown_observability() {}
