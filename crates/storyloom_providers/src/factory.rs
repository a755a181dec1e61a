//! Building adapters and chains from configuration.

use crate::elevenlabs::ELEVENLABS_BASE_URL;
use crate::fal::FAL_BASE_URL;
use crate::openai::OPENAI_BASE_URL;
use crate::{
    ElevenLabsSpeechAdapter, FalImageAdapter, FallbackChain, HttpSettings, MockAdapter,
    OpenAiChatAdapter, OpenAiImageAdapter, OpenAiSpeechAdapter, ProviderHealth,
    RateLimitedAdapter,
};
use std::sync::Arc;
use storyloom_config::{AdapterConfig, AdapterKind};
use storyloom_core::Capability;
use storyloom_error::{ConfigError, StoryloomResult};
use storyloom_interface::ProviderAdapter;
use storyloom_rate_limit::RateLimiter;
use tracing::{debug, info, instrument, warn};

fn kind_capability(kind: AdapterKind) -> Option<Capability> {
    match kind {
        AdapterKind::OpenaiChat => Some(Capability::Text),
        AdapterKind::OpenaiImage | AdapterKind::FalImage => Some(Capability::Image),
        AdapterKind::ElevenlabsSpeech | AdapterKind::OpenaiSpeech => Some(Capability::Speech),
        AdapterKind::Mock => None,
    }
}

/// Build one adapter, wrapped in its rate limiter.
///
/// Returns `Ok(None)` when the adapter's API key variable is unset or empty.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the adapter kind cannot serve `capability`.
#[instrument(skip(config), fields(adapter = %config.name, kind = %config.kind))]
pub fn build_adapter(
    capability: Capability,
    config: &AdapterConfig,
) -> StoryloomResult<Option<Arc<dyn ProviderAdapter>>> {
    if let Some(served) = kind_capability(config.kind)
        && served != capability
    {
        return Err(ConfigError::new(format!(
            "Adapter {} ({}) cannot serve {} requests",
            config.name, config.kind, capability
        ))
        .into());
    }

    let api_key = match &config.api_key_env {
        Some(var) => match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Some(key),
            _ => {
                debug!(env = %var, "API key not set, skipping adapter");
                return Ok(None);
            }
        },
        None => None,
    };

    let adapter: Arc<dyn ProviderAdapter> = match config.kind {
        AdapterKind::OpenaiChat => Arc::new(OpenAiChatAdapter::new(HttpSettings::from_config(
            config,
            api_key,
            OPENAI_BASE_URL,
        ))?),
        AdapterKind::OpenaiImage => Arc::new(OpenAiImageAdapter::new(HttpSettings::from_config(
            config,
            api_key,
            OPENAI_BASE_URL,
        ))?),
        AdapterKind::OpenaiSpeech => Arc::new(OpenAiSpeechAdapter::new(
            HttpSettings::from_config(config, api_key, OPENAI_BASE_URL),
        )?),
        AdapterKind::FalImage => Arc::new(FalImageAdapter::new(HttpSettings::from_config(
            config,
            api_key,
            FAL_BASE_URL,
        ))?),
        AdapterKind::ElevenlabsSpeech => Arc::new(ElevenLabsSpeechAdapter::new(
            HttpSettings::from_config(config, api_key, ELEVENLABS_BASE_URL),
        )?),
        AdapterKind::Mock => {
            let mock = MockAdapter::canned(config.name.clone(), capability);
            match &config.api_key_env {
                Some(var) => Arc::new(mock.with_credential(var.clone())),
                None => Arc::new(mock),
            }
        }
    };

    let limiter = RateLimiter::new(config.requests_per_minute, config.max_concurrent);
    Ok(Some(Arc::new(RateLimitedAdapter::new(adapter, limiter))))
}

/// Build the fallback chain for one capability.
///
/// Adapters whose keys are missing are left out. An empty chain is not an
/// error; callers decide what an empty chain means.
///
/// # Errors
///
/// Returns a [`ConfigError`] for an adapter that cannot serve `capability`.
#[instrument(skip(configs, health), fields(configured = configs.len()))]
pub fn build_chain(
    capability: Capability,
    configs: &[AdapterConfig],
    health: &ProviderHealth,
) -> StoryloomResult<FallbackChain> {
    let mut adapters = Vec::with_capacity(configs.len());
    for config in configs {
        if let Some(adapter) = build_adapter(capability, config)? {
            adapters.push(adapter);
        }
    }

    if adapters.is_empty() && !configs.is_empty() {
        warn!(%capability, "No adapters available, all keys missing");
    }
    let chain = FallbackChain::new(capability, adapters, health.clone());
    info!(%capability, providers = ?chain.provider_names(), "Built fallback chain");
    Ok(chain)
}
