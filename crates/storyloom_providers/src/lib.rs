//! Generative provider adapters and fallback chains for Storyloom.
//!
//! Every adapter implements [`ProviderAdapter`](storyloom_interface::ProviderAdapter)
//! and normalizes its provider's failures into
//! [`ProviderError`](storyloom_error::ProviderError). A [`FallbackChain`] tries
//! adapters for one capability strictly in order.
//!
//! # Available Adapters
//!
//! - **OpenAI-compatible chat** - [`OpenAiChatAdapter`]
//! - **OpenAI-compatible images** - [`OpenAiImageAdapter`]
//! - **OpenAI-compatible speech** - [`OpenAiSpeechAdapter`]
//! - **fal.ai images** - [`FalImageAdapter`]
//! - **ElevenLabs speech** - [`ElevenLabsSpeechAdapter`]
//! - **Scripted** - [`MockAdapter`], for tests and local development
//!
//! # Example
//!
//! ```no_run
//! use storyloom_config::StoryloomConfig;
//! use storyloom_core::{Capability, ImageRequest, ProviderRequest};
//! use storyloom_providers::{ProviderHealth, build_chain};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoryloomConfig::load()?;
//! let health = ProviderHealth::new();
//! let chain = build_chain(Capability::Image, &config.providers.image, &health)?;
//!
//! let request = ProviderRequest::from(ImageRequest {
//!     prompt: "a whale singing to the moon".to_string(),
//!     size: None,
//! });
//! let success = chain.execute(&request).await?;
//! println!("{} delivered {:?}", success.provider, success.asset);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chain;
mod elevenlabs;
mod factory;
mod fal;
mod health;
mod http;
mod metrics;
mod mock;
mod openai;
mod rate_limited;

pub use chain::{ChainSuccess, FallbackChain};
pub use elevenlabs::ElevenLabsSpeechAdapter;
pub use factory::{build_adapter, build_chain};
pub use fal::FalImageAdapter;
pub use health::ProviderHealth;
pub use http::HttpSettings;
pub use metrics::{ProviderMetrics, error_label};
pub use mock::{MockAdapter, MockBehavior, MockResponse};
pub use openai::{OpenAiChatAdapter, OpenAiImageAdapter, OpenAiSpeechAdapter};
pub use rate_limited::RateLimitedAdapter;
