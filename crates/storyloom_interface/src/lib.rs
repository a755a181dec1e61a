//! Trait definitions for the Storyloom story generation pipeline.
//!
//! This crate provides the seams between the generator and everything it
//! talks to: generative providers, the story store, and whoever is watching
//! progress.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{GenerationObserver, NoopObserver, ProviderAdapter, StoryRepository};
pub use types::{GenerationEvent, ProviderStatus};
