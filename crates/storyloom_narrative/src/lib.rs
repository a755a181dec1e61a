//! Story generation pipeline for Storyloom.
//!
//! [`StoryGenerator`] drives the fixed pipeline:
//!
//! ```text
//! preparing → narrative → cover → illustrations → narration (optional) → complete
//! ```
//!
//! Each stage calls one [`FallbackChain`](storyloom_providers::FallbackChain),
//! makes what it gets durable through the
//! [`MigrationService`](storyloom_assets::MigrationService), and reports
//! progress to a [`GenerationObserver`](storyloom_interface::GenerationObserver).
//! A single failed illustration never aborts a story: it becomes the themed
//! placeholder. Only a missing story text, or too many placeholders, fails the
//! attempt.
//!
//! # Features
//!
//! - **Narrative parsing**: [`parse_narrative`] always yields the requested page count
//! - **Prompt building**: [`prompts`] for text, cover, page, and narration calls
//! - **Cancellation**: [`CancellationFlag`], checked before every stage and page
//! - **Channel observer**: [`ChannelObserver`] streams typed events over tokio mpsc

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cancel;
mod generator;
mod observer;
mod parser;
pub mod prompts;

pub use cancel::CancellationFlag;
pub use generator::{GeneratedStory, ProviderChains, StoryGenerator};
pub use observer::ChannelObserver;
pub use parser::{NarrativeParser, ParsedNarrative, parse_narrative};
