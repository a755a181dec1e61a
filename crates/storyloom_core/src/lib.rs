//! Core data types for the Storyloom story generation pipeline.
//!
//! This crate provides the data model shared by every other Storyloom crate:
//! what the caller asks for, what providers are asked for and return, and
//! what ends up in the story store.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod asset;
mod capability;
mod draft;
mod params;
mod request;
mod role;
mod stage;
mod story;

pub use asset::{AssetClass, AssetReference, AssetSlot, RawAsset};
pub use capability::Capability;
pub use draft::{GenerationAttempt, StoryDraft};
pub use params::{ReadingLevel, StoryParams, StoryParamsBuilder};
pub use request::{ImageRequest, Message, ProviderRequest, SpeechRequest, TextRequest};
pub use role::Role;
pub use stage::Stage;
pub use story::{PageRecord, StoryRecord, StoryStatus};
