//! Client-side asset cache for Storyloom.
//!
//! Ephemeral provider URLs can expire before migration finishes. The cache
//! keeps a copy of every fetched asset keyed by its original URL, so a failed
//! upload can still fall back to an inline copy instead of a dead link. It
//! also remembers when the library was last swept so repeated sweeps in one
//! session are skipped.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;

pub use cache::{CachedAsset, ClientAssetCache};
