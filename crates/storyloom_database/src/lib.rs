//! Relational story metadata for Storyloom.
//!
//! Stories and their pages live in a relational store; the media they point
//! at lives in object storage. Two [`StoryRepository`] implementations are
//! provided:
//!
//! - [`InMemoryStoryRepository`] - HashMap-backed, for tests and local runs
//! - `PostgresStoryRepository` - Diesel over PostgreSQL, behind the
//!   `postgres` feature
//!
//! Writes are idempotent upserts by story id plus single-slot patches, so the
//! last writer wins.
//!
//! [`StoryRepository`]: storyloom_interface::StoryRepository

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod in_memory;

#[cfg(feature = "postgres")]
mod connection;
#[cfg(feature = "postgres")]
mod models;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "postgres")]
pub mod schema;

pub use in_memory::InMemoryStoryRepository;

#[cfg(feature = "postgres")]
pub use connection::{establish_connection, run_migrations};
#[cfg(feature = "postgres")]
pub use models::{PageRow, StoryRow};
#[cfg(feature = "postgres")]
pub use postgres::PostgresStoryRepository;
