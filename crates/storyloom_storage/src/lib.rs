//! Durable object storage for Storyloom media.
//!
//! Stories reference their images and narration by public URL. This crate
//! owns the storage those URLs point at: objects are written under
//! caller-chosen, path-like keys and served from a stable public prefix.
//!
//! # Backends
//!
//! - **Filesystem** - [`FileSystemStorage`], a local directory served by a
//!   static file server
//! - **REST** - [`RestObjectStorage`], a Supabase-style `object/{bucket}/{key}`
//!   API
//!
//! # Example
//!
//! ```rust
//! use storyloom_storage::{FileSystemStorage, MediaType, ObjectMetadata, ObjectStorage};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = FileSystemStorage::new("/tmp/storyloom-media", "http://localhost:8080/media")?;
//! let metadata = ObjectMetadata::new(MediaType::Image, "image/png");
//!
//! let stored = storage
//!     .upload("stories/42/cover-1700000000000.png", &[0u8; 64], &metadata)
//!     .await?;
//! assert_eq!(
//!     stored.public_url,
//!     "http://localhost:8080/media/stories/42/cover-1700000000000.png"
//! );
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod factory;
mod filesystem;
mod key;
mod media_type;
mod object;
mod rest;
mod storage;

pub use factory::storage_from_config;
pub use filesystem::FileSystemStorage;
pub use key::validate_key;
pub use media_type::MediaType;
pub use object::{ObjectMetadata, StoredObject, content_hash};
pub use rest::RestObjectStorage;
pub use storage::ObjectStorage;
pub use storyloom_error::{StorageError, StorageErrorKind};
