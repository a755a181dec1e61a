//! Durable object storage error types.

/// Kinds of object storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create a storage directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write an object
    #[display("Failed to write object: {}", _0)]
    Write(String),
    /// Failed to read an object back
    #[display("Failed to read object: {}", _0)]
    Read(String),
    /// No object stored under the key
    #[display("Object not found: {}", _0)]
    NotFound(String),
    /// Key escapes the storage root or is otherwise malformed
    #[display("Invalid object key: {}", _0)]
    InvalidKey(String),
    /// Remote object store rejected the upload
    #[display("Upload rejected with status {}: {}", status, message)]
    Rejected {
        /// HTTP status returned by the store
        status: u16,
        /// Response body
        message: String,
    },
    /// Remote object store could not be reached
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use storyloom_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("stories/abc/cover.png".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new StorageError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
