//! Top-level error wrapper types.

use crate::{
    AggregateError, ConfigError, GenerationError, ParseError, PersistenceError, ProviderError,
    StorageError,
};

/// Every error the Storyloom crates can produce.
///
/// # Examples
///
/// ```
/// use storyloom_error::{StoryloomError, StorageError, StorageErrorKind};
///
/// let storage_err = StorageError::new(StorageErrorKind::Unavailable("bucket offline".into()));
/// let err: StoryloomError = storage_err.into();
/// assert!(format!("{}", err).contains("Storage Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum StoryloomErrorKind {
    /// Single provider call failed
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Whole fallback chain failed
    #[from(AggregateError)]
    Aggregate(AggregateError),
    /// Asset or record persistence failed
    #[from(PersistenceError)]
    Persistence(PersistenceError),
    /// Object storage failed
    #[from(StorageError)]
    Storage(StorageError),
    /// Narrative parse failed
    #[from(ParseError)]
    Parse(ParseError),
    /// Generation aborted
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Storyloom error with kind discrimination.
///
/// # Examples
///
/// ```
/// use storyloom_error::{ConfigError, StoryloomResult};
///
/// fn might_fail() -> StoryloomResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Storyloom Error: {}", _0)]
pub struct StoryloomError(Box<StoryloomErrorKind>);

impl StoryloomError {
    /// Create a new error from a kind.
    pub fn new(kind: StoryloomErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StoryloomErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to StoryloomErrorKind
impl<T> From<T> for StoryloomError
where
    T: Into<StoryloomErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Storyloom operations.
pub type StoryloomResult<T> = std::result::Result<T, StoryloomError>;
