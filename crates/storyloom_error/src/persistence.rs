//! Asset persistence error types.

/// Kinds of failures while making an asset durable or saving a record.
///
/// The migration service absorbs all of these into a fallback reference;
/// they surface only in logs and in repository calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PersistenceErrorKind {
    /// Downloading the asset bytes failed
    #[display("Failed to fetch asset: {}", _0)]
    Fetch(String),
    /// Inline data could not be decoded
    #[display("Failed to decode inline asset: {}", _0)]
    Decode(String),
    /// Durable storage rejected the upload
    #[display("Failed to upload asset: {}", _0)]
    Upload(String),
    /// Story store read or write failed
    #[display("Database error: {}", _0)]
    Database(String),
    /// Story does not exist
    #[display("Story not found: {}", _0)]
    NotFound(String),
    /// Store is misconfigured
    #[display("Invalid configuration: {}", _0)]
    Config(String),
}

/// Persistence error with location tracking.
///
/// # Examples
///
/// ```
/// use storyloom_error::{PersistenceError, PersistenceErrorKind};
///
/// let err = PersistenceError::new(PersistenceErrorKind::Fetch("HTTP 410".to_string()));
/// assert!(format!("{}", err).contains("fetch"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Persistence Error: {} at line {} in {}", kind, line, file)]
pub struct PersistenceError {
    /// The kind of error that occurred
    pub kind: PersistenceErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PersistenceError {
    /// Create a new PersistenceError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PersistenceErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl From<crate::StorageError> for PersistenceError {
    #[track_caller]
    fn from(err: crate::StorageError) -> Self {
        PersistenceError::new(PersistenceErrorKind::Upload(err.kind.to_string()))
    }
}

#[cfg(feature = "database")]
impl From<diesel::result::Error> for PersistenceError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => {
                PersistenceError::new(PersistenceErrorKind::NotFound(err.to_string()))
            }
            other => PersistenceError::new(PersistenceErrorKind::Database(other.to_string())),
        }
    }
}

#[cfg(feature = "database")]
impl From<diesel::ConnectionError> for PersistenceError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        PersistenceError::new(PersistenceErrorKind::Database(format!(
            "Connection failed: {}",
            err
        )))
    }
}
