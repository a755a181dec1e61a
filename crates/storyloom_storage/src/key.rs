//! Object key validation.

use storyloom_error::{StorageError, StorageErrorKind};

/// Reject keys that are empty, absolute, or climb out of the storage root.
///
/// # Examples
///
/// ```
/// use storyloom_storage::validate_key;
///
/// assert!(validate_key("stories/1/cover-17.png").is_ok());
/// assert!(validate_key("../etc/passwd").is_err());
/// assert!(validate_key("/stories/1/cover.png").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if invalid {
        return Err(StorageError::new(StorageErrorKind::InvalidKey(
            key.to_string(),
        )));
    }
    Ok(())
}
