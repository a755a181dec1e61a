//! Errors that reach the caller of story generation.

/// Terminal generation failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GenerationErrorKind {
    /// Every text provider failed, so no story could be written
    #[display("Narrative unavailable: {}", _0)]
    NarrativeUnavailable(String),
    /// Too many page illustrations fell back to placeholders
    #[display("{} placeholders exceed ceiling of {}", placeholders, ceiling)]
    AttemptCeilingExceeded {
        /// Placeholders produced
        placeholders: usize,
        /// Configured ceiling
        ceiling: usize,
    },
    /// The caller abandoned the request
    #[display("Generation cancelled")]
    Cancelled,
    /// Story parameters failed validation
    #[display("Invalid story parameters: {}", _0)]
    InvalidParameters(String),
    /// A stage transition went backwards
    #[display("Invalid stage transition from {} to {}", from, to)]
    InvalidTransition {
        /// Current stage label
        from: String,
        /// Requested stage label
        to: String,
    },
}

/// Generation error with location tracking.
///
/// # Examples
///
/// ```
/// use storyloom_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::Cancelled);
/// assert!(!err.is_retryable());
///
/// let err = GenerationError::new(GenerationErrorKind::NarrativeUnavailable(
///     "all text providers failed".to_string(),
/// ));
/// assert!(err.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The kind of error that occurred
    pub kind: GenerationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether asking again might succeed.
    ///
    /// Provider outages and placeholder ceilings are transient. Cancellation
    /// and bad parameters are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            GenerationErrorKind::NarrativeUnavailable(_)
                | GenerationErrorKind::AttemptCeilingExceeded { .. }
        )
    }
}
