//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use storyloom_error::{GenerationError, GenerationErrorKind};

/// Shared flag the caller sets to abandon a generation.
///
/// Clones share the flag. The generator checks it before every stage and
/// every page, and again after each provider call returns.
///
/// # Examples
///
/// ```
/// use storyloom_narrative::CancellationFlag;
///
/// let flag = CancellationFlag::new();
/// let handle = flag.clone();
/// assert!(flag.check().is_ok());
///
/// handle.cancel();
/// assert!(flag.is_cancelled());
/// assert!(flag.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// A flag that is not set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the generation to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fail with `Cancelled` once the flag is set.
    #[track_caller]
    pub fn check(&self) -> Result<(), GenerationError> {
        if self.is_cancelled() {
            Err(GenerationError::new(GenerationErrorKind::Cancelled))
        } else {
            Ok(())
        }
    }
}
