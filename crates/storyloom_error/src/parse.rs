//! Narrative parse error types.

/// Ways a raw narrative can fail to yield pages.
///
/// The parser recovers from every one of these by padding, truncating, or
/// falling back to paragraph splitting. The kinds are kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ParseErrorKind {
    /// No title line was found
    #[display("Narrative has no title line")]
    MissingTitle,
    /// No `Page N` markers were found
    #[display("Narrative has no page markers")]
    MissingPageMarkers,
    /// Fewer pages than requested
    #[display("Expected {} pages, found {}", expected, found)]
    TooFewPages {
        /// Requested page count
        expected: usize,
        /// Pages actually found
        found: usize,
    },
    /// More pages than requested
    #[display("Expected {} pages, found {}", expected, found)]
    TooManyPages {
        /// Requested page count
        expected: usize,
        /// Pages actually found
        found: usize,
    },
    /// A page body was empty after cleanup
    #[display("Page {} is empty", _0)]
    EmptyPage(usize),
    /// A parser pattern failed to compile
    #[display("Invalid parser pattern: {}", _0)]
    InvalidPattern(String),
}

/// Parse error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Parse Error: {} at line {} in {}", kind, line, file)]
pub struct ParseError {
    /// The kind of error that occurred
    pub kind: ParseErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ParseError {
    /// Create a new ParseError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ParseErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
