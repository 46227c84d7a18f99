//! Narrative arc errors.

/// Specific error conditions for arc construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ArcErrorKind {
    /// No characters were supplied
    #[display("Cannot build an arc for an empty cast")]
    EmptyCast,
    /// Tension descriptor is not one of the supported categories
    #[display("Unknown tension descriptor: {}", _0)]
    UnknownTension(String),
    /// Two cast members share a name
    #[display("Cast member '{}' appears more than once", _0)]
    DuplicateCastMember(String),
}

/// Error type for arc construction.
///
/// # Examples
///
/// ```
/// use timepoint_error::{ArcError, ArcErrorKind};
///
/// let err = ArcError::new(ArcErrorKind::EmptyCast);
/// assert!(format!("{}", err).contains("empty cast"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Arc Error: {} at line {} in {}", kind, line, file)]
pub struct ArcError {
    /// The specific error condition
    pub kind: ArcErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ArcError {
    /// Create a new ArcError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ArcErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
