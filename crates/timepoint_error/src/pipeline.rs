//! Pipeline specification and run errors.

use crate::ErrorClass;

/// Specific error conditions for pipeline validation and execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PipelineErrorKind {
    /// The pipeline declares no steps
    #[display("Pipeline must declare at least one step")]
    EmptyPipeline,
    /// Two steps share a name
    #[display("Step '{}' is declared more than once", _0)]
    DuplicateStep(String),
    /// A step names a predecessor that does not exist
    #[display("Step '{}' depends on unknown step '{}'", step, predecessor)]
    UnknownPredecessor {
        /// Step declaring the dependency
        step: String,
        /// Missing predecessor name
        predecessor: String,
    },
    /// The dependency graph contains a cycle through these steps
    #[display("Dependency cycle through steps: {}", _0.join(" -> "))]
    Cycle(Vec<String>),
    /// A concurrency cap of zero would deadlock its group
    #[display("Concurrency limit for group '{}' must be at least 1", _0)]
    InvalidGroupLimit(String),
    /// A manifest names a capability that is not registered
    #[display("Capability '{}' is not registered", _0)]
    UnknownCapability(String),
    /// A manifest could not be read
    #[display("Failed to read pipeline manifest: {}", _0)]
    ManifestRead(String),
    /// A manifest could not be parsed
    #[display("Failed to parse pipeline manifest: {}", _0)]
    ManifestParse(String),
    /// A step result was written twice in one run
    #[display("Result for step '{}' was already recorded", _0)]
    DuplicateRecord(String),
    /// A required step failed and the run was aborted
    #[display("Required step '{}' failed ({}): {}", step, class, message)]
    StepFailed {
        /// Failing step
        step: String,
        /// Classified cause
        class: ErrorClass,
        /// Failure message
        message: String,
    },
}

/// Error type for pipeline operations.
///
/// # Examples
///
/// ```
/// use timepoint_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::EmptyPipeline);
/// assert!(format!("{}", err).contains("at least one step"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The specific error condition
    pub kind: PipelineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
