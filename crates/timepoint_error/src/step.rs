//! Step capability errors.

use crate::ErrorClass;

/// Failure modes of a step capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StepErrorKind {
    /// Input did not have the shape the step requires
    #[display("Validation failed: {}", _0)]
    Validation(String),
    /// A provider call failed with a classified cause
    #[display("Provider failed ({}): {}", class, message)]
    Provider {
        /// Classified cause
        class: ErrorClass,
        /// Provider message
        message: String,
    },
    /// The step did not finish in time
    #[display("Step timed out: {}", _0)]
    Timeout(String),
}

/// Error returned by a step capability.
///
/// # Examples
///
/// ```
/// use timepoint_error::{ErrorClass, StepError, StepErrorKind};
///
/// let err = StepError::new(StepErrorKind::Validation("missing query".to_string()));
/// assert_eq!(err.class(), ErrorClass::Validation);
///
/// let err = StepError::provider(ErrorClass::RateLimited, "429");
/// assert_eq!(err.class(), ErrorClass::RateLimited);
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Step Error: {} at line {} in {}", kind, line, file)]
pub struct StepError {
    /// The specific error condition
    pub kind: StepErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl StepError {
    /// Create a new StepError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StepErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a validation failure.
    #[track_caller]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StepErrorKind::Validation(message.into()))
    }

    /// Shorthand for a classified provider failure.
    #[track_caller]
    pub fn provider(class: ErrorClass, message: impl Into<String>) -> Self {
        Self::new(StepErrorKind::Provider {
            class,
            message: message.into(),
        })
    }

    /// The classified cause of this failure.
    pub fn class(&self) -> ErrorClass {
        match &self.kind {
            StepErrorKind::Validation(_) => ErrorClass::Validation,
            StepErrorKind::Provider { class, .. } => *class,
            StepErrorKind::Timeout(_) => ErrorClass::Timeout,
        }
    }

    /// Human-readable message without location.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl From<crate::ProviderError> for StepError {
    #[track_caller]
    fn from(err: crate::ProviderError) -> Self {
        Self::provider(err.class, err.message)
    }
}
