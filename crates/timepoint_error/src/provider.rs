//! Provider call errors.

use crate::ErrorClass;

/// A failed call to one backing provider.
///
/// Providers classify their own failures; the router acts on `class` only.
///
/// # Examples
///
/// ```
/// use timepoint_error::{ErrorClass, ProviderError};
///
/// let err = ProviderError::new(ErrorClass::QuotaExhausted, "daily limit reached");
/// assert_eq!(err.class(), ErrorClass::QuotaExhausted);
/// assert!(format!("{}", err).contains("quota_exhausted"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error ({}): {} at line {} in {}", class, message, line, file)]
pub struct ProviderError {
    /// Classified cause
    pub class: ErrorClass,
    /// Provider-reported message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError at the current location.
    #[track_caller]
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            class,
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// The classified cause.
    pub fn class(&self) -> ErrorClass {
        self.class
    }
}
