//! Provider router construction errors.

/// Specific error conditions when building or configuring a router.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum RouterErrorKind {
    /// No providers are configured for a capability class
    #[display("No providers configured for capability '{}'", _0)]
    NoProviders(String),
    /// A descriptor references a provider that was never registered
    #[display("Provider '{}' is not registered", _0)]
    UnknownProvider(String),
    /// The same provider appears twice in one chain
    #[display("Provider '{}' appears more than once in the '{}' chain", provider, capability)]
    DuplicateProvider {
        /// Provider id
        provider: String,
        /// Capability class name
        capability: String,
    },
    /// An infallible tier is not the last tier of its chain
    #[display("Infallible provider '{}' must be the last tier of its chain", _0)]
    InfallibleNotLast(String),
    /// An infallible tier requires authentication
    #[display("Infallible provider '{}' must not require authentication", _0)]
    InfallibleRequiresAuth(String),
    /// Retry or timeout settings are unusable
    #[display("Invalid routing policy: {}", _0)]
    InvalidPolicy(String),
}

/// Error type for router construction.
///
/// # Examples
///
/// ```
/// use timepoint_error::{RouterError, RouterErrorKind};
///
/// let err = RouterError::new(RouterErrorKind::NoProviders("image".to_string()));
/// assert!(format!("{}", err).contains("image"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Router Error: {} at line {} in {}", kind, line, file)]
pub struct RouterError {
    /// The specific error condition
    pub kind: RouterErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl RouterError {
    /// Create a new RouterError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RouterErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
