//! Top-level error wrapper types.

use crate::{ArcError, ConfigError, PipelineError, ProviderError, RouterError, StepError};

/// Every error a Timepoint crate can surface.
///
/// # Examples
///
/// ```
/// use timepoint_error::{ConfigError, TimepointError};
///
/// let err: TimepointError = ConfigError::new("bad retry table").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TimepointErrorKind {
    /// Step capability error
    #[from(StepError)]
    Step(StepError),
    /// Provider call error
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Router construction error
    #[from(RouterError)]
    Router(RouterError),
    /// Pipeline validation or run error
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// Narrative arc error
    #[from(ArcError)]
    Arc(ArcError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Timepoint error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Timepoint Error: {}", _0)]
pub struct TimepointError(Box<TimepointErrorKind>);

impl TimepointError {
    /// Create a new error from a kind.
    pub fn new(kind: TimepointErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TimepointErrorKind {
        &self.0
    }
}

impl<T> From<T> for TimepointError
where
    T: Into<TimepointErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Timepoint operations.
pub type TimepointResult<T> = std::result::Result<T, TimepointError>;
