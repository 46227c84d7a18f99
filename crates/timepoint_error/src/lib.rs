//! Error types for the Timepoint pipeline.
//!
//! This crate provides the foundation error types used throughout the Timepoint workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Provider and step failures additionally carry an [`ErrorClass`], the
//! single taxonomy that drives retry, fallback and abort decisions.
//!
//! # Examples
//!
//! ```
//! use timepoint_error::{ErrorClass, StepError, TimepointResult};
//!
//! fn generate() -> TimepointResult<String> {
//!     Err(StepError::provider(ErrorClass::Transient, "upstream reset"))?
//! }
//!
//! assert!(generate().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod arc;
mod class;
mod config;
mod error;
mod pipeline;
mod provider;
mod router;
mod step;

pub use arc::{ArcError, ArcErrorKind};
pub use class::ErrorClass;
pub use config::ConfigError;
pub use error::{TimepointError, TimepointErrorKind, TimepointResult};
pub use pipeline::{PipelineError, PipelineErrorKind, PipelineResult};
pub use provider::ProviderError;
pub use router::{RouterError, RouterErrorKind};
pub use step::{StepError, StepErrorKind};
