//! Trait definitions for the Timepoint generation pipeline.
//!
//! These are the seams between the orchestration core and the surrounding
//! application: step capabilities, critique capabilities, backing providers
//! and progress sinks.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;

pub use traits::{CritiqueCapability, ProgressSink, Provider, StepCapability, StepResult};
