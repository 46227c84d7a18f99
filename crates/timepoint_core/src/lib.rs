//! Core data types for the Timepoint generation pipeline.
//!
//! This crate provides the plain data shared by the router, the arc engine and
//! the orchestrator: step inputs, provider requests and attempts, critique
//! verdicts and progress events.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod attempt;
mod capability;
mod critique;
mod input;
mod progress;
mod request;
mod telemetry;

pub use attempt::{CallOutcome, ProviderAttempt, Resolution};
pub use capability::{AuthRequirement, CapabilityClass};
pub use critique::{CritiqueIssue, CritiqueVerdict, Severity};
pub use input::{StepInput, Upstream};
pub use progress::{ProgressEvent, ProgressKind};
pub use request::{ProviderRequest, ProviderResponse};
pub use telemetry::init_tracing;
pub use timepoint_error::ErrorClass;
