//! Dependency-driven orchestration of Timepoint generation steps.
//!
//! A [`PipelineSpec`] is a validated graph of named steps. The
//! [`Orchestrator`] runs it in ready sets, records each step's result in an
//! append-only [`ExecutionContext`] and streams [`ProgressEvent`]s to a
//! [`ProgressSink`] as steps settle.
//!
//! - Required steps abort the run on failure; steps that have not started
//!   are recorded as skipped.
//! - Optional steps that fail are recorded as absent, and dependents receive
//!   an explicit `Missing` upstream instead of a value.
//! - [`CritiqueGate`] reviews a step's output and revises it at most once.
//! - [`RoutedStep`] and [`ArcDirectedStep`] adapt the provider router and the
//!   narrative arc engine to the step interface.
//!
//! Pipelines can also be declared in TOML; see [`PipelineManifest`].
//!
//! [`ProgressEvent`]: timepoint_core::ProgressEvent
//! [`ProgressSink`]: timepoint_interface::ProgressSink

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod adapters;
mod context;
mod gate;
mod manifest;
mod orchestrator;
mod sink;
mod spec;

pub use adapters::{ArcDirectedStep, ArcSources, FieldRef, NARRATIVE_ARC_KEY, RoutedStep};
pub use context::{ExecutionContext, StepRecord};
pub use gate::{CritiqueGate, execute_with_gate};
pub use manifest::{CapabilityRegistry, ManifestHeader, ManifestStep, PipelineManifest};
pub use orchestrator::{Orchestrator, PipelineRun, RunStatus};
pub use sink::{ChannelSink, CollectingSink, TracingSink};
pub use spec::{PipelineSpec, PipelineSpecBuilder, StepNode};
