//! Timepoint - orchestration core for historical scene generation
//!
//! Timepoint turns a query into a scene by running a graph of generation
//! steps. This crate re-exports the workspace:
//!
//! - `timepoint-error` - Error types and the `ErrorClass` taxonomy
//! - `timepoint-core` - Step inputs, provider attempts, verdicts, progress events
//! - `timepoint-interface` - `StepCapability`, `CritiqueCapability`, `Provider`, `ProgressSink`
//! - `timepoint-router` - Provider fallback chains with retry and backoff
//! - `timepoint-arc` - Narrative arcs and speaker assignment for dialog
//! - `timepoint-pipeline` - The orchestrator, critique gate and TOML manifests
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use timepoint::{
//!     CapabilityClass, CapabilityRegistry, ChannelSink, Orchestrator, PipelineManifest,
//!     ProviderRouter, RouterConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     timepoint::init_tracing()?;
//!
//!     let router = Arc::new(ProviderRouter::from_config(&RouterConfig::load()?, &providers)?);
//!     let mut registry = CapabilityRegistry::new();
//!     registry.register_routed("image", CapabilityClass::Image, router.clone());
//!     // register the remaining scene capabilities and "dialog_critic"
//!
//!     let spec = PipelineManifest::scene()?.resolve(&registry)?;
//!     let (sink, mut events) = ChannelSink::new();
//!     let run = Orchestrator::new(Arc::new(sink))
//!         .run(&spec, serde_json::json!({"query": "Rome, 44 BC"}))
//!         .await;
//!
//!     println!("{:?}", run.status());
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

pub use timepoint_core::*;
pub use timepoint_error::*;
pub use timepoint_interface::*;

pub use timepoint_arc::{
    ArcShape, Beat, BeatFunction, CastMember, CastTier, Intensity, NarrativeArc, SHAPE_BEAT_COUNT,
    SpeakerRole, TensionDescriptor, build_arc,
};

pub use timepoint_pipeline::{
    ArcDirectedStep, ArcSources, CapabilityRegistry, ChannelSink, CollectingSink, CritiqueGate,
    ExecutionContext, FieldRef, ManifestHeader, ManifestStep, NARRATIVE_ARC_KEY, Orchestrator,
    PipelineManifest, PipelineRun, PipelineSpec, PipelineSpecBuilder, RoutedStep, RunStatus,
    StepNode, StepRecord, TracingSink, execute_with_gate,
};

pub use timepoint_router::{
    ActionTable, BackoffPolicy, ChainsConfig, ProviderDescriptor, ProviderDescriptorBuilder,
    ProviderRouter, ProviderRouterBuilder, ProviderThrottle, RetryAction, RetrySettings,
    RouterConfig, RoutingPolicy, ThrottleGuard,
};
