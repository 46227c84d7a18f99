//! TOML pipeline manifests.
//!
//! A manifest declares a pipeline by capability name:
//!
//! ```toml
//! [pipeline]
//! name = "scene"
//!
//! [groups]
//! parallel = 4
//!
//! [[steps]]
//! name = "dialog"
//! capability = "dialog"
//! after = ["characters", "moment"]
//! group = "parallel"
//! weight = 15
//! critique = "dialog_critic"
//! arc = true
//! ```
//!
//! [`PipelineManifest::resolve`] looks each name up in a
//! [`CapabilityRegistry`] and validates the resulting [`PipelineSpec`].

use crate::{ArcDirectedStep, ArcSources, CritiqueGate, PipelineSpec, RoutedStep, StepNode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use timepoint_core::CapabilityClass;
use timepoint_error::{PipelineError, PipelineErrorKind, PipelineResult};
use timepoint_interface::{CritiqueCapability, StepCapability};
use timepoint_router::ProviderRouter;
use tracing::{debug, instrument};

const SCENE_MANIFEST: &str = include_str!("../scene.toml");

fn default_required() -> bool {
    true
}

fn default_weight() -> u32 {
    1
}

/// The `[pipeline]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestHeader {
    /// Pipeline name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
}

/// One `[[steps]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestStep {
    /// Unique step name
    pub name: String,
    /// Registered capability performing the step
    pub capability: String,
    /// Predecessor step names
    #[serde(default)]
    pub after: Vec<String>,
    /// Concurrency group
    #[serde(default)]
    pub group: Option<String>,
    /// Whether a failure aborts the run
    #[serde(default = "default_required")]
    pub required: bool,
    /// Progress weight
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Registered critique gating this step
    #[serde(default)]
    pub critique: Option<String>,
    /// Whether to attach a narrative arc to the input
    #[serde(default)]
    pub arc: bool,
}

/// A pipeline declared in TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineManifest {
    /// Header
    pub pipeline: ManifestHeader,
    /// Concurrency caps per group
    #[serde(default)]
    pub groups: BTreeMap<String, usize>,
    /// Steps in declaration order
    #[serde(default)]
    pub steps: Vec<ManifestStep>,
}

impl FromStr for PipelineManifest {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
            .map_err(|e| PipelineError::new(PipelineErrorKind::ManifestParse(e.to_string())))
    }
}

impl PipelineManifest {
    /// Load a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid manifest.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| PipelineError::new(PipelineErrorKind::ManifestRead(e.to_string())))?;
        content.parse()
    }

    /// The bundled timepoint scene plan.
    ///
    /// judge, then timeline, then scene, characters, moment and camera in
    /// parallel, then graph and dialog, then image prompt, then the optional
    /// image.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled file is corrupt.
    pub fn scene() -> PipelineResult<Self> {
        SCENE_MANIFEST.parse()
    }

    /// Capability names the manifest needs, without duplicates.
    pub fn capabilities(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.steps.iter().map(|s| s.capability.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Bind capabilities and validate into a [`PipelineSpec`].
    ///
    /// # Errors
    ///
    /// Returns an error if a capability or critique is not registered, or the
    /// resulting graph fails validation.
    #[instrument(skip_all, fields(pipeline = %self.pipeline.name, steps = self.steps.len()))]
    pub fn resolve(&self, registry: &CapabilityRegistry) -> PipelineResult<PipelineSpec> {
        let mut builder = PipelineSpec::builder(self.pipeline.name.as_str());

        for (group, limit) in &self.groups {
            builder = builder.group_limit(group.as_str(), *limit);
        }

        for step in &self.steps {
            let mut capability = registry.step(&step.capability)?;
            if step.arc {
                capability = Arc::new(ArcDirectedStep::new(capability, registry.arc_sources().clone()));
            }
            if let Some(critic) = &step.critique {
                capability = Arc::new(CritiqueGate::new(capability, registry.critic(critic)?));
            }

            let mut node = StepNode::new(step.name.as_str(), capability)
                .depends_on(step.after.iter().map(String::as_str))
                .with_required(step.required)
                .with_weight(step.weight);
            if let Some(group) = &step.group {
                node = node.in_group(group.as_str());
            }
            builder = builder.step(node);
        }

        let spec = builder.build()?;
        debug!(phases = spec.phases().len(), "Manifest resolved");
        Ok(spec)
    }
}

/// Named step and critique capabilities available to manifests.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    steps: HashMap<String, Arc<dyn StepCapability>>,
    critics: HashMap<String, Arc<dyn CritiqueCapability>>,
    arc_sources: ArcSources,
}

impl CapabilityRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step capability under `name`, replacing any previous one.
    pub fn register_step(&mut self, name: impl Into<String>, capability: Arc<dyn StepCapability>) {
        self.steps.insert(name.into(), capability);
    }

    /// Register a [`RoutedStep`] for `name`.
    pub fn register_routed(
        &mut self,
        name: impl Into<String>,
        capability: CapabilityClass,
        router: Arc<ProviderRouter>,
    ) {
        let name = name.into();
        let step = RoutedStep::new(name.as_str(), capability, router);
        self.steps.insert(name, Arc::new(step));
    }

    /// Register a critique capability under `name`.
    pub fn register_critic(&mut self, name: impl Into<String>, critic: Arc<dyn CritiqueCapability>) {
        self.critics.insert(name.into(), critic);
    }

    /// Override where arc-directed steps read tension and cast.
    pub fn with_arc_sources(mut self, sources: ArcSources) -> Self {
        self.arc_sources = sources;
        self
    }

    /// Arc sources used for `arc = true` steps.
    pub fn arc_sources(&self) -> &ArcSources {
        &self.arc_sources
    }

    /// Step capability registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is registered under `name`.
    pub fn step(&self, name: &str) -> PipelineResult<Arc<dyn StepCapability>> {
        self.steps.get(name).cloned().ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::UnknownCapability(name.to_string()))
        })
    }

    /// Critique capability registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is registered under `name`.
    pub fn critic(&self, name: &str) -> PipelineResult<Arc<dyn CritiqueCapability>> {
        self.critics.get(name).cloned().ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::UnknownCapability(name.to_string()))
        })
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut steps: Vec<_> = self.steps.keys().collect();
        steps.sort();
        let mut critics: Vec<_> = self.critics.keys().collect();
        critics.sort();
        f.debug_struct("CapabilityRegistry")
            .field("steps", &steps)
            .field("critics", &critics)
            .field("arc_sources", &self.arc_sources)
            .finish()
    }
}
