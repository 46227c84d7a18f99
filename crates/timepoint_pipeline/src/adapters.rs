//! Step capabilities built from the router and the arc engine.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use timepoint_arc::{CastMember, SHAPE_BEAT_COUNT, TensionDescriptor, build_arc};
use timepoint_core::{CapabilityClass, ProviderRequest, StepInput};
use timepoint_error::StepError;
use timepoint_interface::{StepCapability, StepResult};
use timepoint_router::ProviderRouter;
use tracing::{debug, instrument, warn};

/// Key under which [`ArcDirectedStep`] attaches the arc.
pub const NARRATIVE_ARC_KEY: &str = "narrative_arc";

/// A step that hands its whole input to the provider router.
///
/// The serialized [`StepInput`] is the request payload and the winning
/// provider's payload is the step output. An infallible tier that produced
/// nothing yields `null`.
#[derive(Clone)]
pub struct RoutedStep {
    name: String,
    capability: CapabilityClass,
    router: Arc<ProviderRouter>,
}

impl RoutedStep {
    /// Route `name` through the chain for `capability`.
    pub fn new(name: impl Into<String>, capability: CapabilityClass, router: Arc<ProviderRouter>) -> Self {
        Self {
            name: name.into(),
            capability,
            router,
        }
    }
}

impl std::fmt::Debug for RoutedStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutedStep")
            .field("name", &self.name)
            .field("capability", &self.capability)
            .finish()
    }
}

#[async_trait]
impl StepCapability for RoutedStep {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, input), fields(step = %self.name, capability = %self.capability))]
    async fn execute(&self, input: StepInput) -> StepResult<JsonValue> {
        let payload = serde_json::to_value(&input)
            .map_err(|e| StepError::validation(format!("input is not serializable: {}", e)))?;
        let request = ProviderRequest::new(self.capability, input.step().as_str(), payload);

        let outcome = self.router.call(&request).await;
        debug!(
            attempts = outcome.attempts().len(),
            retries = outcome.total_retries(),
            provider = outcome.winning_provider().unwrap_or("-"),
            "Routed call finished"
        );

        let response = outcome.into_result()?;
        Ok(response.payload)
    }
}

/// Where in a predecessor's output to find a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    /// Predecessor step
    pub step: String,
    /// JSON pointer into its output; empty for the whole output
    pub pointer: String,
}

impl FieldRef {
    /// Reference `pointer` in the output of `step`.
    pub fn new(step: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            pointer: pointer.into(),
        }
    }

    fn resolve<'a>(&self, input: &'a StepInput) -> Option<&'a JsonValue> {
        input
            .value(&self.step)
            .and_then(|output| output.pointer(&self.pointer))
            .filter(|value| !value.is_null())
    }
}

/// Where [`ArcDirectedStep`] reads its inputs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcSources {
    /// Tension descriptor string
    pub tension: FieldRef,
    /// Cast array: names, or `{name, tier}` objects
    pub cast: FieldRef,
    /// Optional requested line count
    pub beats: Option<FieldRef>,
}

impl Default for ArcSources {
    fn default() -> Self {
        Self {
            tension: FieldRef::new("judge", "/tension"),
            cast: FieldRef::new("characters", "/characters"),
            beats: Some(FieldRef::new("moment", "/dialog_lines")),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CastEntry {
    Name(String),
    Member(CastMember),
}

impl From<CastEntry> for CastMember {
    fn from(entry: CastEntry) -> Self {
        match entry {
            CastEntry::Name(name) => CastMember::new(name, Default::default()),
            CastEntry::Member(member) => member,
        }
    }
}

/// Builds a narrative arc from predecessor outputs and hands it to the
/// wrapped step under [`NARRATIVE_ARC_KEY`].
///
/// When the tension or cast is missing (for example because an optional
/// predecessor failed) the wrapped step runs without an arc.
#[derive(Clone)]
pub struct ArcDirectedStep {
    inner: Arc<dyn StepCapability>,
    sources: ArcSources,
}

impl ArcDirectedStep {
    /// Direct `inner` with an arc read from `sources`.
    pub fn new(inner: Arc<dyn StepCapability>, sources: ArcSources) -> Self {
        Self { inner, sources }
    }

    fn arc_for(&self, input: &StepInput) -> StepResult<Option<JsonValue>> {
        let (Some(tension), Some(cast)) = (
            self.sources.tension.resolve(input),
            self.sources.cast.resolve(input),
        ) else {
            return Ok(None);
        };

        let tension: TensionDescriptor = tension
            .as_str()
            .ok_or_else(|| StepError::validation("tension descriptor must be a string"))?
            .parse()
            .map_err(|e: timepoint_error::ArcError| StepError::validation(e.kind.to_string()))?;

        let cast: Vec<CastMember> = serde_json::from_value::<Vec<CastEntry>>(cast.clone())
            .map_err(|e| StepError::validation(format!("cast is malformed: {}", e)))?
            .into_iter()
            .map(CastMember::from)
            .collect();

        let beats = self
            .sources
            .beats
            .as_ref()
            .and_then(|field| field.resolve(input))
            .and_then(JsonValue::as_u64)
            .map_or(SHAPE_BEAT_COUNT, |n| n as usize);

        let arc = build_arc(tension, beats, &cast)
            .map_err(|e| StepError::validation(e.kind.to_string()))?;
        serde_json::to_value(&arc)
            .map(Some)
            .map_err(|e| StepError::validation(format!("arc is not serializable: {}", e)))
    }
}

impl std::fmt::Debug for ArcDirectedStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArcDirectedStep")
            .field("inner", &self.inner.name())
            .field("sources", &self.sources)
            .finish()
    }
}

#[async_trait]
impl StepCapability for ArcDirectedStep {
    fn name(&self) -> &str {
        self.inner.name()
    }

    #[instrument(skip(self, input), fields(step = %input.step()))]
    async fn execute(&self, input: StepInput) -> StepResult<JsonValue> {
        let input = match self.arc_for(&input)? {
            Some(arc) => {
                debug!("Attaching narrative arc");
                input.attach(NARRATIVE_ARC_KEY, arc)
            }
            None => {
                warn!("Tension or cast unavailable, running without an arc");
                input
            }
        };
        self.inner.execute(input).await
    }
}
