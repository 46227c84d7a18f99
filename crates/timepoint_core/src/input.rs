//! Inputs handed to step capabilities.

use crate::CritiqueIssue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use timepoint_error::ErrorClass;

/// A predecessor's contribution to a step input.
///
/// Optional predecessors that failed are passed as `Missing` so the consumer
/// handles the absence explicitly rather than reading a stale value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Upstream {
    /// Predecessor produced a value
    Value {
        /// The produced output
        value: JsonValue,
    },
    /// Predecessor is optional and failed
    Missing {
        /// Why it is missing
        class: ErrorClass,
    },
}

impl Upstream {
    /// The produced value, if any.
    pub fn value(&self) -> Option<&JsonValue> {
        match self {
            Upstream::Value { value } => Some(value),
            Upstream::Missing { .. } => None,
        }
    }
}

/// Typed input for one step invocation.
///
/// Carries the run's initial input, one [`Upstream`] entry per declared
/// predecessor, corrective instructions from a critique pass, and extra
/// attachments added by wrapping adapters (for example a narrative arc).
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use timepoint_core::{ErrorClass, StepInput, Upstream};
///
/// let input = StepInput::new("dialog", json!({"query": "Apollo 11 landing"}))
///     .with_upstream("characters", Upstream::Value { value: json!(["Armstrong"]) })
///     .with_upstream("image", Upstream::Missing { class: ErrorClass::Transient });
///
/// assert_eq!(input.value("characters"), Some(&json!(["Armstrong"])));
/// assert!(input.is_missing("image"));
/// assert!(!input.is_missing("characters"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct StepInput {
    /// Name of the step receiving this input
    step: String,
    /// Initial input of the run
    initial: JsonValue,
    /// Predecessor results keyed by step name
    #[serde(default)]
    upstream: BTreeMap<String, Upstream>,
    /// Corrective instructions from a critique pass
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    corrections: Vec<CritiqueIssue>,
    /// Attachments added by adapters
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    extras: Map<String, JsonValue>,
}

impl StepInput {
    /// Create an input with no predecessors.
    pub fn new(step: impl Into<String>, initial: JsonValue) -> Self {
        Self {
            step: step.into(),
            initial,
            upstream: BTreeMap::new(),
            corrections: Vec::new(),
            extras: Map::new(),
        }
    }

    /// Add a predecessor result.
    pub fn with_upstream(mut self, name: impl Into<String>, upstream: Upstream) -> Self {
        self.upstream.insert(name.into(), upstream);
        self
    }

    /// Merge corrective instructions into this input.
    ///
    /// Existing corrections are kept; new issues are appended after them.
    pub fn with_corrections(mut self, issues: impl IntoIterator<Item = CritiqueIssue>) -> Self {
        self.corrections.extend(issues);
        self
    }

    /// Attach an extra value under `key`, replacing any previous attachment.
    pub fn attach(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    /// Value produced by predecessor `name`, if it produced one.
    pub fn value(&self, name: &str) -> Option<&JsonValue> {
        self.upstream.get(name).and_then(Upstream::value)
    }

    /// Whether predecessor `name` is an optional step that failed.
    pub fn is_missing(&self, name: &str) -> bool {
        matches!(self.upstream.get(name), Some(Upstream::Missing { .. }))
    }

    /// Extra attachment under `key`.
    pub fn extra(&self, key: &str) -> Option<&JsonValue> {
        self.extras.get(key)
    }

    /// Whether this input carries critique corrections.
    pub fn is_revision(&self) -> bool {
        !self.corrections.is_empty()
    }
}
