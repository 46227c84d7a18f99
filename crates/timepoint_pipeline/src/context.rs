//! Per-run step results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use timepoint_core::Upstream;
use timepoint_error::{ErrorClass, PipelineError, PipelineErrorKind, PipelineResult};

/// How one step settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepRecord {
    /// The step produced a value
    Completed {
        /// Step output
        output: JsonValue,
    },
    /// An optional step failed; dependents see it as missing
    Absent {
        /// Classified cause
        class: ErrorClass,
        /// Failure message
        message: String,
    },
    /// A required step failed and aborted the run
    Failed {
        /// Classified cause
        class: ErrorClass,
        /// Failure message
        message: String,
    },
    /// Never started because the run aborted
    Skipped,
}

impl StepRecord {
    /// The output, for completed steps.
    pub fn output(&self) -> Option<&JsonValue> {
        match self {
            StepRecord::Completed { output } => Some(output),
            _ => None,
        }
    }

    /// Whether a successor may start after this record.
    pub fn is_settled(&self) -> bool {
        matches!(self, StepRecord::Completed { .. } | StepRecord::Absent { .. })
    }

    /// How a dependent sees this record.
    pub fn as_upstream(&self) -> Option<Upstream> {
        match self {
            StepRecord::Completed { output } => Some(Upstream::Value {
                value: output.clone(),
            }),
            StepRecord::Absent { class, .. } | StepRecord::Failed { class, .. } => {
                Some(Upstream::Missing { class: *class })
            }
            StepRecord::Skipped => None,
        }
    }
}

/// Append-only results of one pipeline run.
///
/// Each step name can be written once; a second write is rejected and the
/// first record stays in place.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use timepoint_pipeline::{ExecutionContext, StepRecord};
///
/// let mut context = ExecutionContext::new();
/// context.record("scene", StepRecord::Completed { output: json!("harbor") }).unwrap();
///
/// assert_eq!(context.output("scene"), Some(&json!("harbor")));
/// assert!(context.record("scene", StepRecord::Skipped).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    records: HashMap<String, StepRecord>,
    order: Vec<String>,
}

impl ExecutionContext {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the record for `step`.
    ///
    /// # Errors
    ///
    /// Returns an error if `step` already has a record.
    #[track_caller]
    pub fn record(&mut self, step: impl Into<String>, record: StepRecord) -> PipelineResult<()> {
        let step = step.into();
        if self.records.contains_key(&step) {
            return Err(PipelineError::new(PipelineErrorKind::DuplicateRecord(step)));
        }
        self.order.push(step.clone());
        self.records.insert(step, record);
        Ok(())
    }

    /// Record for `step`.
    pub fn get(&self, step: &str) -> Option<&StepRecord> {
        self.records.get(step)
    }

    /// Output of a completed step.
    pub fn output(&self, step: &str) -> Option<&JsonValue> {
        self.get(step).and_then(StepRecord::output)
    }

    /// Whether `step` has any record.
    pub fn contains(&self, step: &str) -> bool {
        self.records.contains_key(step)
    }

    /// Whether `step` is an optional step that failed.
    pub fn is_absent(&self, step: &str) -> bool {
        matches!(self.get(step), Some(StepRecord::Absent { .. }))
    }

    /// Whether `step` was skipped by an abort.
    pub fn is_skipped(&self, step: &str) -> bool {
        matches!(self.get(step), Some(StepRecord::Skipped))
    }

    /// Step names in the order they were recorded.
    pub fn settled_order(&self) -> &[String] {
        &self.order
    }

    /// Records in the order they were written.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StepRecord)> {
        self.order
            .iter()
            .filter_map(|name| self.records.get(name).map(|record| (name.as_str(), record)))
    }

    /// Outputs of completed steps as a JSON object.
    pub fn outputs(&self) -> Map<String, JsonValue> {
        self.iter()
            .filter_map(|(name, record)| record.output().map(|out| (name.to_string(), out.clone())))
            .collect()
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Count records matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&StepRecord) -> bool) -> usize {
        self.records.values().filter(|record| predicate(record)).count()
    }
}
