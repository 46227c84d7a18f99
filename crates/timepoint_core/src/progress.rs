//! Progress events streamed while a pipeline runs.

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::time::Duration;

/// Kind of progress event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProgressKind {
    /// The run started
    Start,
    /// A step produced its output
    StepComplete,
    /// A step failed (required or optional)
    StepError,
    /// The run finished, successfully or not
    Done,
}

/// Immutable record emitted as a run advances.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use std::time::Duration;
/// use timepoint_core::{ProgressEvent, ProgressKind};
///
/// let event = ProgressEvent::step_complete("scene", Duration::from_millis(40), 35, json!({}));
/// assert_eq!(*event.kind(), ProgressKind::StepComplete);
/// assert_eq!(event.step_name().as_deref(), Some("scene"));
/// assert_eq!(*event.percent(), 35);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ProgressEvent {
    /// Event kind
    kind: ProgressKind,
    /// Step the event refers to (`None` for start/done)
    step_name: Option<String>,
    /// Time since the run started
    elapsed: Duration,
    /// Cumulative progress, 0..=100, from static step weights
    percent: u8,
    /// Event-specific payload
    payload: JsonValue,
}

impl ProgressEvent {
    /// The run started.
    pub fn start(payload: JsonValue) -> Self {
        Self {
            kind: ProgressKind::Start,
            step_name: None,
            elapsed: Duration::ZERO,
            percent: 0,
            payload,
        }
    }

    /// A step settled with a value.
    pub fn step_complete(
        step: impl Into<String>,
        elapsed: Duration,
        percent: u8,
        payload: JsonValue,
    ) -> Self {
        Self {
            kind: ProgressKind::StepComplete,
            step_name: Some(step.into()),
            elapsed,
            percent: percent.min(100),
            payload,
        }
    }

    /// A step settled with a failure.
    pub fn step_error(
        step: impl Into<String>,
        elapsed: Duration,
        percent: u8,
        payload: JsonValue,
    ) -> Self {
        Self {
            kind: ProgressKind::StepError,
            step_name: Some(step.into()),
            elapsed,
            percent: percent.min(100),
            payload,
        }
    }

    /// The run finished.
    pub fn done(elapsed: Duration, percent: u8, payload: JsonValue) -> Self {
        Self {
            kind: ProgressKind::Done,
            step_name: None,
            elapsed,
            percent: percent.min(100),
            payload,
        }
    }

    /// Whether this is the final event of a run.
    pub fn is_terminal(&self) -> bool {
        self.kind == ProgressKind::Done
    }

    /// Whether a `done` event reports an aborted run.
    pub fn is_aborted(&self) -> bool {
        self.is_terminal() && self.payload.get("status") == Some(&json!("aborted"))
    }
}
