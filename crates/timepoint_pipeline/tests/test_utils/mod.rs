//! Mock capabilities for pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use timepoint_core::{CritiqueVerdict, StepInput};
use timepoint_error::{ErrorClass, StepError};
use timepoint_interface::{CritiqueCapability, StepCapability, StepResult};

/// Start/end marks shared by every step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Start,
    End,
}

/// Ordered log of step starts and ends.
#[derive(Debug, Default)]
pub struct EventLog {
    marks: Mutex<Vec<(String, Mark)>>,
}

impl EventLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, step: &str, mark: Mark) {
        self.marks.lock().unwrap().push((step.to_string(), mark));
    }

    pub fn marks(&self) -> Vec<(String, Mark)> {
        self.marks.lock().unwrap().clone()
    }

    pub fn position(&self, step: &str, mark: Mark) -> Option<usize> {
        self.marks()
            .iter()
            .position(|(name, m)| name == step && *m == mark)
    }

    pub fn started(&self, step: &str) -> bool {
        self.position(step, Mark::Start).is_some()
    }
}

/// Tracks how many steps run at once.
#[derive(Debug, Default)]
pub struct Gauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Scripted step capability.
pub struct MockStep {
    name: String,
    script: Mutex<VecDeque<StepResult<JsonValue>>>,
    fallback: StepResult<JsonValue>,
    delay: Duration,
    calls: AtomicUsize,
    inputs: Mutex<Vec<StepInput>>,
    log: Option<Arc<EventLog>>,
    gauge: Option<Arc<Gauge>>,
}

impl MockStep {
    fn with_fallback(name: &str, fallback: StepResult<JsonValue>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(VecDeque::new()),
            fallback,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
            log: None,
            gauge: None,
        }
    }

    /// Always succeeds with `output`.
    pub fn ok(name: &str, output: JsonValue) -> Self {
        Self::with_fallback(name, Ok(output))
    }

    /// Always fails with `class`.
    pub fn failing(name: &str, class: ErrorClass) -> Self {
        Self::with_fallback(name, Err(error_for(class)))
    }

    /// Replays `script`, then repeats the last entry.
    pub fn scripted(name: &str, script: Vec<StepResult<JsonValue>>) -> Self {
        let fallback = script
            .last()
            .cloned()
            .unwrap_or(Ok(JsonValue::Null));
        let mut step = Self::with_fallback(name, fallback);
        step.script = Mutex::new(script.into());
        step
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn log(mut self, log: Arc<EventLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn gauge(mut self, gauge: Arc<Gauge>) -> Self {
        self.gauge = Some(gauge);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<StepInput> {
        self.inputs.lock().unwrap().clone()
    }

    pub fn last_input(&self) -> Option<StepInput> {
        self.inputs().pop()
    }
}

pub fn error_for(class: ErrorClass) -> StepError {
    match class {
        ErrorClass::Validation => StepError::validation("bad input"),
        other => StepError::provider(other, format!("{} from mock", other)),
    }
}

#[async_trait]
impl StepCapability for MockStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, input: StepInput) -> StepResult<JsonValue> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input);
        if let Some(log) = &self.log {
            log.push(&self.name, Mark::Start);
        }
        if let Some(gauge) = &self.gauge {
            gauge.enter();
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        let result = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        if let Some(gauge) = &self.gauge {
            gauge.exit();
        }
        if let Some(log) = &self.log {
            log.push(&self.name, Mark::End);
        }
        result
    }
}

/// Scripted critique capability.
pub struct MockCritic {
    verdicts: Mutex<VecDeque<StepResult<CritiqueVerdict>>>,
    reviews: AtomicUsize,
}

impl MockCritic {
    pub fn new(verdicts: Vec<StepResult<CritiqueVerdict>>) -> Arc<Self> {
        Arc::new(Self {
            verdicts: Mutex::new(verdicts.into()),
            reviews: AtomicUsize::new(0),
        })
    }

    pub fn reviews(&self) -> usize {
        self.reviews.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CritiqueCapability for MockCritic {
    fn name(&self) -> &str {
        "mock_critic"
    }

    async fn review(&self, _input: &StepInput, _output: &JsonValue) -> StepResult<CritiqueVerdict> {
        self.reviews.fetch_add(1, Ordering::SeqCst);
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(CritiqueVerdict::clean()))
    }
}
