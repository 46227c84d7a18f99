//! Dependency-driven scheduling of pipeline steps.

use crate::{ExecutionContext, PipelineSpec, StepNode, StepRecord, TracingSink};
use derive_getters::Getters;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use timepoint_core::{ProgressEvent, StepInput};
use timepoint_error::{ErrorClass, PipelineError, PipelineErrorKind, PipelineResult, StepError};
use timepoint_interface::ProgressSink;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

/// Final state of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// Every required step completed
    Completed,
    /// A required step failed
    Aborted {
        /// Failing step
        step: String,
        /// Classified cause
        class: ErrorClass,
        /// Failure message
        message: String,
    },
}

/// Everything a run produced.
#[derive(Debug, Clone, Getters)]
pub struct PipelineRun {
    /// Per-step records
    context: ExecutionContext,
    /// How the run ended
    status: RunStatus,
    /// Wall time of the run
    elapsed: Duration,
}

impl PipelineRun {
    /// Whether the run completed.
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// The context of a completed run, or the failure that aborted it.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineErrorKind::StepFailed`] for an aborted run.
    pub fn into_result(self) -> PipelineResult<ExecutionContext> {
        match self.status {
            RunStatus::Completed => Ok(self.context),
            RunStatus::Aborted {
                step,
                class,
                message,
            } => Err(PipelineError::new(PipelineErrorKind::StepFailed {
                step,
                class,
                message,
            })),
        }
    }
}

/// Runs pipeline specs, streaming progress to a sink.
///
/// Steps run in ready sets: every step whose predecessors have all settled
/// is launched together, and the next ready set is computed once the whole
/// set has finished. Within a set, events are emitted in completion order.
///
/// One orchestrator can drive many concurrent runs; each run owns its own
/// [`ExecutionContext`].
#[derive(Clone)]
pub struct Orchestrator {
    sink: Arc<dyn ProgressSink>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

/// Outcome of one step future.
struct Settled<'a> {
    node: &'a StepNode,
    result: Result<JsonValue, StepError>,
    latency: Duration,
}

impl Orchestrator {
    /// Create an orchestrator emitting to `sink`.
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self { sink }
    }

    /// Execute `spec` once.
    ///
    /// Never returns early: a required failure lets the rest of its ready set
    /// finish, marks every step that has not started as skipped, and reports
    /// the run as aborted.
    #[instrument(skip(self, spec, initial), fields(pipeline = %spec.name(), steps = spec.len()))]
    pub async fn run(&self, spec: &PipelineSpec, initial: JsonValue) -> PipelineRun {
        let started = Instant::now();
        let mut context = ExecutionContext::new();
        let mut abort: Option<RunStatus> = None;
        let mut settled_weight = 0u64;
        let mut settled_steps = 0usize;

        let groups: HashMap<&str, Arc<Semaphore>> = spec
            .group_limits()
            .iter()
            .map(|(group, limit)| (group.as_str(), Arc::new(Semaphore::new(*limit))))
            .collect();

        self.sink.emit(ProgressEvent::start(json!({
            "pipeline": spec.name(),
            "steps": spec.len(),
        })));
        info!("Pipeline started");

        for (phase, names) in spec.phases().iter().enumerate() {
            debug!(phase, steps = ?names, "Launching ready set");

            let mut in_flight: FuturesUnordered<_> = names
                .iter()
                .filter_map(|name| spec.step(name))
                .map(|node| {
                    let input = build_input(node, &context, &initial);
                    let permits = node.group().as_deref().and_then(|g| groups.get(g)).cloned();
                    run_step(node, input, permits)
                })
                .collect();

            while let Some(settled) = in_flight.next().await {
                settled_steps += 1;
                settled_weight += u64::from(*settled.node.weight());
                let percent = progress(settled_weight, spec.total_weight(), settled_steps, spec.len());

                let record = self.settle(&settled, started.elapsed(), percent);
                if let StepRecord::Failed { class, message } = &record {
                    abort.get_or_insert_with(|| RunStatus::Aborted {
                        step: settled.node.name().clone(),
                        class: *class,
                        message: message.clone(),
                    });
                }
                if let Err(err) = context.record(settled.node.name().as_str(), record) {
                    error!(error = %err, "Step settled twice");
                }
            }

            if abort.is_some() {
                break;
            }
        }

        let status = match abort {
            Some(status) => {
                for node in spec.steps() {
                    if !context.contains(node.name()) {
                        debug!(step = %node.name(), "Skipping step after abort");
                        if let Err(err) = context.record(node.name().as_str(), StepRecord::Skipped) {
                            error!(error = %err, "Step skipped twice");
                        }
                    }
                }
                status
            }
            None => RunStatus::Completed,
        };

        let elapsed = started.elapsed();
        let percent = progress(settled_weight, spec.total_weight(), settled_steps, spec.len());
        let payload = match &status {
            RunStatus::Completed => json!({
                "status": "completed",
                "absent": context.count(|r| matches!(r, StepRecord::Absent { .. })),
            }),
            RunStatus::Aborted { step, class, .. } => json!({
                "status": "aborted",
                "failed_step": step,
                "class": class,
                "skipped": context.count(|r| matches!(r, StepRecord::Skipped)),
            }),
        };
        self.sink.emit(ProgressEvent::done(elapsed, percent, payload));

        match &status {
            RunStatus::Completed => info!(elapsed_ms = elapsed.as_millis() as u64, "Pipeline completed"),
            RunStatus::Aborted { step, class, .. } => {
                warn!(failed_step = %step, %class, elapsed_ms = elapsed.as_millis() as u64, "Pipeline aborted")
            }
        }

        PipelineRun {
            context,
            status,
            elapsed,
        }
    }

    /// Turn a finished step into its record and emit its event.
    fn settle(&self, settled: &Settled<'_>, elapsed: Duration, percent: u8) -> StepRecord {
        let node = settled.node;
        let latency_ms = settled.latency.as_millis() as u64;

        match &settled.result {
            Ok(output) => {
                debug!(step = %node.name(), latency_ms, "Step completed");
                self.sink.emit(ProgressEvent::step_complete(
                    node.name().as_str(),
                    elapsed,
                    percent,
                    json!({
                        "required": node.required(),
                        "latency_ms": latency_ms,
                        "output": output,
                    }),
                ));
                StepRecord::Completed {
                    output: output.clone(),
                }
            }
            Err(err) => {
                let class = err.class();
                let message = err.message();
                let required = *node.required();
                if required {
                    error!(step = %node.name(), %class, %message, "Required step failed");
                } else {
                    warn!(step = %node.name(), %class, %message, "Optional step failed, continuing without it");
                }
                self.sink.emit(ProgressEvent::step_error(
                    node.name().as_str(),
                    elapsed,
                    percent,
                    json!({
                        "required": required,
                        "class": class,
                        "message": message,
                    }),
                ));
                if required {
                    StepRecord::Failed { class, message }
                } else {
                    StepRecord::Absent { class, message }
                }
            }
        }
    }
}

/// Assemble a step's input from its predecessors' records.
fn build_input(node: &StepNode, context: &ExecutionContext, initial: &JsonValue) -> StepInput {
    node.after()
        .iter()
        .filter_map(|name| {
            context
                .get(name)
                .and_then(StepRecord::as_upstream)
                .map(|upstream| (name, upstream))
        })
        .fold(
            StepInput::new(node.name().as_str(), initial.clone()),
            |input, (name, upstream)| input.with_upstream(name.as_str(), upstream),
        )
}

async fn run_step(node: &StepNode, input: StepInput, permits: Option<Arc<Semaphore>>) -> Settled<'_> {
    // Closed semaphores are never produced here, so a failed acquire just runs unthrottled.
    let _permit = match &permits {
        Some(semaphore) => semaphore.acquire().await.ok(),
        None => None,
    };

    let started = Instant::now();
    let result = node.capability().execute(input).await;

    Settled {
        node,
        result,
        latency: started.elapsed(),
    }
}

fn progress(settled_weight: u64, total_weight: u64, settled_steps: usize, total_steps: usize) -> u8 {
    let percent = if total_weight > 0 {
        settled_weight * 100 / total_weight
    } else if total_steps > 0 {
        (settled_steps * 100 / total_steps) as u64
    } else {
        100
    };
    percent.min(100) as u8
}
