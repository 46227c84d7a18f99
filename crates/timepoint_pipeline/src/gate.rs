//! Bounded critique-and-revise wrapper.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use timepoint_core::{CritiqueVerdict, StepInput};
use timepoint_interface::{CritiqueCapability, StepCapability, StepResult};
use tracing::{debug, info, instrument, warn};

/// Run `step`, review its output, and revise at most once.
///
/// If the first verdict demands a retry, the step runs again with the
/// verdict's issues merged into its input as corrections. The second output
/// is reviewed for the record but returned whatever that verdict says, so the
/// step executes at most twice. A failing critique counts as a clean verdict,
/// and a failing second pass falls back to the first output.
///
/// # Errors
///
/// Returns the step's error if its first execution fails.
#[instrument(skip_all, fields(step = %input.step(), critic = critic.name()))]
pub async fn execute_with_gate(
    step: &dyn StepCapability,
    input: StepInput,
    critic: &dyn CritiqueCapability,
) -> StepResult<JsonValue> {
    let first = step.execute(input.clone()).await?;

    let verdict = review(critic, &input, &first).await;
    if !verdict.must_retry {
        debug!(issues = verdict.issues.len(), "Critique passed");
        return Ok(first);
    }

    info!(issues = verdict.issues.len(), "Critique requested a revision");
    let revised_input = input.with_corrections(verdict.issues);

    let second = match step.execute(revised_input.clone()).await {
        Ok(output) => output,
        Err(err) => {
            warn!(error = %err, "Revision failed, keeping first output");
            return Ok(first);
        }
    };

    let final_verdict = review(critic, &revised_input, &second).await;
    if final_verdict.must_retry {
        warn!(
            issues = final_verdict.issues.len(),
            "Revision still flagged, accepting it anyway"
        );
    }
    Ok(second)
}

async fn review(
    critic: &dyn CritiqueCapability,
    input: &StepInput,
    output: &JsonValue,
) -> CritiqueVerdict {
    match critic.review(input, output).await {
        Ok(verdict) => verdict,
        Err(err) => {
            warn!(error = %err, "Critique failed, treating as no issues");
            CritiqueVerdict::clean()
        }
    }
}

/// A [`StepCapability`] wrapped in a critique gate.
///
/// The orchestrator sees one step, so a gated step emits a single
/// `step_complete` event however many passes it took.
#[derive(Clone)]
pub struct CritiqueGate {
    step: Arc<dyn StepCapability>,
    critic: Arc<dyn CritiqueCapability>,
}

impl CritiqueGate {
    /// Gate `step` behind `critic`.
    pub fn new(step: Arc<dyn StepCapability>, critic: Arc<dyn CritiqueCapability>) -> Self {
        Self { step, critic }
    }
}

impl std::fmt::Debug for CritiqueGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CritiqueGate")
            .field("step", &self.step.name())
            .field("critic", &self.critic.name())
            .finish()
    }
}

#[async_trait]
impl StepCapability for CritiqueGate {
    fn name(&self) -> &str {
        self.step.name()
    }

    async fn execute(&self, input: StepInput) -> StepResult<JsonValue> {
        execute_with_gate(self.step.as_ref(), input, self.critic.as_ref()).await
    }
}
