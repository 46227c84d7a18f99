//! Capability, provider and sink traits.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use timepoint_core::{CritiqueVerdict, ProgressEvent, ProviderRequest, ProviderResponse, StepInput};
use timepoint_error::{ProviderError, StepError};

/// Result type for step capabilities.
pub type StepResult<T> = Result<T, StepError>;

/// One opaque unit of generation work.
///
/// The orchestrator never inspects the payload; it only routes the output to
/// successors and acts on the [`StepError`] classification on failure.
#[async_trait]
pub trait StepCapability: Send + Sync {
    /// Capability name, used for logging and registry lookups.
    fn name(&self) -> &str;

    /// Produce this step's output from its input.
    async fn execute(&self, input: StepInput) -> StepResult<JsonValue>;
}

/// Secondary review of a step output.
#[async_trait]
pub trait CritiqueCapability: Send + Sync {
    /// Critique name, used for logging.
    fn name(&self) -> &str;

    /// Review `output` produced for `input`.
    ///
    /// Failures are tolerated by the caller and read as "no issues found".
    async fn review(&self, input: &StepInput, output: &JsonValue) -> StepResult<CritiqueVerdict>;
}

/// A backing model provider for one capability class.
///
/// Credentials are declared on the provider's descriptor, never on the
/// provider itself.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable provider id, matching configuration descriptors.
    fn id(&self) -> &str;

    /// Perform one call. Errors must be classified by the provider.
    async fn invoke(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}

/// Append-only consumer of progress events.
///
/// Emission must not block the scheduler; sinks that cannot keep up drop
/// events rather than apply backpressure.
pub trait ProgressSink: Send + Sync {
    /// Accept one event.
    fn emit(&self, event: ProgressEvent);
}
