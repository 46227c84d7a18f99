//! End-to-end scenarios across router, gate and orchestrator.

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use timepoint::{
    ActionTable, AuthRequirement, BackoffPolicy, CapabilityClass, CollectingSink,
    CritiqueCapability, CritiqueIssue, CritiqueGate, CritiqueVerdict, ErrorClass, Orchestrator,
    PipelineSpec, ProgressKind, Provider, ProviderDescriptor, ProviderError, ProviderRequest,
    ProviderResponse, ProviderRouter, Resolution, RoutedStep, RoutingPolicy, RunStatus, Severity,
    StepCapability, StepInput, StepNode, StepRecord, StepResult,
};

struct FixedProvider {
    id: &'static str,
    failure: Option<ErrorClass>,
    calls: AtomicUsize,
}

impl FixedProvider {
    fn new(id: &'static str, failure: Option<ErrorClass>) -> Arc<Self> {
        Arc::new(Self {
            id,
            failure,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for FixedProvider {
    fn id(&self) -> &str {
        self.id
    }

    async fn invoke(&self, _request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(class) => Err(ProviderError::new(class, format!("{} unavailable", self.id))),
            None => Ok(ProviderResponse::new(json!({"from": self.id}))),
        }
    }
}

struct CountingStep {
    name: &'static str,
    calls: AtomicUsize,
}

impl CountingStep {
    fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StepCapability for CountingStep {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self, input: StepInput) -> StepResult<JsonValue> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"step": self.name, "call": call, "revision": input.is_revision()}))
    }
}

struct ScriptedCritic {
    verdicts: Mutex<VecDeque<CritiqueVerdict>>,
}

#[async_trait]
impl CritiqueCapability for ScriptedCritic {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn review(&self, _input: &StepInput, _output: &JsonValue) -> StepResult<CritiqueVerdict> {
        Ok(self
            .verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}

fn policy() -> RoutingPolicy {
    RoutingPolicy::new(
        ActionTable::default(),
        BackoffPolicy::new(Duration::from_millis(1), Duration::from_millis(20), true),
        Duration::from_secs(1),
    )
    .unwrap()
}

fn tier(id: &str, auth: AuthRequirement, retries: u32, infallible: bool) -> ProviderDescriptor {
    ProviderDescriptor::builder()
        .provider_id(id)
        .auth(auth)
        .max_retries(retries)
        .infallible(infallible)
        .build()
        .unwrap()
}

/// Optional step exhausting every provider leaves the rest of the run intact.
#[tokio::test]
async fn scenario_a_optional_step_exhausts_providers() {
    let first = FixedProvider::new("first", Some(ErrorClass::Transient));
    let second = FixedProvider::new("second", Some(ErrorClass::Transient));
    let router = ProviderRouter::builder(policy())
        .tier(CapabilityClass::Text, tier("first", AuthRequirement::ApiKey, 3, false), first.clone())
        .tier(CapabilityClass::Text, tier("second", AuthRequirement::ApiKey, 3, false), second.clone())
        .build()
        .unwrap();
    let flaky: Arc<dyn StepCapability> =
        Arc::new(RoutedStep::new("graph", CapabilityClass::Text, Arc::new(router)));

    let spec = PipelineSpec::builder("scenario-a")
        .step(StepNode::new("judge", CountingStep::new("judge")))
        .step(StepNode::new("timeline", CountingStep::new("timeline")).depends_on(["judge"]))
        .step(StepNode::new("scene", CountingStep::new("scene")).depends_on(["timeline"]))
        .step(StepNode::new("graph", flaky).depends_on(["timeline"]).optional())
        .step(StepNode::new("moment", CountingStep::new("moment")).depends_on(["timeline"]))
        .step(
            StepNode::new("image_prompt", CountingStep::new("image_prompt"))
                .depends_on(["scene", "graph", "moment"]),
        )
        .build()
        .unwrap();

    let run = Orchestrator::default().run(&spec, json!({"query": "Krakatoa 1883"})).await;

    assert_eq!(*run.status(), RunStatus::Completed);
    assert!(run.context().is_absent("graph"));
    assert_eq!(first.calls(), 4);
    assert_eq!(second.calls(), 4);
    for step in ["judge", "timeline", "scene", "moment", "image_prompt"] {
        assert!(run.context().output(step).is_some(), "{step} missing");
    }
}

/// Quota then auth failure resolve through the open tier.
#[tokio::test]
async fn scenario_b_image_falls_through_to_open_tier() {
    let google = FixedProvider::new("google", Some(ErrorClass::QuotaExhausted));
    let openrouter = FixedProvider::new("openrouter", Some(ErrorClass::AuthFailed));
    let pollinations = FixedProvider::new("pollinations", None);

    let router = ProviderRouter::builder(policy())
        .tier(CapabilityClass::Image, tier("google", AuthRequirement::ApiKey, 3, false), google.clone())
        .tier(CapabilityClass::Image, tier("openrouter", AuthRequirement::ApiKey, 3, false), openrouter.clone())
        .tier(CapabilityClass::Image, tier("pollinations", AuthRequirement::None, 0, true), pollinations.clone())
        .build()
        .unwrap();

    let request = ProviderRequest::new(CapabilityClass::Image, "image", json!({"prompt": "harbor"}));
    let outcome = router.call(&request).await;

    assert!(matches!(
        outcome.resolution(),
        Resolution::Success { provider_id, .. } if provider_id == "pollinations"
    ));
    assert_eq!(outcome.attempts_for("google").count(), 1);
    assert_eq!(outcome.attempts_for("openrouter").count(), 1);
    assert_eq!(outcome.retries_on("google"), 0);
    assert_eq!(outcome.retries_on("openrouter"), 0);
    assert_eq!(google.calls(), 1);
    assert_eq!(openrouter.calls(), 1);
    assert_eq!(pollinations.calls(), 1);

    let step = RoutedStep::new("image", CapabilityClass::Image, Arc::new(router));
    let output = step.execute(StepInput::new("image", json!({}))).await.unwrap();
    assert_eq!(output, json!({"from": "pollinations"}));
}

/// A flagged dialog is revised exactly once and reported once.
#[tokio::test]
async fn scenario_c_dialog_revised_once() {
    let dialog = CountingStep::new("dialog");
    let critic = Arc::new(ScriptedCritic {
        verdicts: Mutex::new(VecDeque::from([
            CritiqueVerdict::new(
                vec![CritiqueIssue::new(Severity::Major, "speakers repeat")],
                true,
            ),
            CritiqueVerdict::clean(),
        ])),
    });
    let gated: Arc<dyn StepCapability> = Arc::new(CritiqueGate::new(dialog.clone(), critic));

    let spec = PipelineSpec::builder("scenario-c")
        .step(StepNode::new("characters", CountingStep::new("characters")))
        .step(StepNode::new("dialog", gated).depends_on(["characters"]))
        .build()
        .unwrap();

    let sink = Arc::new(CollectingSink::new());
    let run = Orchestrator::new(sink.clone()).run(&spec, json!({})).await;

    assert!(run.is_completed());
    assert_eq!(dialog.calls(), 2);
    assert_eq!(run.context().output("dialog").unwrap()["revision"], json!(true));
    assert_eq!(sink.for_step("dialog", ProgressKind::StepComplete).len(), 1);
}

/// A required step failing on auth aborts and skips its dependents.
#[tokio::test]
async fn scenario_d_required_auth_failure_aborts() {
    let locked = FixedProvider::new("locked", Some(ErrorClass::AuthFailed));
    let router = ProviderRouter::builder(policy())
        .tier(CapabilityClass::Text, tier("locked", AuthRequirement::ApiKey, 3, false), locked.clone())
        .build()
        .unwrap();
    let moment: Arc<dyn StepCapability> =
        Arc::new(RoutedStep::new("moment", CapabilityClass::Text, Arc::new(router)));

    let dialog = CountingStep::new("dialog");
    let image_prompt = CountingStep::new("image_prompt");

    let spec = PipelineSpec::builder("scenario-d")
        .step(StepNode::new("timeline", CountingStep::new("timeline")))
        .step(StepNode::new("moment", moment).depends_on(["timeline"]))
        .step(StepNode::new("dialog", dialog.clone()).depends_on(["moment"]))
        .step(StepNode::new("image_prompt", image_prompt.clone()).depends_on(["dialog"]))
        .build()
        .unwrap();

    let sink = Arc::new(CollectingSink::new());
    let run = Orchestrator::new(sink.clone()).run(&spec, json!({})).await;

    assert!(matches!(
        run.status(),
        RunStatus::Aborted { step, class: ErrorClass::AuthFailed, .. } if step == "moment"
    ));
    assert_eq!(locked.calls(), 1);
    assert_eq!(dialog.calls(), 0);
    assert_eq!(image_prompt.calls(), 0);
    assert_eq!(run.context().get("dialog"), Some(&StepRecord::Skipped));
    assert_eq!(run.context().get("image_prompt"), Some(&StepRecord::Skipped));
    assert!(matches!(run.context().get("moment"), Some(StepRecord::Failed { .. })));

    let done = sink.events().last().cloned().unwrap();
    assert!(done.is_aborted());
    assert_eq!(done.payload()["failed_step"], json!("moment"));
}
