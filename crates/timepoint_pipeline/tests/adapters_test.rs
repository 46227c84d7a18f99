mod test_utils;

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use test_utils::MockStep;
use timepoint_core::{
    AuthRequirement, CapabilityClass, ErrorClass, ProviderRequest, ProviderResponse, StepInput,
    Upstream,
};
use timepoint_error::ProviderError;
use timepoint_interface::{Provider, StepCapability};
use timepoint_pipeline::{ArcDirectedStep, ArcSources, FieldRef, NARRATIVE_ARC_KEY, RoutedStep};
use timepoint_router::{
    ActionTable, BackoffPolicy, ProviderDescriptor, ProviderRouter, RoutingPolicy,
};

/// Echoes the request step name, or fails with a fixed class.
struct EchoProvider {
    id: &'static str,
    failure: Option<ErrorClass>,
    calls: AtomicUsize,
}

impl EchoProvider {
    fn new(id: &'static str, failure: Option<ErrorClass>) -> Arc<Self> {
        Arc::new(Self {
            id,
            failure,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Provider for EchoProvider {
    fn id(&self) -> &str {
        self.id
    }

    async fn invoke(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(class) => Err(ProviderError::new(class, "scripted")),
            None => Ok(ProviderResponse::new(json!({
                "provider": self.id,
                "step": request.step(),
                "query": request.payload()["initial"]["query"],
            }))),
        }
    }
}

fn policy() -> RoutingPolicy {
    RoutingPolicy::new(
        ActionTable::default(),
        BackoffPolicy::new(Duration::from_millis(1), Duration::from_millis(10), false),
        Duration::from_secs(1),
    )
    .unwrap()
}

fn descriptor(id: &str, auth: AuthRequirement, infallible: bool) -> ProviderDescriptor {
    ProviderDescriptor::builder()
        .provider_id(id)
        .auth(auth)
        .max_retries(1u32)
        .infallible(infallible)
        .build()
        .unwrap()
}

#[tokio::test]
async fn routed_step_returns_winning_payload() {
    let primary = EchoProvider::new("primary", Some(ErrorClass::QuotaExhausted));
    let backup = EchoProvider::new("backup", None);
    let router = ProviderRouter::builder(policy())
        .tier(CapabilityClass::Text, descriptor("primary", AuthRequirement::ApiKey, false), primary.clone())
        .tier(CapabilityClass::Text, descriptor("backup", AuthRequirement::ApiKey, false), backup)
        .build()
        .unwrap();

    let step = RoutedStep::new("timeline", CapabilityClass::Text, Arc::new(router));
    let output = step
        .execute(StepInput::new("timeline", json!({"query": "Pompeii 79"})))
        .await
        .unwrap();

    assert_eq!(output["provider"], json!("backup"));
    assert_eq!(output["step"], json!("timeline"));
    assert_eq!(output["query"], json!("Pompeii 79"));
    assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn routed_step_surfaces_classified_failure() {
    let only = EchoProvider::new("only", Some(ErrorClass::AuthFailed));
    let router = ProviderRouter::builder(policy())
        .tier(CapabilityClass::Text, descriptor("only", AuthRequirement::ApiKey, false), only)
        .build()
        .unwrap();

    let step = RoutedStep::new("judge", CapabilityClass::Text, Arc::new(router));
    let err = step
        .execute(StepInput::new("judge", json!({})))
        .await
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::AuthFailed);
}

#[tokio::test]
async fn routed_image_step_yields_null_when_last_tier_fails() {
    let open = EchoProvider::new("open", Some(ErrorClass::Transient));
    let router = ProviderRouter::builder(policy())
        .tier(CapabilityClass::Image, descriptor("open", AuthRequirement::None, true), open)
        .build()
        .unwrap();

    let step = RoutedStep::new("image", CapabilityClass::Image, Arc::new(router));
    let output = step.execute(StepInput::new("image", json!({}))).await.unwrap();

    assert!(output.is_null());
}

fn dialog_input(tension: serde_json::Value) -> StepInput {
    StepInput::new("dialog", json!({}))
        .with_upstream("judge", Upstream::Value { value: json!({"tension": tension}) })
        .with_upstream(
            "characters",
            Upstream::Value {
                value: json!({"characters": [
                    {"name": "Cleopatra", "tier": "focal"},
                    {"name": "Antony", "tier": "focal"},
                    "Charmion",
                    {"name": "Guard", "tier": "background"},
                ]}),
            },
        )
        .with_upstream("moment", Upstream::Value { value: json!({"dialog_lines": 10}) })
}

#[tokio::test]
async fn arc_is_attached_to_inner_input() {
    let inner = MockStep::ok("dialog", json!("lines")).shared();
    let step = ArcDirectedStep::new(inner.clone(), ArcSources::default());
    assert_eq!(step.name(), "dialog");

    let output = step.execute(dialog_input(json!("tragic fall"))).await.unwrap();
    assert_eq!(output, json!("lines"));

    let received = inner.last_input().unwrap();
    let arc = received.extra(NARRATIVE_ARC_KEY).unwrap();
    assert_eq!(arc["shape"], json!("tragic_fall"));
    assert_eq!(arc["requested_beats"], json!(10));
    assert_eq!(arc["beats"].as_array().unwrap().len(), 7);
    assert_eq!(arc["beats"][0]["speaker"], json!("Cleopatra"));
}

#[tokio::test]
async fn missing_sources_run_without_arc() {
    let inner = MockStep::ok("dialog", json!("lines")).shared();
    let step = ArcDirectedStep::new(inner.clone(), ArcSources::default());

    let input = StepInput::new("dialog", json!({}))
        .with_upstream("judge", Upstream::Missing { class: ErrorClass::Transient });
    step.execute(input).await.unwrap();

    assert!(inner.last_input().unwrap().extra(NARRATIVE_ARC_KEY).is_none());
}

#[tokio::test]
async fn unknown_tension_is_a_validation_error() {
    let inner = MockStep::ok("dialog", json!("lines")).shared();
    let step = ArcDirectedStep::new(inner.clone(), ArcSources::default());

    let err = step.execute(dialog_input(json!("whimsical"))).await.unwrap_err();

    assert_eq!(err.class(), ErrorClass::Validation);
    assert_eq!(inner.calls(), 0);
}

#[tokio::test]
async fn custom_sources_are_honoured() {
    let inner = MockStep::ok("dialog", json!("lines")).shared();
    let sources = ArcSources {
        tension: FieldRef::new("mood", ""),
        cast: FieldRef::new("people", ""),
        beats: None,
    };
    let step = ArcDirectedStep::new(inner.clone(), sources);

    let input = StepInput::new("dialog", json!({}))
        .with_upstream("mood", Upstream::Value { value: json!("Climactic") })
        .with_upstream("people", Upstream::Value { value: json!(["Ada", "Grace"]) });
    step.execute(input).await.unwrap();

    let arc = inner.last_input().unwrap().extra(NARRATIVE_ARC_KEY).cloned().unwrap();
    assert_eq!(arc["shape"], json!("climactic"));
    assert_eq!(arc["requested_beats"], json!(7));
}
