use serde_json::json;
use timepoint_core::{
    CritiqueIssue, CritiqueVerdict, ErrorClass, ProgressEvent, Severity, StepInput, Upstream,
};

#[test]
fn corrections_append_in_order() {
    let input = StepInput::new("dialog", json!({}))
        .with_corrections(vec![CritiqueIssue::new(Severity::Major, "first")])
        .with_corrections(vec![CritiqueIssue::new(Severity::Minor, "second")]);

    assert!(input.is_revision());
    let descriptions: Vec<_> = input
        .corrections()
        .iter()
        .map(|issue| issue.description.as_str())
        .collect();
    assert_eq!(descriptions, vec!["first", "second"]);
}

#[test]
fn missing_upstream_has_no_value() {
    let input = StepInput::new("scene", json!(null)).with_upstream(
        "image",
        Upstream::Missing {
            class: ErrorClass::QuotaExhausted,
        },
    );

    assert_eq!(input.value("image"), None);
    assert!(input.is_missing("image"));
    assert!(!input.is_missing("never_declared"));
}

#[test]
fn attachments_replace_previous_values() {
    let input = StepInput::new("dialog", json!(null))
        .attach("narrative_arc", json!(1))
        .attach("narrative_arc", json!(2));

    assert_eq!(input.extra("narrative_arc"), Some(&json!(2)));
}

#[test]
fn step_input_serializes_missing_upstream_with_status() {
    let input = StepInput::new("scene", json!(null)).with_upstream(
        "image",
        Upstream::Missing {
            class: ErrorClass::Transient,
        },
    );

    let value = serde_json::to_value(&input).unwrap();
    assert_eq!(value["upstream"]["image"]["status"], json!("missing"));
    assert_eq!(value["upstream"]["image"]["class"], json!("transient"));
}

#[test]
fn severity_parses_case_insensitively() {
    assert_eq!("MAJOR".parse::<Severity>().unwrap(), Severity::Major);
    assert!(Severity::Critical > Severity::Moderate);
}

#[test]
fn clean_verdict_never_retries() {
    let verdict = CritiqueVerdict::clean();
    assert!(verdict.issues.is_empty());
    assert!(!verdict.must_retry);
}

#[test]
fn aborted_done_event_is_detected() {
    let done = ProgressEvent::done(
        std::time::Duration::ZERO,
        40,
        json!({"status": "aborted", "failed_step": "timeline"}),
    );
    assert!(done.is_terminal());
    assert!(done.is_aborted());

    let ok = ProgressEvent::done(std::time::Duration::ZERO, 100, json!({"status": "completed"}));
    assert!(!ok.is_aborted());
}
