use serde_json::json;
use std::time::Duration;
use timepoint_core::{ProgressEvent, ProgressKind};
use timepoint_interface::ProgressSink;
use timepoint_pipeline::{ChannelSink, CollectingSink, TracingSink};

#[tokio::test]
async fn channel_sink_forwards_events_in_order() {
    let (sink, mut receiver) = ChannelSink::new();

    sink.emit(ProgressEvent::start(json!({})));
    sink.emit(ProgressEvent::done(Duration::from_millis(5), 100, json!({"status": "completed"})));

    assert_eq!(*receiver.recv().await.unwrap().kind(), ProgressKind::Start);
    assert_eq!(*receiver.recv().await.unwrap().kind(), ProgressKind::Done);
}

#[test]
fn channel_sink_tolerates_dropped_receiver() {
    let (sink, receiver) = ChannelSink::new();
    drop(receiver);

    sink.emit(ProgressEvent::start(json!({})));
}

#[test]
fn collecting_sink_filters_by_step() {
    let sink = CollectingSink::new();
    sink.emit(ProgressEvent::step_complete("scene", Duration::ZERO, 10, json!({})));
    sink.emit(ProgressEvent::step_error("image", Duration::ZERO, 20, json!({})));
    TracingSink.emit(ProgressEvent::start(json!({})));

    assert_eq!(sink.events().len(), 2);
    assert_eq!(sink.for_step("image", ProgressKind::StepError).len(), 1);
    assert!(sink.for_step("scene", ProgressKind::StepError).is_empty());
}
