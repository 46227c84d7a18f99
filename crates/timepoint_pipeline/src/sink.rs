//! Progress sinks.

use std::sync::Mutex;
use timepoint_core::{ProgressEvent, ProgressKind};
use timepoint_interface::ProgressSink;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{info, trace, warn};

/// Forwards events into an unbounded tokio channel.
///
/// Events sent after the receiver is dropped are discarded.
///
/// ```rust,ignore
/// let (sink, mut events) = ChannelSink::new();
/// let orchestrator = Orchestrator::new(Arc::new(sink));
/// tokio::spawn(async move {
///     while let Some(event) = events.recv().await {
///         println!("{} {}%", event.kind(), event.percent());
///     }
/// });
/// ```
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its channel.
    pub fn new() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        if self.sender.send(event).is_err() {
            trace!("Progress receiver dropped, discarding event");
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Event kinds in arrival order.
    pub fn kinds(&self) -> Vec<ProgressKind> {
        self.events().iter().map(|event| *event.kind()).collect()
    }

    /// Events of one kind for one step.
    pub fn for_step(&self, step: &str, kind: ProgressKind) -> Vec<ProgressEvent> {
        self.events()
            .into_iter()
            .filter(|event| *event.kind() == kind && event.step_name().as_deref() == Some(step))
            .collect()
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn emit(&self, event: ProgressEvent) {
        let step = event.step_name().as_deref().unwrap_or("-");
        let elapsed_ms = event.elapsed().as_millis() as u64;
        match event.kind() {
            ProgressKind::StepError => {
                warn!(step, elapsed_ms, percent = *event.percent(), payload = %event.payload(), "Step failed")
            }
            kind => {
                info!(%kind, step, elapsed_ms, percent = *event.percent(), "Pipeline progress")
            }
        }
    }
}
