//! Shared helpers for integration tests.

use std::sync::Arc;

use tokio::sync::broadcast;
use warden_approval::{ApprovalRequest, InterruptEvent, Observation};
use warden_core::AgentId;
use warden_runtime::Warden;

/// Unwrap an `Interrupted` observation.
#[allow(dead_code)]
pub fn interrupted(observation: Observation) -> ApprovalRequest {
    match observation {
        Observation::Interrupted(request) => request,
        other => panic!("expected interrupt, got {other:?}"),
    }
}

/// Current content of `path` in `agent`'s memory, if the file exists.
#[allow(dead_code)]
pub async fn read_memory(warden: &Warden, agent: &AgentId, path: &str) -> Option<String> {
    let resolved = warden
        .memory()
        .resolve(agent, path)
        .expect("test path should resolve");
    warden
        .memory()
        .read_optional(&resolved)
        .await
        .expect("memory read failed")
        .map(|entry| entry.content)
}

/// Every event currently buffered on `rx`.
#[allow(dead_code)]
pub fn drain(rx: &mut broadcast::Receiver<Arc<InterruptEvent>>) -> Vec<Arc<InterruptEvent>> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Event type names, in order.
#[allow(dead_code)]
pub fn event_types(events: &[Arc<InterruptEvent>]) -> Vec<&'static str> {
    events.iter().map(|e| e.event_type()).collect()
}
