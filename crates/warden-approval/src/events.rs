//! Messages exchanged with the presentation layer, and the bus that carries
//! outbound ones.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, trace};
use warden_core::{AgentId, MemoryOperation, RequestId, ThreadId};
use warden_scan::SuspiciousFlag;

use crate::request::{ApprovalRequest, Decision, RequestStatus};

/// Default channel capacity for the interrupt bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Outbound notification for reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InterruptEvent {
    /// A thread paused on a new approval request.
    InterruptCreated {
        /// The new request.
        request_id: RequestId,
        /// Owning agent.
        agent_id: AgentId,
        /// The paused thread.
        thread_id: ThreadId,
        /// Normalized target path.
        path: String,
        /// Proposed operation.
        operation: MemoryOperation,
        /// Existing content, if any.
        previous_content: Option<String>,
        /// Proposed content.
        proposed_content: String,
        /// Agent's justification.
        reason: String,
        /// Scanner output.
        flags: Vec<SuspiciousFlag>,
    },

    /// A request was decided.
    InterruptResolved {
        /// The decided request.
        request_id: RequestId,
        /// Owning agent.
        agent_id: AgentId,
        /// The thread that was paused.
        thread_id: ThreadId,
        /// Whether the decision was applied and the engine resumed.
        success: bool,
        /// Terminal status.
        status: RequestStatus,
        /// Path that was written, for applied decisions.
        #[serde(skip_serializing_if = "Option::is_none")]
        applied_path: Option<String>,
    },

    /// Output that was held while its thread was paused.
    OutputReleased {
        /// The thread that produced the output.
        thread_id: ThreadId,
        /// The held text.
        text: String,
    },
}

impl InterruptEvent {
    /// Build `interrupt_created` from a freshly recorded request.
    #[must_use]
    pub fn created(request: &ApprovalRequest) -> Self {
        Self::InterruptCreated {
            request_id: request.id,
            agent_id: request.agent_id.clone(),
            thread_id: request.thread_id.clone(),
            path: request.target_path.clone(),
            operation: request.operation,
            previous_content: request.previous_content.clone(),
            proposed_content: request.proposed_content.clone(),
            reason: request.reason.clone(),
            flags: request.flags.clone(),
        }
    }

    /// Build `interrupt_resolved` from a decided request.
    #[must_use]
    pub fn resolved(request: &ApprovalRequest, resumed: bool) -> Self {
        Self::InterruptResolved {
            request_id: request.id,
            agent_id: request.agent_id.clone(),
            thread_id: request.thread_id.clone(),
            success: resumed,
            status: request.status,
            applied_path: request
                .status
                .is_applied()
                .then(|| request.target_path.clone()),
        }
    }

    /// Stable event name, matching the serialized `type` tag.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::InterruptCreated { .. } => "interrupt_created",
            Self::InterruptResolved { .. } => "interrupt_resolved",
            Self::OutputReleased { .. } => "output_released",
        }
    }

    /// The thread the event concerns.
    #[must_use]
    pub fn thread_id(&self) -> &ThreadId {
        match self {
            Self::InterruptCreated { thread_id, .. }
            | Self::InterruptResolved { thread_id, .. }
            | Self::OutputReleased { thread_id, .. } => thread_id,
        }
    }
}

/// Payload of an inbound `decision_submitted` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionSubmitted {
    /// The request being decided.
    pub request_id: RequestId,
    /// The decision and, for edits, the replacement.
    #[serde(flatten)]
    pub decision: Decision,
}

/// Inbound message from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// A reviewer decided a request.
    DecisionSubmitted(DecisionSubmitted),
}

/// Broadcast channel for [`InterruptEvent`]s.
#[derive(Debug, Clone)]
pub struct InterruptBus {
    sender: broadcast::Sender<Arc<InterruptEvent>>,
}

impl InterruptBus {
    /// Create a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with a specific capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Returns the number of receivers that got it.
    pub fn publish(&self, event: InterruptEvent) -> usize {
        let event = Arc::new(event);
        if let Ok(count) = self.sender.send(Arc::clone(&event)) {
            debug!(
                event_type = event.event_type(),
                receiver_count = count,
                "Interrupt event published"
            );
            count
        } else {
            trace!(event_type = event.event_type(), "No receivers for interrupt event");
            0
        }
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<InterruptEvent>> {
        self.sender.subscribe()
    }

    /// Number of live receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for InterruptBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::ActionId;
    use warden_memory::PathResolver;

    fn request() -> ApprovalRequest {
        let agent = AgentId::new("a1").unwrap();
        let target = PathResolver::default()
            .resolve(&agent, "knowledge/x.md")
            .unwrap();
        ApprovalRequest::new(
            ThreadId::new("t1"),
            ActionId::new("call-1"),
            MemoryOperation::Write,
            &target,
            "hello",
            "because",
        )
    }

    #[test]
    fn test_created_event_shape() {
        let req = request();
        let json = serde_json::to_value(InterruptEvent::created(&req)).unwrap();
        assert_eq!(json["type"], "interrupt_created");
        assert_eq!(json["path"], "knowledge/x.md");
        assert_eq!(json["operation"], "write");
        assert!(json["previous_content"].is_null());
        assert_eq!(json["flags"], serde_json::json!([]));
    }

    #[test]
    fn test_resolved_event_applied_path() {
        let mut req = request();
        req.status = RequestStatus::Applied;
        let event = InterruptEvent::resolved(&req, true);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "interrupt_resolved");
        assert_eq!(json["success"], true);
        assert_eq!(json["applied_path"], "knowledge/x.md");

        req.status = RequestStatus::Discarded;
        let json = serde_json::to_value(InterruptEvent::resolved(&req, true)).unwrap();
        assert!(json.get("applied_path").is_none());
    }

    #[test]
    fn test_resolved_event_reports_resume_once() {
        let mut req = request();
        req.status = RequestStatus::Applied;
        let json = serde_json::to_value(InterruptEvent::resolved(&req, false)).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("resumed").is_none());
    }

    #[test]
    fn test_inbound_decision_parsing() {
        let id = RequestId::new();
        let raw = format!(
            r#"{{"type":"decision_submitted","request_id":"{}","decision":"edit","edited_content":"fixed"}}"#,
            id.0
        );
        let InboundMessage::DecisionSubmitted(msg) = serde_json::from_str(&raw).unwrap();
        assert_eq!(msg.request_id, id);
        assert_eq!(
            msg.decision,
            Decision::Edit {
                content: "fixed".into()
            }
        );

        let raw = format!(
            r#"{{"type":"decision_submitted","request_id":"{}","decision":"reject"}}"#,
            id.0
        );
        let InboundMessage::DecisionSubmitted(msg) = serde_json::from_str(&raw).unwrap();
        assert_eq!(msg.decision, Decision::Reject);
    }

    #[tokio::test]
    async fn test_bus_delivers_to_subscribers() {
        let bus = InterruptBus::new();
        assert_eq!(bus.publish(InterruptEvent::created(&request())), 0);

        let mut rx = bus.subscribe();
        assert_eq!(bus.receiver_count(), 1);
        assert_eq!(bus.publish(InterruptEvent::created(&request())), 1);
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "interrupt_created");
        assert_eq!(event.thread_id().as_str(), "t1");
    }
}
