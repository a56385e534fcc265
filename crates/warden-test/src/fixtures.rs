//! Test fixtures for agents, engine events, and runtimes.

use std::sync::Arc;

use warden_approval::{ActionEvent, ApprovalPolicy, EngineEvent};
use warden_config::Config;
use warden_core::{ActionId, AgentId, MemoryOperation, ThreadId};
use warden_runtime::Warden;
use warden_storage::{KvStore, MemoryKvStore};

use crate::mocks::RecordingEngine;

/// The agent most tests act as.
pub const TEST_AGENT: &str = "agent-1";

/// Create the default test agent id.
#[must_use]
pub fn test_agent() -> AgentId {
    test_agent_named(TEST_AGENT)
}

/// Create a test agent id with a specific name.
///
/// # Panics
///
/// Panics if `name` is not a valid agent id.
#[must_use]
pub fn test_agent_named(name: &str) -> AgentId {
    AgentId::new(name).unwrap_or_else(|e| panic!("invalid test agent id '{name}': {e}"))
}

/// Create an output event.
#[must_use]
pub fn output_event(thread: &str, text: &str) -> EngineEvent {
    EngineEvent::Output {
        thread_id: ThreadId::new(thread),
        text: text.to_string(),
    }
}

/// Builder for memory action events.
///
/// Defaults to a `write` of `knowledge/notes.md` by [`TEST_AGENT`] through
/// the `update_memory` tool.
#[derive(Debug, Clone)]
pub struct ActionBuilder {
    event: ActionEvent,
}

impl ActionBuilder {
    /// Start an action in `thread` with engine id `action`.
    #[must_use]
    pub fn new(thread: &str, action: &str) -> Self {
        Self {
            event: ActionEvent {
                thread_id: ThreadId::new(thread),
                agent_id: test_agent(),
                action_id: ActionId::new(action),
                tool: "update_memory".to_string(),
                operation: MemoryOperation::Write,
                path: "knowledge/notes.md".to_string(),
                content: String::new(),
                reason: "test action".to_string(),
                policy: ApprovalPolicy::PerAgent,
            },
        }
    }

    /// Overwrite `path` with `content`.
    #[must_use]
    pub fn write(mut self, path: &str, content: &str) -> Self {
        self.event.operation = MemoryOperation::Write;
        self.event.path = path.to_string();
        self.event.content = content.to_string();
        self
    }

    /// Append `content` to `path`.
    #[must_use]
    pub fn append(mut self, path: &str, content: &str) -> Self {
        self.event.operation = MemoryOperation::Append;
        self.event.path = path.to_string();
        self.event.content = content.to_string();
        self
    }

    /// Delete `path`.
    #[must_use]
    pub fn delete(mut self, path: &str) -> Self {
        self.event.operation = MemoryOperation::Delete;
        self.event.path = path.to_string();
        self.event.content.clear();
        self
    }

    /// Act as `agent`.
    #[must_use]
    pub fn agent(mut self, agent: AgentId) -> Self {
        self.event.agent_id = agent;
        self
    }

    /// Call through `tool`.
    #[must_use]
    pub fn tool(mut self, tool: &str) -> Self {
        self.event.tool = tool.to_string();
        self
    }

    /// Set the agent's justification.
    #[must_use]
    pub fn reason(mut self, reason: &str) -> Self {
        self.event.reason = reason.to_string();
        self
    }

    /// Set the action's approval tag.
    #[must_use]
    pub fn policy(mut self, policy: ApprovalPolicy) -> Self {
        self.event.policy = policy;
        self
    }

    /// The action.
    #[must_use]
    pub fn build(self) -> ActionEvent {
        self.event
    }

    /// The action wrapped as an engine event.
    #[must_use]
    pub fn event(self) -> EngineEvent {
        EngineEvent::Action(self.event)
    }
}

/// An in-memory runtime with a healthy [`RecordingEngine`] registered.
///
/// # Panics
///
/// Panics if the default configuration cannot be wired.
pub async fn test_warden() -> (Warden, Arc<RecordingEngine>) {
    test_warden_with(&Config::default(), Arc::new(MemoryKvStore::new())).await
}

/// A runtime over `store` with a healthy [`RecordingEngine`] registered.
///
/// # Panics
///
/// Panics if `cfg` cannot be wired.
pub async fn test_warden_with(
    cfg: &Config,
    store: Arc<dyn KvStore>,
) -> (Warden, Arc<RecordingEngine>) {
    let warden = Warden::with_store(cfg, store)
        .await
        .unwrap_or_else(|e| panic!("failed to build test runtime: {e}"));
    let engine = RecordingEngine::new();
    warden.register_engine(engine.clone()).await;
    (warden, engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let action = ActionBuilder::new("t-1", "a-1").build();
        assert_eq!(action.agent_id, test_agent());
        assert_eq!(action.operation, MemoryOperation::Write);
        assert_eq!(action.tool, "update_memory");
    }

    #[test]
    fn test_builder_delete_clears_content() {
        let action = ActionBuilder::new("t-1", "a-1")
            .write("knowledge/a.md", "x")
            .delete("knowledge/a.md")
            .build();
        assert_eq!(action.operation, MemoryOperation::Delete);
        assert!(action.content.is_empty());
    }

    #[tokio::test]
    async fn test_warden_fixture_has_engine() {
        let (warden, engine) = test_warden().await;
        assert!(warden.pending_requests(None).await.unwrap().is_empty());
        assert_eq!(engine.call_count(), 0);
    }
}
