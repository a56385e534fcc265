//! Correlation context for tracing.
//!
//! A [`RequestContext`] follows one unit of work (an observed engine event or
//! a submitted decision) and produces a span carrying its identifiers, so
//! every log line emitted inside can be tied back to the agent, thread, and
//! approval request involved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifiers carried through one unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Unique id of this unit of work.
    pub trace_id: Uuid,
    /// Id shared by related units of work.
    pub correlation_id: Uuid,
    /// Component that created the context.
    pub source: String,
    /// Operation being performed.
    pub operation: Option<String>,
    /// Agent involved, if known.
    pub agent_id: Option<String>,
    /// Conversation thread involved, if known.
    pub thread_id: Option<String>,
    /// Approval request involved, if known.
    pub approval_id: Option<String>,
    /// When the context was created.
    pub started_at: DateTime<Utc>,
}

impl RequestContext {
    /// Create a context for `source`.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        let id = Uuid::new_v4();
        Self {
            trace_id: id,
            correlation_id: id,
            source: source.into(),
            operation: None,
            agent_id: None,
            thread_id: None,
            approval_id: None,
            started_at: Utc::now(),
        }
    }

    /// Derive a context for follow-up work that shares the correlation id.
    #[must_use]
    pub fn child(&self, source: impl Into<String>) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            source: source.into(),
            operation: None,
            started_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Set the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Set the agent.
    #[must_use]
    pub fn with_agent(mut self, agent_id: impl ToString) -> Self {
        self.agent_id = Some(agent_id.to_string());
        self
    }

    /// Set the thread.
    #[must_use]
    pub fn with_thread(mut self, thread_id: impl ToString) -> Self {
        self.thread_id = Some(thread_id.to_string());
        self
    }

    /// Set the approval request.
    #[must_use]
    pub fn with_approval(mut self, approval_id: impl ToString) -> Self {
        self.approval_id = Some(approval_id.to_string());
        self
    }

    /// Milliseconds since the context was created.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds()
    }

    /// A span carrying this context's identifiers.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "warden",
            trace_id = %self.trace_id,
            correlation_id = %self.correlation_id,
            source = %self.source,
            operation = self.operation.as_deref(),
            agent_id = self.agent_id.as_deref(),
            thread_id = self.thread_id.as_deref(),
            approval_id = self.approval_id.as_deref(),
        )
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new("unknown")
    }
}

/// Enters a context's span and logs its duration on drop.
pub struct RequestGuard {
    context: RequestContext,
    _span: tracing::span::EnteredSpan,
}

impl RequestGuard {
    /// Enter `context`'s span.
    #[must_use]
    pub fn new(context: RequestContext) -> Self {
        let span = context.span().entered();
        tracing::debug!("Request started");
        Self {
            context,
            _span: span,
        }
    }

    /// The guarded context.
    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &self.context
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        tracing::debug!(elapsed_ms = self.context.elapsed_ms(), "Request completed");
    }
}
