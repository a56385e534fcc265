//! Approval request, status, and decision types.

use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::{ActionId, AgentId, MemoryOperation, RequestId, ThreadId, Timestamp};
use warden_memory::ResolvedPath;
use warden_scan::{Severity, SuspiciousFlag};

use crate::error::{ApprovalError, ApprovalResult};

/// Lifecycle state of an approval request.
///
/// A request starts `Pending` and moves exactly once to a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Waiting for a human decision.
    Pending,
    /// Approved; the proposed content was applied.
    Applied,
    /// Approved with a replacement; the edited content was applied.
    AppliedWithEdits,
    /// Rejected; nothing was applied.
    Discarded,
}

impl RequestStatus {
    /// Whether no further transitions are possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether the memory store was mutated.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied | Self::AppliedWithEdits)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Applied => write!(f, "applied"),
            Self::AppliedWithEdits => write!(f, "applied_with_edits"),
            Self::Discarded => write!(f, "discarded"),
        }
    }
}

/// A human decision on a pending request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Apply the proposed content as-is.
    Approve,
    /// Apply a reviewer-supplied replacement instead.
    Edit {
        /// The replacement content.
        #[serde(rename = "edited_content")]
        content: String,
    },
    /// Apply nothing.
    Reject,
}

impl Decision {
    /// Stable lowercase name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Edit { .. } => "edit",
            Self::Reject => "reject",
        }
    }

    /// The terminal status this decision produces.
    #[must_use]
    pub fn target_status(&self) -> RequestStatus {
        match self {
            Self::Approve => RequestStatus::Applied,
            Self::Edit { .. } => RequestStatus::AppliedWithEdits,
            Self::Reject => RequestStatus::Discarded,
        }
    }
}

/// The terminal state recorded when a request is decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Terminal status.
    pub status: RequestStatus,
    /// Content that was written, if any.
    pub applied_content: Option<String>,
}

/// A paused memory action awaiting a human decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Correlation id, generated at creation.
    pub id: RequestId,
    /// Agent that proposed the change.
    pub agent_id: AgentId,
    /// Conversation thread that is paused.
    pub thread_id: ThreadId,
    /// The paused action inside the engine.
    pub action_id: ActionId,
    /// What the action does.
    pub operation: MemoryOperation,
    /// Normalized target path, relative to the agent root.
    pub target_path: String,
    /// File content at creation time, if the file existed and was readable.
    pub previous_content: Option<String>,
    /// Content the agent wants to write (or append).
    pub proposed_content: String,
    /// The agent's justification.
    pub reason: String,
    /// Scanner output for `proposed_content`.
    pub flags: Vec<SuspiciousFlag>,
    /// Notes recorded while the request was built.
    #[serde(default)]
    pub diagnostics: Vec<String>,
    /// Lifecycle state.
    pub status: RequestStatus,
    /// Content actually written on approval.
    pub applied_content: Option<String>,
    /// When the request was created.
    pub created_at: Timestamp,
    /// When the request was decided.
    pub resolved_at: Option<Timestamp>,
}

impl ApprovalRequest {
    /// Create a pending request for a resolved target.
    #[must_use]
    pub fn new(
        thread_id: ThreadId,
        action_id: ActionId,
        operation: MemoryOperation,
        target: &ResolvedPath,
        proposed_content: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: RequestId::new(),
            agent_id: target.agent_id().clone(),
            thread_id,
            action_id,
            operation,
            target_path: target.as_str().to_string(),
            previous_content: None,
            proposed_content: proposed_content.into(),
            reason: reason.into(),
            flags: Vec::new(),
            diagnostics: Vec::new(),
            status: RequestStatus::Pending,
            applied_content: None,
            created_at: Timestamp::now(),
            resolved_at: None,
        }
    }

    /// Set the snapshot of the existing file.
    #[must_use]
    pub fn with_previous_content(mut self, content: Option<String>) -> Self {
        self.previous_content = content;
        self
    }

    /// Attach scanner flags.
    #[must_use]
    pub fn with_flags(mut self, flags: Vec<SuspiciousFlag>) -> Self {
        self.flags = flags;
        self
    }

    /// Record a diagnostic note.
    #[must_use]
    pub fn with_diagnostic(mut self, note: impl Into<String>) -> Self {
        self.diagnostics.push(note.into());
        self
    }

    /// Whether the request still awaits a decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// The most severe flag, if any.
    #[must_use]
    pub fn highest_severity(&self) -> Option<Severity> {
        self.flags.iter().map(|f| f.severity).max()
    }

    /// Move the request to a terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::AlreadyResolved`] if the request is not
    /// pending, or [`ApprovalError::Internal`] if `resolution` is not a
    /// terminal status.
    pub fn resolve(&mut self, resolution: Resolution) -> ApprovalResult<()> {
        if !self.is_pending() {
            return Err(ApprovalError::AlreadyResolved {
                id: self.id,
                status: self.status,
            });
        }
        if !resolution.status.is_terminal() {
            return Err(ApprovalError::Internal(
                "cannot resolve a request back to pending".into(),
            ));
        }
        self.status = resolution.status;
        self.applied_content = resolution.applied_content;
        self.resolved_at = Some(Timestamp::now());
        Ok(())
    }
}

impl fmt::Display for ApprovalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} for {} ({})",
            self.id, self.operation, self.target_path, self.agent_id, self.status
        )
    }
}
