//! Resume coordination.
//!
//! Routes the outcome of a decided request back into the execution engine.
//! The outcome always targets the exact action recorded on the request,
//! never "whatever is currently paused" in that thread.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};
use warden_core::ActionId;

use crate::error::{ApprovalError, ApprovalResult};
use crate::gate::PausedThreads;
use crate::request::{ApprovalRequest, RequestStatus};

/// Adapter over the engine that runs agent conversations.
///
/// # Example
///
/// ```rust,ignore
/// use warden_approval::{ExecutionEngine, ResumeOutcome};
///
/// struct Engine;
///
/// #[async_trait::async_trait]
/// impl ExecutionEngine for Engine {
///     async fn resume(&self, action_id: &ActionId, outcome: &ResumeOutcome) -> ApprovalResult<()> {
///         // Hand the outcome text to the paused tool call...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Continue the paused action `action_id` with `outcome`.
    async fn resume(&self, action_id: &ActionId, outcome: &ResumeOutcome) -> ApprovalResult<()>;

    /// Whether the engine can currently accept resume signals.
    fn is_available(&self) -> bool {
        true
    }
}

/// What the engine is told when a paused action continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeOutcome {
    /// Whether the memory change took effect.
    pub approved: bool,
    /// Human-readable description handed to the agent.
    pub message: String,
}

impl ResumeOutcome {
    /// Outcome for a decided request.
    #[must_use]
    pub fn for_request(request: &ApprovalRequest) -> Self {
        match request.status {
            RequestStatus::Applied => Self {
                approved: true,
                message: format!(
                    "Memory update approved and saved to {}.",
                    request.target_path
                ),
            },
            RequestStatus::AppliedWithEdits => Self {
                approved: true,
                message: format!(
                    "Memory update approved with edits and saved to {}.",
                    request.target_path
                ),
            },
            RequestStatus::Discarded | RequestStatus::Pending => Self {
                approved: false,
                message: "Memory update rejected by the user; nothing was saved.".to_string(),
            },
        }
    }

    /// Outcome for an action refused before any request was created.
    #[must_use]
    pub fn refused(reason: impl std::fmt::Display) -> Self {
        Self {
            approved: false,
            message: format!("Memory update refused: {reason}"),
        }
    }
}

/// Sends resume signals and owns the paused-thread gate.
pub struct ResumeCoordinator {
    engine: RwLock<Option<Arc<dyn ExecutionEngine>>>,
    paused: Arc<PausedThreads>,
}

impl std::fmt::Debug for ResumeCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeCoordinator")
            .field("paused", &self.paused.len())
            .finish_non_exhaustive()
    }
}

impl ResumeCoordinator {
    /// Create a coordinator with no engine attached.
    #[must_use]
    pub fn new(paused: Arc<PausedThreads>) -> Self {
        Self {
            engine: RwLock::new(None),
            paused,
        }
    }

    /// Attach (or replace) the execution engine.
    pub async fn register_engine(&self, engine: Arc<dyn ExecutionEngine>) {
        *self.engine.write().await = Some(engine);
        info!("Execution engine registered");
    }

    /// Whether an available engine is attached.
    pub async fn has_engine(&self) -> bool {
        self.engine
            .read()
            .await
            .as_ref()
            .is_some_and(|e| e.is_available())
    }

    /// The paused-thread gate.
    #[must_use]
    pub fn paused(&self) -> &Arc<PausedThreads> {
        &self.paused
    }

    /// Send `outcome` to `action_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::EngineUnavailable`] if no available engine is
    /// attached, or whatever the engine returns.
    pub async fn resume(&self, action_id: &ActionId, outcome: &ResumeOutcome) -> ApprovalResult<()> {
        let engine = {
            let guard = self.engine.read().await;
            match guard.as_ref() {
                Some(e) if e.is_available() => Arc::clone(e),
                _ => return Err(ApprovalError::EngineUnavailable),
            }
        };

        if let Err(e) = engine.resume(action_id, outcome).await {
            warn!(action_id = %action_id, error = %e, "Engine rejected resume signal");
            return Err(e);
        }
        info!(action_id = %action_id, approved = outcome.approved, "Action resumed");
        Ok(())
    }

    /// Release the thread a decided request paused.
    ///
    /// Returns the output held while the thread was paused, empty if the
    /// thread was not paused on this request. Call before
    /// [`resume`](Self::resume) so the output survives a failed resume.
    #[must_use]
    pub fn release(&self, request: &ApprovalRequest) -> Vec<String> {
        self.paused
            .release(&request.thread_id, &request.id)
            .unwrap_or_default()
    }

    /// Send the outcome recorded on `request` to its action.
    ///
    /// # Errors
    ///
    /// Same as [`resume`](Self::resume).
    pub async fn resume_request(&self, request: &ApprovalRequest) -> ApprovalResult<()> {
        self.resume(&request.action_id, &ResumeOutcome::for_request(request))
            .await
    }
}
