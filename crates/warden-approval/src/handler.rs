//! Decision handling.
//!
//! Applies a reviewer's decision to a pending request. Submissions and resume
//! retries for the same request id are serialized, so concurrent or
//! duplicate deliveries produce exactly one mutation and one resume signal;
//! every other submission observes [`DecisionError::RequestAlreadyResolved`].
//!
//! Guards run in a fixed order and short-circuit:
//!
//! 1. the request exists and belongs to the caller ([`Guard::Ownership`])
//! 2. it is still pending ([`Guard::Pending`])
//! 3. the content to write fits the ceiling ([`Guard::Size`])
//! 4. the target path still resolves ([`Guard::Path`])
//!
//! If the terminal status cannot be recorded, the memory file is put back
//! as it was and the request stays pending.
//!
//! [`Guard::Ownership`]: crate::error::Guard::Ownership
//! [`Guard::Pending`]: crate::error::Guard::Pending
//! [`Guard::Size`]: crate::error::Guard::Size
//! [`Guard::Path`]: crate::error::Guard::Path

use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use warden_core::{AgentId, MemoryOperation, RequestId, ThreadId};
use warden_memory::{MemoryEntry, MemoryStore, ResolvedPath};

use crate::error::{DecisionError, DecisionResult};
use crate::events::{InterruptBus, InterruptEvent};
use crate::ledger::ApprovalLedger;
use crate::request::{ApprovalRequest, Decision, Resolution};
use crate::resume::ResumeCoordinator;

/// Applies decisions and resumes the paused action.
pub struct DecisionHandler {
    ledger: Arc<dyn ApprovalLedger>,
    memory: Arc<MemoryStore>,
    coordinator: Arc<ResumeCoordinator>,
    bus: InterruptBus,
    locks: DashMap<RequestId, Arc<Mutex<()>>>,
    /// Requests whose resume signal the engine acknowledged.
    resumed: DashSet<RequestId>,
}

impl std::fmt::Debug for DecisionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionHandler")
            .field("in_flight", &self.locks.len())
            .field("resumed", &self.resumed.len())
            .finish_non_exhaustive()
    }
}

impl DecisionHandler {
    /// Create a handler over shared components.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn ApprovalLedger>,
        memory: Arc<MemoryStore>,
        coordinator: Arc<ResumeCoordinator>,
        bus: InterruptBus,
    ) -> Self {
        Self {
            ledger,
            memory,
            coordinator,
            bus,
            locks: DashMap::new(),
            resumed: DashSet::new(),
        }
    }

    /// Decide request `request_id` on behalf of `agent`.
    ///
    /// When `thread` is given, the request must also belong to that thread.
    /// Returns the resolved request.
    ///
    /// # Errors
    ///
    /// Returns the first failing guard, a storage error, or
    /// [`DecisionError::UpstreamResumeFailure`] if the decision was applied
    /// but the engine could not be resumed.
    pub async fn submit(
        &self,
        agent: &AgentId,
        thread: Option<&ThreadId>,
        request_id: RequestId,
        decision: Decision,
    ) -> DecisionResult<ApprovalRequest> {
        let lock = self.lock_for(request_id);
        let result = {
            let _guard = lock.lock().await;
            self.decide(agent, thread, request_id, decision).await
        };
        self.settle(request_id, &result);
        result
    }

    /// Re-send the resume signal for a decided request.
    ///
    /// Used after [`DecisionError::UpstreamResumeFailure`]. The stored
    /// decision is not re-applied, and a request whose resume the engine
    /// already acknowledged is returned without signalling it again.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::RequestNotFound`] or
    /// [`DecisionError::Unauthorized`] for ownership failures,
    /// [`DecisionError::StillPending`] if the request has not been decided,
    /// or [`DecisionError::UpstreamResumeFailure`] if the engine fails again.
    pub async fn retry_resume(
        &self,
        agent: &AgentId,
        request_id: RequestId,
    ) -> DecisionResult<ApprovalRequest> {
        let lock = self.lock_for(request_id);
        let result = {
            let _guard = lock.lock().await;
            self.retry(agent, request_id).await
        };
        self.settle(request_id, &result);
        result
    }

    fn lock_for(&self, request_id: RequestId) -> Arc<Mutex<()>> {
        Arc::clone(
            self.locks
                .entry(request_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    /// Drop the lock of a request nothing else can mutate.
    fn settle(&self, request_id: RequestId, result: &DecisionResult<ApprovalRequest>) {
        let settled = match result {
            Ok(_) => true,
            Err(e) => matches!(
                e,
                DecisionError::RequestNotFound(_)
                    | DecisionError::RequestAlreadyResolved { .. }
                    | DecisionError::UpstreamResumeFailure { .. }
            ),
        };
        if settled {
            self.locks.remove(&request_id);
        }
    }

    async fn retry(
        &self,
        agent: &AgentId,
        request_id: RequestId,
    ) -> DecisionResult<ApprovalRequest> {
        let request = self.load_owned(agent, None, request_id).await?;
        if request.is_pending() {
            return Err(DecisionError::StillPending(request_id));
        }
        if self.resumed.contains(&request_id) {
            debug!(request_id = %request_id, "Resume already delivered");
            return Ok(request);
        }
        self.finish(request).await
    }

    async fn decide(
        &self,
        agent: &AgentId,
        thread: Option<&ThreadId>,
        request_id: RequestId,
        decision: Decision,
    ) -> DecisionResult<ApprovalRequest> {
        let request = self.load_owned(agent, thread, request_id).await?;
        if !request.is_pending() {
            return Err(DecisionError::RequestAlreadyResolved {
                request_id,
                status: request.status,
            });
        }

        let target = self.memory.resolve(&request.agent_id, &request.target_path);
        let content = match &decision {
            Decision::Approve => {
                (request.operation != MemoryOperation::Delete).then_some(&request.proposed_content)
            },
            Decision::Edit { content } => Some(content),
            Decision::Reject => None,
        };
        if let Some(content) = content {
            self.check_final_size(&request, target.as_ref().ok(), content)
                .await?;
        }

        let target = target?;
        let before = match &decision {
            Decision::Reject => None,
            Decision::Approve | Decision::Edit { .. } => {
                Some(self.memory.read_optional(&target).await?)
            },
        };
        self.apply(&request, &target, &decision).await?;
        let applied_content = content.cloned();

        let resolution = Resolution {
            status: decision.target_status(),
            applied_content,
        };
        let resolved = match self.ledger.resolve(&request_id, resolution).await {
            Ok(resolved) => resolved,
            Err(e) => {
                error!(
                    request_id = %request_id,
                    decision = decision.kind(),
                    error = %e,
                    "Decision could not be recorded"
                );
                if let Some(before) = &before {
                    self.restore(&target, before.as_ref()).await;
                }
                return Err(e.into());
            },
        };

        info!(
            request_id = %request_id,
            agent_id = %resolved.agent_id,
            decision = decision.kind(),
            status = %resolved.status,
            "Approval request decided"
        );

        self.finish(resolved).await
    }

    /// Guard 1: existence and ownership.
    async fn load_owned(
        &self,
        agent: &AgentId,
        thread: Option<&ThreadId>,
        request_id: RequestId,
    ) -> DecisionResult<ApprovalRequest> {
        let request = self
            .ledger
            .get(&request_id)
            .await?
            .ok_or(DecisionError::RequestNotFound(request_id))?;

        let wrong_thread = thread.is_some_and(|t| t != &request.thread_id);
        if &request.agent_id != agent || wrong_thread {
            warn!(
                request_id = %request_id,
                agent_id = %agent,
                "Decision rejected: caller does not own the request"
            );
            return Err(DecisionError::Unauthorized { request_id });
        }
        Ok(request)
    }

    /// Guard 3. For appends the resulting file is measured.
    async fn check_final_size(
        &self,
        request: &ApprovalRequest,
        target: Option<&ResolvedPath>,
        content: &str,
    ) -> DecisionResult<()> {
        if request.operation == MemoryOperation::Append
            && let Some(target) = target
        {
            let existing = self.memory.read_optional(target).await?;
            let combined =
                MemoryStore::appended(existing.as_ref().map(|e| e.content.as_str()), content);
            return Ok(self.memory.check_size(&combined)?);
        }
        Ok(self.memory.check_size(content)?)
    }

    async fn apply(
        &self,
        request: &ApprovalRequest,
        target: &ResolvedPath,
        decision: &Decision,
    ) -> DecisionResult<()> {
        match (request.operation, decision) {
            (MemoryOperation::Delete, Decision::Approve) => {
                if !self.memory.delete(target).await? {
                    warn!(path = %target, "Approved delete of a file that no longer exists");
                }
            },
            (MemoryOperation::Append, Decision::Approve) => {
                self.memory
                    .append(target, &request.proposed_content)
                    .await?;
            },
            (MemoryOperation::Append, Decision::Edit { content }) => {
                self.memory.append(target, content).await?;
            },
            (MemoryOperation::Write, Decision::Approve) => {
                self.memory
                    .write(target, &request.proposed_content)
                    .await?;
            },
            (MemoryOperation::Write | MemoryOperation::Delete, Decision::Edit { content }) => {
                self.memory.write(target, content).await?;
            },
            (_, Decision::Reject) => {},
        }
        Ok(())
    }

    /// Put `target` back to `before` after an unrecorded mutation.
    async fn restore(&self, target: &ResolvedPath, before: Option<&MemoryEntry>) {
        match self.memory.restore(target, before).await {
            Ok(()) => warn!(path = %target, "Memory change rolled back"),
            Err(e) => error!(
                path = %target,
                error = %e,
                "Memory change could not be rolled back"
            ),
        }
    }

    /// Release the thread and its held output, then resume the engine.
    ///
    /// Held output is published before the resume so a failed resume does
    /// not lose it.
    async fn finish(&self, request: ApprovalRequest) -> DecisionResult<ApprovalRequest> {
        for text in self.coordinator.release(&request) {
            self.bus.publish(InterruptEvent::OutputReleased {
                thread_id: request.thread_id.clone(),
                text,
            });
        }

        match self.coordinator.resume_request(&request).await {
            Ok(()) => {
                self.resumed.insert(request.id);
                self.bus.publish(InterruptEvent::resolved(&request, true));
                Ok(request)
            },
            Err(e) => {
                error!(
                    request_id = %request.id,
                    action_id = %request.action_id,
                    status = %request.status,
                    error = %e,
                    "Decision recorded but engine resume failed"
                );
                self.bus.publish(InterruptEvent::resolved(&request, false));
                Err(DecisionError::UpstreamResumeFailure {
                    request_id: request.id,
                    status: request.status,
                    message: e.to_string(),
                })
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApprovalError, ApprovalResult, Guard};
    use crate::gate::PausedThreads;
    use crate::ledger::KvApprovalLedger;
    use crate::request::RequestStatus;
    use crate::resume::{ExecutionEngine, ResumeOutcome};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use warden_core::ActionId;
    use warden_storage::{KvStore, MemoryKvStore};

    #[derive(Default)]
    struct Recorder {
        calls: StdMutex<Vec<(ActionId, ResumeOutcome)>>,
        failing: AtomicBool,
    }

    #[async_trait]
    impl ExecutionEngine for Recorder {
        async fn resume(&self, action_id: &ActionId, outcome: &ResumeOutcome) -> ApprovalResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(ApprovalError::Resume {
                    action_id: action_id.clone(),
                    message: "engine offline".into(),
                });
            }
            self.calls
                .lock()
                .unwrap()
                .push((action_id.clone(), outcome.clone()));
            Ok(())
        }
    }

    struct Harness {
        handler: Arc<DecisionHandler>,
        ledger: Arc<KvApprovalLedger>,
        memory: Arc<MemoryStore>,
        gate: Arc<PausedThreads>,
        engine: Arc<Recorder>,
        bus: InterruptBus,
    }

    async fn harness() -> Harness {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let ledger = Arc::new(KvApprovalLedger::in_memory().await.unwrap());
        let memory = Arc::new(MemoryStore::new(kv));
        let gate = Arc::new(PausedThreads::new());
        let coordinator = Arc::new(ResumeCoordinator::new(Arc::clone(&gate)));
        let engine = Arc::new(Recorder::default());
        coordinator.register_engine(engine.clone()).await;
        let bus = InterruptBus::new();
        let handler = Arc::new(DecisionHandler::new(
            ledger.clone(),
            Arc::clone(&memory),
            coordinator,
            bus.clone(),
        ));
        Harness {
            handler,
            ledger,
            memory,
            gate,
            engine,
            bus,
        }
    }

    fn agent() -> AgentId {
        AgentId::new("agent-1").unwrap()
    }

    impl Harness {
        async fn pending(
            &self,
            thread: &str,
            operation: MemoryOperation,
            path: &str,
            content: &str,
        ) -> ApprovalRequest {
            let target = self.memory.resolve(&agent(), path).unwrap();
            let req = ApprovalRequest::new(
                ThreadId::new(thread),
                ActionId::new(format!("call-{thread}")),
                operation,
                &target,
                content,
                "reason",
            );
            self.ledger.create(req.clone()).await.unwrap();
            self.gate.pause(req.thread_id.clone(), req.id);
            req
        }

        async fn read(&self, path: &str) -> Option<String> {
            let target = self.memory.resolve(&agent(), path).unwrap();
            self.memory.read_optional(&target).await.unwrap().map(|e| e.content)
        }
    }

    #[tokio::test]
    async fn test_approve_writes_proposed_content() {
        let h = harness().await;
        let req = h
            .pending("t1", MemoryOperation::Write, "knowledge/a.md", "hello")
            .await;

        let resolved = h
            .handler
            .submit(&agent(), Some(&req.thread_id), req.id, Decision::Approve)
            .await
            .unwrap();
        assert_eq!(resolved.status, RequestStatus::Applied);
        assert_eq!(resolved.applied_content.as_deref(), Some("hello"));
        assert!(resolved.resolved_at.is_some());
        assert_eq!(h.read("knowledge/a.md").await.as_deref(), Some("hello"));
        assert!(!h.gate.is_paused(&req.thread_id));

        let calls = h.engine.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, req.action_id);
    }

    #[tokio::test]
    async fn test_edit_writes_replacement() {
        let h = harness().await;
        let req = h
            .pending("t1", MemoryOperation::Write, "knowledge/a.md", "draft")
            .await;
        let resolved = h
            .handler
            .submit(
                &agent(),
                None,
                req.id,
                Decision::Edit {
                    content: "final".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(resolved.status, RequestStatus::AppliedWithEdits);
        assert_eq!(h.read("knowledge/a.md").await.as_deref(), Some("final"));
    }

    #[tokio::test]
    async fn test_reject_writes_nothing() {
        let h = harness().await;
        let mut rx = h.bus.subscribe();
        let req = h
            .pending("t1", MemoryOperation::Write, "knowledge/a.md", "hello")
            .await;
        let resolved = h
            .handler
            .submit(&agent(), None, req.id, Decision::Reject)
            .await
            .unwrap();
        assert_eq!(resolved.status, RequestStatus::Discarded);
        assert!(resolved.applied_content.is_none());
        assert!(h.read("knowledge/a.md").await.is_none());
        assert!(!h.engine.calls.lock().unwrap()[0].1.approved);

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event.as_ref(),
            InterruptEvent::InterruptResolved {
                success: true,
                applied_path: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_second_decision_rejected() {
        let h = harness().await;
        let req = h
            .pending("t1", MemoryOperation::Append, "knowledge/log.md", "line")
            .await;
        h.handler
            .submit(&agent(), None, req.id, Decision::Approve)
            .await
            .unwrap();
        let err = h
            .handler
            .submit(&agent(), None, req.id, Decision::Approve)
            .await
            .unwrap_err();
        assert_eq!(err.guard(), Some(Guard::Pending));
        assert_eq!(h.read("knowledge/log.md").await.as_deref(), Some("line"));
    }

    #[tokio::test]
    async fn test_concurrent_decisions_apply_once() {
        let h = harness().await;
        let req = h
            .pending("t1", MemoryOperation::Append, "knowledge/log.md", "once")
            .await;

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let handler = Arc::clone(&h.handler);
            let id = req.id;
            tasks.push(tokio::spawn(async move {
                handler.submit(&agent(), None, id, Decision::Approve).await
            }));
        }
        let mut outcomes = Vec::new();
        for task in tasks {
            outcomes.push(task.await.unwrap());
        }
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().filter_map(|r| r.as_ref().err()).all(|e| matches!(
            e,
            DecisionError::RequestAlreadyResolved { .. }
        )));
        assert_eq!(h.read("knowledge/log.md").await.as_deref(), Some("once"));
        assert_eq!(h.engine.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_agent_or_thread_unauthorized() {
        let h = harness().await;
        let req = h
            .pending("t1", MemoryOperation::Write, "knowledge/a.md", "x")
            .await;

        let other = AgentId::new("agent-2").unwrap();
        let err = h
            .handler
            .submit(&other, None, req.id, Decision::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, DecisionError::Unauthorized { .. }));

        let err = h
            .handler
            .submit(&agent(), Some(&ThreadId::new("t2")), req.id, Decision::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, DecisionError::Unauthorized { .. }));
        assert!(h.ledger.get(&req.id).await.unwrap().unwrap().is_pending());
    }

    #[tokio::test]
    async fn test_unknown_request() {
        let h = harness().await;
        let err = h
            .handler
            .submit(&agent(), None, RequestId::new(), Decision::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, DecisionError::RequestNotFound(_)));
    }

    #[tokio::test]
    async fn test_oversized_edit_rejected_and_stays_pending() {
        let h = harness().await;
        let req = h
            .pending("t1", MemoryOperation::Write, "knowledge/a.md", &"a".repeat(50_000))
            .await;
        let err = h
            .handler
            .submit(
                &agent(),
                None,
                req.id,
                Decision::Edit {
                    content: "b".repeat(101_000),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DecisionError::ContentTooLarge {
                size: 101_000,
                max: 100_000
            }
        ));
        assert!(h.ledger.get(&req.id).await.unwrap().unwrap().is_pending());
        assert!(h.read("knowledge/a.md").await.is_none());

        h.handler
            .submit(&agent(), None, req.id, Decision::Approve)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_append_measures_resulting_file() {
        let h = harness().await;
        let target = h.memory.resolve(&agent(), "knowledge/log.md").unwrap();
        h.memory.write(&target, &"a".repeat(60_000)).await.unwrap();

        let req = h
            .pending(
                "t1",
                MemoryOperation::Append,
                "knowledge/log.md",
                &"b".repeat(50_000),
            )
            .await;
        let err = h
            .handler
            .submit(&agent(), None, req.id, Decision::Approve)
            .await
            .unwrap_err();
        assert_eq!(err.guard(), Some(Guard::Size));
    }

    #[tokio::test]
    async fn test_approved_delete_removes_file() {
        let h = harness().await;
        let target = h.memory.resolve(&agent(), "skills/old.md").unwrap();
        h.memory.write(&target, "obsolete").await.unwrap();

        let req = h
            .pending("t1", MemoryOperation::Delete, "skills/old.md", "")
            .await;
        let resolved = h
            .handler
            .submit(&agent(), None, req.id, Decision::Approve)
            .await
            .unwrap();
        assert!(resolved.applied_content.is_none());
        assert!(h.read("skills/old.md").await.is_none());
    }

    #[tokio::test]
    async fn test_resume_failure_keeps_mutation_and_can_retry() {
        let h = harness().await;
        let req = h
            .pending("t1", MemoryOperation::Write, "knowledge/a.md", "kept")
            .await;
        h.engine.failing.store(true, Ordering::SeqCst);

        let err = h
            .handler
            .submit(&agent(), None, req.id, Decision::Approve)
            .await
            .unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(h.read("knowledge/a.md").await.as_deref(), Some("kept"));
        assert_eq!(
            h.ledger.get(&req.id).await.unwrap().unwrap().status,
            RequestStatus::Applied
        );

        h.engine.failing.store(false, Ordering::SeqCst);
        let retried = h.handler.retry_resume(&agent(), req.id).await.unwrap();
        assert_eq!(retried.status, RequestStatus::Applied);
        assert_eq!(h.engine.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_held_output_survives_failed_resume() {
        let h = harness().await;
        let mut rx = h.bus.subscribe();
        let req = h
            .pending("t1", MemoryOperation::Write, "knowledge/a.md", "x")
            .await;
        h.gate.hold(&req.thread_id, "said while paused");
        h.engine.failing.store(true, Ordering::SeqCst);

        let err = h
            .handler
            .submit(&agent(), None, req.id, Decision::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, DecisionError::UpstreamResumeFailure { .. }));

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first.as_ref(),
            InterruptEvent::OutputReleased { text, .. } if text == "said while paused"
        ));
        assert!(matches!(
            rx.recv().await.unwrap().as_ref(),
            InterruptEvent::InterruptResolved { success: false, .. }
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_retries_resume_once() {
        let h = harness().await;
        let req = h
            .pending("t1", MemoryOperation::Write, "knowledge/a.md", "x")
            .await;
        h.engine.failing.store(true, Ordering::SeqCst);
        h.handler
            .submit(&agent(), None, req.id, Decision::Approve)
            .await
            .unwrap_err();
        h.engine.failing.store(false, Ordering::SeqCst);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let handler = Arc::clone(&h.handler);
            let id = req.id;
            tasks.push(tokio::spawn(async move {
                handler.retry_resume(&agent(), id).await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }
        assert_eq!(h.engine.calls.lock().unwrap().len(), 1);

        // Nothing left to deliver once the engine has acknowledged.
        h.handler.retry_resume(&agent(), req.id).await.unwrap();
        assert_eq!(h.engine.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_resume_on_pending_request() {
        let h = harness().await;
        let req = h
            .pending("t1", MemoryOperation::Write, "knowledge/a.md", "x")
            .await;
        let err = h.handler.retry_resume(&agent(), req.id).await.unwrap_err();
        assert!(matches!(err, DecisionError::StillPending(_)));
    }

    #[tokio::test]
    async fn test_held_output_released_on_decision() {
        let h = harness().await;
        let mut rx = h.bus.subscribe();
        let req = h
            .pending("t1", MemoryOperation::Write, "knowledge/a.md", "x")
            .await;
        h.gate.hold(&req.thread_id, "waiting output");

        h.handler
            .submit(&agent(), None, req.id, Decision::Approve)
            .await
            .unwrap();
        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first.as_ref(),
            InterruptEvent::OutputReleased { text, .. } if text == "waiting output"
        ));
        assert_eq!(rx.recv().await.unwrap().event_type(), "interrupt_resolved");
    }
}
