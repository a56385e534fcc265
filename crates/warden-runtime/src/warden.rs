//! The assembled approval runtime.
//!
//! [`Warden`] owns one instance of every component and wires them over a
//! single storage backend: the ledger and the memory store share it, the
//! detector and the decision handler share the resume coordinator and the
//! event bus. Building a `Warden` over a backend that already holds pending
//! requests puts their threads back into the paused state.

use std::fmt;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::broadcast;
use tracing::{Instrument, info, warn};
use warden_approval::{
    ApprovalLedger, ApprovalRequest, ApprovalResult, Decision, DecisionHandler, DecisionResult,
    EngineEvent, ExecutionEngine, InboundMessage, InterruptBus, InterruptDetector, InterruptEvent,
    KvApprovalLedger, LEDGER_NAMESPACE, Observation, PausedThreads, ResumeCoordinator,
};
use warden_config::{Config, StorageBackend};
use warden_core::{AgentId, RequestId, ThreadId};
use warden_memory::{MemoryStore, PathResolver};
use warden_storage::{KvStore, MemoryKvStore, ScopedKvStore, SurrealKvStore};
use warden_telemetry::{RequestContext, setup_logging};

use crate::config_bridge::{to_approval_requirements, to_log_config, to_path_policy};
use crate::error::{RuntimeError, RuntimeResult};

/// Install the global subscriber described by the `[logging]` section.
///
/// # Errors
///
/// Returns an error if the section does not convert or a subscriber is
/// already installed.
pub fn init_logging(cfg: &Config) -> RuntimeResult<()> {
    setup_logging(&to_log_config(cfg)?)?;
    Ok(())
}

/// Open the backend selected by the `[storage]` section.
///
/// # Errors
///
/// Returns [`RuntimeError::InvalidConfig`] if an on-disk backend has no
/// path, or a storage error if it cannot be opened.
pub fn open_store(cfg: &Config) -> RuntimeResult<Arc<dyn KvStore>> {
    match cfg.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryKvStore::new())),
        StorageBackend::Surrealkv => {
            let path = cfg
                .storage
                .path
                .as_deref()
                .ok_or_else(|| RuntimeError::InvalidConfig {
                    field: "storage.path".to_owned(),
                    message: "required for the surrealkv backend".to_owned(),
                })?;
            info!(path, "Opening surrealkv store");
            Ok(Arc::new(SurrealKvStore::open(path)?))
        },
    }
}

/// Human-in-the-loop approval for agent memory writes.
pub struct Warden {
    ledger: Arc<KvApprovalLedger>,
    memory: Arc<MemoryStore>,
    coordinator: Arc<ResumeCoordinator>,
    bus: InterruptBus,
    detector: InterruptDetector,
    handler: DecisionHandler,
}

impl fmt::Debug for Warden {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Warden")
            .field("requests", &self.ledger.len())
            .field("paused_threads", &self.coordinator.paused().len())
            .field("subscribers", &self.bus.receiver_count())
            .finish_non_exhaustive()
    }
}

impl Warden {
    /// Build a runtime over the backend the config selects.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be opened, the config does
    /// not convert, or stored requests cannot be loaded.
    pub async fn from_config(cfg: &Config) -> RuntimeResult<Self> {
        let store = open_store(cfg)?;
        Self::with_store(cfg, store).await
    }

    /// Build a runtime over an already opened backend.
    ///
    /// Pending requests found in the ledger pause their threads again.
    ///
    /// # Errors
    ///
    /// Same as [`Warden::from_config`], minus backend opening.
    pub async fn with_store(cfg: &Config, store: Arc<dyn KvStore>) -> RuntimeResult<Self> {
        let requirements = to_approval_requirements(cfg)?;

        let scoped = ScopedKvStore::new(Arc::clone(&store), LEDGER_NAMESPACE)?;
        let ledger = Arc::new(KvApprovalLedger::open(scoped).await?);

        let memory = Arc::new(
            MemoryStore::new(store)
                .with_resolver(PathResolver::new(to_path_policy(cfg)))
                .with_max_content_bytes(cfg.memory.max_content_bytes),
        );

        let pending = ledger.list_pending().await?;
        let paused = Arc::new(PausedThreads::from_pending(pending.iter()));
        if !pending.is_empty() {
            info!(
                pending = pending.len(),
                paused_threads = paused.len(),
                "Recovered pending approval requests"
            );
        }

        let coordinator = Arc::new(ResumeCoordinator::new(paused));
        let bus = InterruptBus::with_capacity(cfg.approval.event_capacity);
        let dyn_ledger: Arc<dyn ApprovalLedger> = Arc::clone(&ledger) as Arc<dyn ApprovalLedger>;

        let detector = InterruptDetector::new(
            Arc::clone(&dyn_ledger),
            Arc::clone(&memory),
            Arc::clone(&coordinator),
            bus.clone(),
        )
        .with_requirements(requirements);
        let handler = DecisionHandler::new(
            dyn_ledger,
            Arc::clone(&memory),
            Arc::clone(&coordinator),
            bus.clone(),
        );

        info!(
            backend = ?cfg.storage.backend,
            max_content_bytes = cfg.memory.max_content_bytes,
            default_required = cfg.approval.default_required,
            "Warden runtime ready"
        );

        Ok(Self {
            ledger,
            memory,
            coordinator,
            bus,
            detector,
            handler,
        })
    }

    /// A runtime with default config over a fresh in-memory backend.
    ///
    /// # Errors
    ///
    /// Only fails if the default config does not convert.
    pub async fn in_memory() -> RuntimeResult<Self> {
        Self::with_store(&Config::default(), Arc::new(MemoryKvStore::new())).await
    }

    /// Register the engine that receives resume signals.
    pub async fn register_engine(&self, engine: Arc<dyn ExecutionEngine>) {
        self.coordinator.register_engine(engine).await;
    }

    /// Receive [`InterruptEvent`]s published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<InterruptEvent>> {
        self.bus.subscribe()
    }

    /// Process one engine event.
    ///
    /// # Errors
    ///
    /// Returns an error if a request cannot be recorded.
    pub async fn observe(&self, event: EngineEvent) -> ApprovalResult<Observation> {
        let mut ctx = RequestContext::new("detector").with_operation("observe");
        match &event {
            EngineEvent::Action(action) => {
                ctx = ctx
                    .with_agent(&action.agent_id)
                    .with_thread(&action.thread_id);
            },
            EngineEvent::Output { thread_id, .. } => ctx = ctx.with_thread(thread_id),
        }
        self.detector.observe(event).instrument(ctx.span()).await
    }

    /// Process a stream of engine events in order.
    pub fn observe_stream<'a, S>(
        &'a self,
        events: S,
    ) -> impl Stream<Item = ApprovalResult<Observation>> + 'a
    where
        S: Stream<Item = EngineEvent> + 'a,
    {
        self.detector.observe_stream(events)
    }

    /// Apply a reviewer's decision on behalf of `agent`.
    ///
    /// # Errors
    ///
    /// See [`DecisionHandler::submit`].
    pub async fn submit_decision(
        &self,
        agent: &AgentId,
        thread: Option<&ThreadId>,
        request_id: RequestId,
        decision: Decision,
    ) -> DecisionResult<ApprovalRequest> {
        let mut ctx = RequestContext::new("handler")
            .with_operation("submit_decision")
            .with_agent(agent)
            .with_approval(request_id);
        if let Some(thread) = thread {
            ctx = ctx.with_thread(thread);
        }
        self.handler
            .submit(agent, thread, request_id, decision)
            .instrument(ctx.span())
            .await
    }

    /// Apply an inbound presentation-layer message.
    ///
    /// # Errors
    ///
    /// See [`Warden::submit_decision`].
    pub async fn handle_inbound(
        &self,
        agent: &AgentId,
        thread: Option<&ThreadId>,
        message: InboundMessage,
    ) -> DecisionResult<ApprovalRequest> {
        match message {
            InboundMessage::DecisionSubmitted(submitted) => {
                self.submit_decision(agent, thread, submitted.request_id, submitted.decision)
                    .await
            },
        }
    }

    /// Pending requests, oldest first, optionally for one agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub async fn pending_requests(
        &self,
        agent: Option<&AgentId>,
    ) -> ApprovalResult<Vec<ApprovalRequest>> {
        match agent {
            Some(agent) => self.ledger.list_pending_for_agent(agent).await,
            None => self.ledger.list_pending().await,
        }
    }

    /// Fetch any request by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub async fn request(&self, id: &RequestId) -> ApprovalResult<Option<ApprovalRequest>> {
        self.ledger.get(id).await
    }

    /// Re-send the resume signal of a decided request.
    ///
    /// # Errors
    ///
    /// See [`DecisionHandler::retry_resume`].
    pub async fn retry_resume(
        &self,
        agent: &AgentId,
        request_id: RequestId,
    ) -> DecisionResult<ApprovalRequest> {
        let ctx = RequestContext::new("handler")
            .with_operation("retry_resume")
            .with_agent(agent)
            .with_approval(request_id);
        let result = self
            .handler
            .retry_resume(agent, request_id)
            .instrument(ctx.span())
            .await;
        if let Err(e) = &result {
            warn!(request_id = %request_id, error = %e, "Resume retry failed");
        }
        result
    }

    /// The memory store.
    #[must_use]
    pub fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    /// The approval ledger.
    #[must_use]
    pub fn ledger(&self) -> Arc<dyn ApprovalLedger> {
        Arc::clone(&self.ledger) as Arc<dyn ApprovalLedger>
    }

    /// Threads currently paused on a request.
    #[must_use]
    pub fn paused_threads(&self) -> &Arc<PausedThreads> {
        self.coordinator.paused()
    }
}
