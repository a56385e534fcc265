//! Durable record of approval requests.
//!
//! The [`ApprovalLedger`] trait is the seam the detector and decision handler
//! depend on. [`KvApprovalLedger`] is the production implementation: an
//! in-memory index backed by a [`ScopedKvStore`], loaded on open so pending
//! requests survive restarts. Resolved requests are kept as an audit trail.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::{debug, info, warn};
use warden_core::{ActionId, AgentId, RequestId};
use warden_storage::{MemoryKvStore, ScopedKvStore};

use crate::error::{ApprovalError, ApprovalResult};
use crate::request::{ApprovalRequest, Resolution};

/// Storage namespace holding approval requests.
pub const LEDGER_NAMESPACE: &str = "ledger:approvals";

/// Durable store of approval requests.
#[async_trait]
pub trait ApprovalLedger: Send + Sync {
    /// Record a new pending request.
    async fn create(&self, request: ApprovalRequest) -> ApprovalResult<()>;

    /// Fetch a request by id.
    async fn get(&self, id: &RequestId) -> ApprovalResult<Option<ApprovalRequest>>;

    /// Fetch the request created for a given engine action.
    async fn find_by_action(&self, action_id: &ActionId)
    -> ApprovalResult<Option<ApprovalRequest>>;

    /// All pending requests, oldest first.
    async fn list_pending(&self) -> ApprovalResult<Vec<ApprovalRequest>>;

    /// Pending requests of one agent, oldest first.
    async fn list_pending_for_agent(&self, agent: &AgentId) -> ApprovalResult<Vec<ApprovalRequest>> {
        let mut pending = self.list_pending().await?;
        pending.retain(|r| &r.agent_id == agent);
        Ok(pending)
    }

    /// Move a pending request to a terminal state and return the result.
    ///
    /// Fails with [`ApprovalError::AlreadyResolved`] if the request is no
    /// longer pending.
    async fn resolve(&self, id: &RequestId, resolution: Resolution)
    -> ApprovalResult<ApprovalRequest>;

    /// The most recently applied request targeting `path` for `agent`.
    async fn last_applied(
        &self,
        agent: &AgentId,
        path: &str,
    ) -> ApprovalResult<Option<ApprovalRequest>>;
}

/// [`ApprovalLedger`] over a namespaced key-value store.
///
/// # Example
///
/// ```rust,ignore
/// let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
/// let scoped = ScopedKvStore::new(kv, LEDGER_NAMESPACE)?;
/// let ledger = KvApprovalLedger::open(scoped).await?;
/// ```
pub struct KvApprovalLedger {
    requests: RwLock<HashMap<RequestId, ApprovalRequest>>,
    store: ScopedKvStore,
}

impl std::fmt::Debug for KvApprovalLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.requests.read().map_or(0, |r| r.len());
        f.debug_struct("KvApprovalLedger")
            .field("namespace", &self.store.namespace())
            .field("requests", &count)
            .finish_non_exhaustive()
    }
}

impl KvApprovalLedger {
    /// Open a ledger over `store`, loading every persisted request.
    ///
    /// Records that fail to decode are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the keys cannot be listed.
    pub async fn open(store: ScopedKvStore) -> ApprovalResult<Self> {
        let mut loaded = HashMap::new();
        for key in store.list_keys().await? {
            match store.get_json::<ApprovalRequest>(&key).await {
                Ok(Some(request)) => {
                    loaded.insert(request.id, request);
                },
                Ok(None) => {},
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to load approval request");
                },
            }
        }

        let pending = loaded.values().filter(|r| r.is_pending()).count();
        info!(
            namespace = store.namespace(),
            total = loaded.len(),
            pending,
            "Approval ledger loaded"
        );

        Ok(Self {
            requests: RwLock::new(loaded),
            store,
        })
    }

    /// Open an ephemeral ledger backed by a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Never fails in practice; returns the same errors as [`open`](Self::open).
    pub async fn in_memory() -> ApprovalResult<Self> {
        let store = ScopedKvStore::new(Arc::new(MemoryKvStore::new()), LEDGER_NAMESPACE)?;
        Self::open(store).await
    }

    /// Number of requests in the ledger, in any state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.read().map_or(0, |r| r.len())
    }

    /// Whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_err<E: std::fmt::Display>(e: E) -> ApprovalError {
        ApprovalError::Storage(e.to_string())
    }

    fn snapshot<F>(&self, mut keep: F) -> ApprovalResult<Vec<ApprovalRequest>>
    where
        F: FnMut(&ApprovalRequest) -> bool,
    {
        let requests = self.requests.read().map_err(Self::lock_err)?;
        let mut out: Vec<ApprovalRequest> =
            requests.values().filter(|r| keep(r)).cloned().collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }
}

#[async_trait]
impl ApprovalLedger for KvApprovalLedger {
    async fn create(&self, request: ApprovalRequest) -> ApprovalResult<()> {
        if self
            .requests
            .read()
            .map_err(Self::lock_err)?
            .contains_key(&request.id)
        {
            return Err(ApprovalError::Internal(format!(
                "duplicate approval request id {}",
                request.id
            )));
        }

        // Persist first so an acknowledged request is always on disk.
        self.store.set_json(&request.id.key(), &request).await?;

        debug!(
            request_id = %request.id,
            agent_id = %request.agent_id,
            thread_id = %request.thread_id,
            "Approval request recorded"
        );
        self.requests
            .write()
            .map_err(Self::lock_err)?
            .insert(request.id, request);
        Ok(())
    }

    async fn get(&self, id: &RequestId) -> ApprovalResult<Option<ApprovalRequest>> {
        Ok(self
            .requests
            .read()
            .map_err(Self::lock_err)?
            .get(id)
            .cloned())
    }

    async fn find_by_action(
        &self,
        action_id: &ActionId,
    ) -> ApprovalResult<Option<ApprovalRequest>> {
        Ok(self
            .requests
            .read()
            .map_err(Self::lock_err)?
            .values()
            .find(|r| &r.action_id == action_id)
            .cloned())
    }

    async fn list_pending(&self) -> ApprovalResult<Vec<ApprovalRequest>> {
        self.snapshot(ApprovalRequest::is_pending)
    }

    async fn list_pending_for_agent(&self, agent: &AgentId) -> ApprovalResult<Vec<ApprovalRequest>> {
        self.snapshot(|r| r.is_pending() && &r.agent_id == agent)
    }

    async fn resolve(
        &self,
        id: &RequestId,
        resolution: Resolution,
    ) -> ApprovalResult<ApprovalRequest> {
        // Transition in memory under the write lock, then persist. A second
        // resolver sees the terminal state immediately.
        let (previous, updated) = {
            let mut requests = self.requests.write().map_err(Self::lock_err)?;
            let entry = requests.get_mut(id).ok_or(ApprovalError::NotFound(*id))?;
            let previous = entry.clone();
            entry.resolve(resolution)?;
            (previous, entry.clone())
        };

        if let Err(e) = self.store.set_json(&id.key(), &updated).await {
            warn!(request_id = %id, error = %e, "Failed to persist resolution, rolling back");
            if let Ok(mut requests) = self.requests.write() {
                requests.insert(*id, previous);
            }
            return Err(e.into());
        }

        info!(
            request_id = %id,
            status = %updated.status,
            "Approval request resolved"
        );
        Ok(updated)
    }

    async fn last_applied(
        &self,
        agent: &AgentId,
        path: &str,
    ) -> ApprovalResult<Option<ApprovalRequest>> {
        let requests = self.requests.read().map_err(Self::lock_err)?;
        Ok(requests
            .values()
            .filter(|r| r.status.is_applied() && &r.agent_id == agent && r.target_path == path)
            .max_by_key(|r| r.resolved_at)
            .cloned())
    }
}
