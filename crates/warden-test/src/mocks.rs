//! Mock implementations for testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use warden_approval::{ApprovalError, ApprovalResult, ExecutionEngine, ResumeOutcome};
use warden_core::ActionId;
use warden_storage::{KvStore, MemoryKvStore, StorageError, StorageResult};

// ---------------------------------------------------------------------------
// RecordingEngine
// ---------------------------------------------------------------------------

/// Execution engine that records every successful resume.
///
/// Can be switched into a failing or unavailable state to exercise the
/// resume-failure paths.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<(ActionId, ResumeOutcome)>>,
    attempts: AtomicUsize,
    failing: AtomicBool,
    unavailable: AtomicBool,
}

impl RecordingEngine {
    /// Create a healthy engine.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create an engine that rejects every resume.
    #[must_use]
    pub fn failing() -> Arc<Self> {
        let engine = Self::default();
        engine.failing.store(true, Ordering::SeqCst);
        Arc::new(engine)
    }

    /// Make subsequent resumes fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Report the engine as unavailable (or available again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Successful resumes, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<(ActionId, ResumeOutcome)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of successful resumes.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Number of resume attempts, including failed ones.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The most recent successful resume.
    #[must_use]
    pub fn last(&self) -> Option<(ActionId, ResumeOutcome)> {
        self.calls.lock().ok().and_then(|c| c.last().cloned())
    }
}

#[async_trait]
impl ExecutionEngine for RecordingEngine {
    async fn resume(&self, action_id: &ActionId, outcome: &ResumeOutcome) -> ApprovalResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApprovalError::Resume {
                action_id: action_id.clone(),
                message: "engine rejected the resume signal".to_string(),
            });
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((action_id.clone(), outcome.clone()));
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// FlakyKvStore
// ---------------------------------------------------------------------------

/// In-memory store whose reads or writes can be made to fail.
///
/// Failures can be limited to namespaces starting with a prefix, so a test
/// can break the memory store while the ledger keeps working.
#[derive(Debug, Default)]
pub struct FlakyKvStore {
    inner: MemoryKvStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    prefix: Mutex<Option<String>>,
}

impl FlakyKvStore {
    /// Create a healthy store.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make reads fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Only inject failures for namespaces starting with `prefix`.
    pub fn limit_to(&self, prefix: impl Into<String>) {
        if let Ok(mut guard) = self.prefix.lock() {
            *guard = Some(prefix.into());
        }
    }

    fn applies(&self, namespace: &str) -> bool {
        self.prefix
            .lock()
            .map(|p| p.as_deref().is_none_or(|prefix| namespace.starts_with(prefix)))
            .unwrap_or(true)
    }

    fn check_read(&self, namespace: &str) -> StorageResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) && self.applies(namespace) {
            return Err(StorageError::Connection(format!(
                "read from '{namespace}' failed: backend unavailable"
            )));
        }
        Ok(())
    }

    fn check_write(&self, namespace: &str) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) && self.applies(namespace) {
            return Err(StorageError::Connection(format!(
                "write to '{namespace}' failed: backend unavailable"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for FlakyKvStore {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.check_read(namespace)?;
        self.inner.get(namespace, key).await
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.check_write(namespace)?;
        self.inner.set(namespace, key, value).await
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        self.check_write(namespace)?;
        self.inner.delete(namespace, key).await
    }

    async fn exists(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        self.check_read(namespace)?;
        self.inner.exists(namespace, key).await
    }

    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        self.check_read(namespace)?;
        self.inner.list_keys(namespace).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_engine_records() {
        let engine = RecordingEngine::new();
        engine
            .resume(&ActionId::new("a-1"), &ResumeOutcome::refused("nope"))
            .await
            .unwrap();
        assert_eq!(engine.call_count(), 1);
        assert_eq!(engine.last().unwrap().0, ActionId::new("a-1"));
    }

    #[tokio::test]
    async fn test_recording_engine_failing() {
        let engine = RecordingEngine::failing();
        let outcome = ResumeOutcome::refused("nope");
        assert!(engine.resume(&ActionId::new("a-1"), &outcome).await.is_err());
        assert_eq!(engine.attempts(), 1);
        assert_eq!(engine.call_count(), 0);

        engine.set_failing(false);
        assert!(engine.resume(&ActionId::new("a-1"), &outcome).await.is_ok());
        assert_eq!(engine.attempts(), 2);
    }

    #[tokio::test]
    async fn test_flaky_store_scoped_failures() {
        let store = FlakyKvStore::new();
        store.set("memory:a", "k", b"v".to_vec()).await.unwrap();
        store.set("ledger:approvals", "k", b"v".to_vec()).await.unwrap();

        store.limit_to("memory:");
        store.set_fail_reads(true);
        assert!(store.get("memory:a", "k").await.is_err());
        assert!(store.get("ledger:approvals", "k").await.unwrap().is_some());

        store.set_fail_writes(true);
        assert!(store.set("memory:a", "k", b"w".to_vec()).await.is_err());
        assert!(store.set("ledger:approvals", "k2", b"w".to_vec()).await.is_ok());
    }
}
