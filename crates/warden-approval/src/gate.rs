//! Paused-thread gate.
//!
//! Maps a thread to the request it is paused on. Output produced by a paused
//! thread is buffered here until the thread is released.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, warn};
use warden_core::{RequestId, ThreadId};

use crate::request::ApprovalRequest;

#[derive(Debug, Clone)]
struct PausedThread {
    request_id: RequestId,
    held: Vec<String>,
}

/// Which threads are paused, and on what.
#[derive(Debug, Default)]
pub struct PausedThreads {
    threads: DashMap<ThreadId, PausedThread>,
}

impl PausedThreads {
    /// Create an empty gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the gate from the ledger's pending requests.
    ///
    /// If a thread somehow has more than one pending request, the oldest
    /// one wins (requests are expected oldest first).
    #[must_use]
    pub fn from_pending<'a>(pending: impl IntoIterator<Item = &'a ApprovalRequest>) -> Self {
        let gate = Self::new();
        for request in pending {
            if !gate.pause(request.thread_id.clone(), request.id) {
                warn!(
                    thread_id = %request.thread_id,
                    request_id = %request.id,
                    "Thread already paused on another request"
                );
            }
        }
        gate
    }

    /// Pause `thread` on `request_id`.
    ///
    /// Returns `false` if the thread is already paused.
    pub fn pause(&self, thread: ThreadId, request_id: RequestId) -> bool {
        self.claim(thread, request_id).is_ok()
    }

    /// Pause `thread` on `request_id` unless it is already paused.
    ///
    /// # Errors
    ///
    /// Returns the request the thread is already paused on.
    pub fn claim(&self, thread: ThreadId, request_id: RequestId) -> Result<(), RequestId> {
        match self.threads.entry(thread) {
            Entry::Occupied(held) => Err(held.get().request_id),
            Entry::Vacant(slot) => {
                debug!(thread_id = %slot.key(), request_id = %request_id, "Thread paused");
                slot.insert(PausedThread {
                    request_id,
                    held: Vec::new(),
                });
                Ok(())
            },
        }
    }

    /// Release `thread` if it is paused on `request_id`.
    ///
    /// Returns the output held while paused, or `None` if the thread was not
    /// paused on that request.
    pub fn release(&self, thread: &ThreadId, request_id: &RequestId) -> Option<Vec<String>> {
        let (_, paused) = self
            .threads
            .remove_if(thread, |_, p| &p.request_id == request_id)?;
        debug!(
            thread_id = %thread,
            request_id = %request_id,
            held = paused.held.len(),
            "Thread released"
        );
        Some(paused.held)
    }

    /// The request a thread is paused on.
    #[must_use]
    pub fn paused_on(&self, thread: &ThreadId) -> Option<RequestId> {
        self.threads.get(thread).map(|p| p.request_id)
    }

    /// Whether a thread is paused.
    #[must_use]
    pub fn is_paused(&self, thread: &ThreadId) -> bool {
        self.threads.contains_key(thread)
    }

    /// Buffer output for a paused thread.
    ///
    /// Returns `false` (and keeps nothing) if the thread is not paused.
    pub fn hold(&self, thread: &ThreadId, text: impl Into<String>) -> bool {
        match self.threads.get_mut(thread) {
            Some(mut paused) => {
                paused.held.push(text.into());
                true
            },
            None => false,
        }
    }

    /// Number of paused threads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    /// Whether no thread is paused.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_once_per_thread() {
        let gate = PausedThreads::new();
        let t = ThreadId::new("t1");
        let first = RequestId::new();
        assert!(gate.pause(t.clone(), first));
        assert!(!gate.pause(t.clone(), RequestId::new()));
        assert_eq!(gate.paused_on(&t), Some(first));
        assert_eq!(gate.len(), 1);
    }

    #[test]
    fn test_claim_reports_current_holder() {
        let gate = PausedThreads::new();
        let t = ThreadId::new("t1");
        let first = RequestId::new();
        assert_eq!(gate.claim(t.clone(), first), Ok(()));
        assert_eq!(gate.claim(t.clone(), RequestId::new()), Err(first));
        assert_eq!(gate.paused_on(&t), Some(first));
    }

    #[test]
    fn test_release_requires_matching_request() {
        let gate = PausedThreads::new();
        let t = ThreadId::new("t1");
        let id = RequestId::new();
        gate.pause(t.clone(), id);

        assert!(gate.release(&t, &RequestId::new()).is_none());
        assert!(gate.is_paused(&t));
        assert_eq!(gate.release(&t, &id), Some(Vec::new()));
        assert!(!gate.is_paused(&t));
        assert!(gate.release(&t, &id).is_none());
    }

    #[test]
    fn test_hold_buffers_output() {
        let gate = PausedThreads::new();
        let t = ThreadId::new("t1");
        assert!(!gate.hold(&t, "ignored"));

        let id = RequestId::new();
        gate.pause(t.clone(), id);
        assert!(gate.hold(&t, "one"));
        assert!(gate.hold(&t, "two"));
        assert_eq!(gate.release(&t, &id), Some(vec!["one".into(), "two".into()]));
    }

    #[test]
    fn test_threads_are_independent() {
        let gate = PausedThreads::new();
        let a = ThreadId::new("a");
        let b = ThreadId::new("b");
        gate.pause(a.clone(), RequestId::new());
        assert!(gate.is_paused(&a));
        assert!(!gate.is_paused(&b));
        assert!(gate.pause(b.clone(), RequestId::new()));
        assert_eq!(gate.len(), 2);
    }
}
