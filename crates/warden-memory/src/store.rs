//! Durable, per-agent memory file store.
//!
//! Each agent's files live in the storage namespace `memory:{agent_id}`,
//! keyed by normalized relative path. Every operation takes a
//! [`ResolvedPath`], and the namespace is derived from the agent recorded
//! inside it, so one agent can never address another agent's files.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use warden_core::{AgentId, Timestamp};
use warden_storage::{KvStore, ScopedKvStore};

use crate::error::{MemoryError, MemoryResult};
use crate::path::{PathResolver, ResolvedPath};

/// Default ceiling on the size of a memory file, in UTF-8 bytes.
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 100_000;

/// A stored memory file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Owning agent.
    pub agent_id: AgentId,
    /// Normalized path relative to the agent root.
    pub path: String,
    /// File content.
    pub content: String,
    /// When the file was first written.
    pub created_at: Timestamp,
    /// When the file was last changed.
    pub updated_at: Timestamp,
}

/// Path-addressed content store scoped per agent.
#[derive(Clone)]
pub struct MemoryStore {
    kv: Arc<dyn KvStore>,
    resolver: PathResolver,
    max_content_bytes: usize,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("resolver", &self.resolver)
            .field("max_content_bytes", &self.max_content_bytes)
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Create a store over `kv` with the default resolver and size ceiling.
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            kv,
            resolver: PathResolver::default(),
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
        }
    }

    /// Use a custom path resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: PathResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Set the maximum content size, in bytes.
    #[must_use]
    pub fn with_max_content_bytes(mut self, max: usize) -> Self {
        self.max_content_bytes = max;
        self
    }

    /// The resolver used for [`resolve`](Self::resolve).
    #[must_use]
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// The maximum content size, in bytes.
    #[must_use]
    pub fn max_content_bytes(&self) -> usize {
        self.max_content_bytes
    }

    /// Resolve a raw path for `agent` with this store's resolver.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::InvalidPath`] if the path is rejected.
    pub fn resolve(&self, agent: &AgentId, logical_path: &str) -> MemoryResult<ResolvedPath> {
        self.resolver.resolve(agent, logical_path)
    }

    /// Check `content` against the size ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ContentTooLarge`] if the content is over the
    /// ceiling.
    pub fn check_size(&self, content: &str) -> MemoryResult<()> {
        if content.len() > self.max_content_bytes {
            return Err(MemoryError::ContentTooLarge {
                size: content.len(),
                max: self.max_content_bytes,
            });
        }
        Ok(())
    }

    /// The content an append of `addition` onto `existing` produces.
    ///
    /// A newline is inserted between the two unless the existing content
    /// is empty or already ends with one.
    #[must_use]
    pub fn appended(existing: Option<&str>, addition: &str) -> String {
        match existing {
            None | Some("") => addition.to_string(),
            Some(prev) if prev.ends_with('\n') => format!("{prev}{addition}"),
            Some(prev) => format!("{prev}\n{addition}"),
        }
    }

    fn scope(&self, agent: &AgentId) -> MemoryResult<ScopedKvStore> {
        ScopedKvStore::new(Arc::clone(&self.kv), format!("memory:{agent}"))
            .map_err(MemoryError::from)
    }

    /// Read a file's content.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::NotFound`] if the file does not exist, or a
    /// storage error.
    pub async fn read(&self, path: &ResolvedPath) -> MemoryResult<String> {
        self.read_optional(path)
            .await?
            .map(|entry| entry.content)
            .ok_or_else(|| MemoryError::NotFound {
                path: path.to_string(),
            })
    }

    /// Read a file entry, returning `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails or the record is corrupt.
    pub async fn read_optional(&self, path: &ResolvedPath) -> MemoryResult<Option<MemoryEntry>> {
        let scope = self.scope(path.agent_id())?;
        Ok(scope.get_json(path.as_str()).await?)
    }

    /// Create or replace a file.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ContentTooLarge`] if `content` is over the
    /// ceiling, or a storage error.
    pub async fn write(&self, path: &ResolvedPath, content: &str) -> MemoryResult<MemoryEntry> {
        self.check_size(content)?;
        let scope = self.scope(path.agent_id())?;
        let existing: Option<MemoryEntry> = scope.get_json(path.as_str()).await?;
        Self::put(&scope, path, content.to_string(), existing).await
    }

    /// Append to a file, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ContentTooLarge`] if the resulting file is over
    /// the ceiling, or a storage error.
    pub async fn append(&self, path: &ResolvedPath, addition: &str) -> MemoryResult<MemoryEntry> {
        let scope = self.scope(path.agent_id())?;
        let existing: Option<MemoryEntry> = scope.get_json(path.as_str()).await?;
        let content = Self::appended(existing.as_ref().map(|e| e.content.as_str()), addition);
        self.check_size(&content)?;
        Self::put(&scope, path, content, existing).await
    }

    async fn put(
        scope: &ScopedKvStore,
        path: &ResolvedPath,
        content: String,
        existing: Option<MemoryEntry>,
    ) -> MemoryResult<MemoryEntry> {
        let now = Timestamp::now();
        let entry = MemoryEntry {
            agent_id: path.agent_id().clone(),
            path: path.as_str().to_string(),
            created_at: existing.map_or(now, |e| e.created_at),
            updated_at: now,
            content,
        };
        scope.set_json(path.as_str(), &entry).await?;
        debug!(
            agent_id = %entry.agent_id,
            path = %entry.path,
            bytes = entry.content.len(),
            "memory file written"
        );
        Ok(entry)
    }

    /// Delete a file. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    pub async fn delete(&self, path: &ResolvedPath) -> MemoryResult<bool> {
        let scope = self.scope(path.agent_id())?;
        let existed = scope.delete(path.as_str()).await?;
        debug!(agent_id = %path.agent_id(), path = %path, existed, "memory file deleted");
        Ok(existed)
    }

    /// Put `path` back to a previously read state.
    ///
    /// `Some` rewrites the entry as it was, timestamps included; `None`
    /// removes the file.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    pub async fn restore(
        &self,
        path: &ResolvedPath,
        entry: Option<&MemoryEntry>,
    ) -> MemoryResult<()> {
        let scope = self.scope(path.agent_id())?;
        match entry {
            Some(entry) => scope.set_json(path.as_str(), entry).await?,
            None => {
                scope.delete(path.as_str()).await?;
            },
        }
        debug!(agent_id = %path.agent_id(), path = %path, "memory file restored");
        Ok(())
    }

    /// List an agent's files, optionally restricted to a directory.
    ///
    /// Paths are returned sorted.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::InvalidPath`] if `directory` is rejected, or a
    /// storage error.
    pub async fn list(&self, agent: &AgentId, directory: Option<&str>) -> MemoryResult<Vec<String>> {
        let scope = self.scope(agent)?;
        let mut keys = match directory {
            Some(dir) => {
                let prefix = self.resolver.resolve_dir(agent, dir)?;
                scope.list_keys_with_prefix(&prefix).await?
            },
            None => scope.list_keys().await?,
        };
        keys.sort();
        Ok(keys)
    }

    /// Total size of an agent's files, in bytes.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    pub async fn total_size(&self, agent: &AgentId) -> MemoryResult<u64> {
        let scope = self.scope(agent)?;
        let mut total: u64 = 0;
        for key in scope.list_keys().await? {
            if let Some(entry) = scope.get_json::<MemoryEntry>(&key).await? {
                let len = u64::try_from(entry.content.len()).unwrap_or(u64::MAX);
                total = total.saturating_add(len);
            }
        }
        Ok(total)
    }
}
