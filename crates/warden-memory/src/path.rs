//! Logical path resolution for agent memory.
//!
//! Resolution is purely lexical. It never consults storage, so the same
//! check can run when a request is created and again when it is applied.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use warden_core::AgentId;

use crate::error::{MemoryError, MemoryResult};

static SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("invalid regex"));

static FILE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+\.([A-Za-z0-9]+)$").expect("invalid regex"));

/// Rules a memory path must satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPolicy {
    /// First segment of a fully qualified path (`agents/{id}/...`).
    pub namespace_root: String,
    /// Top-level directories an agent may write under.
    pub writable_dirs: Vec<String>,
    /// Allowed file extensions, without the dot.
    pub extensions: Vec<String>,
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self {
            namespace_root: "agents".to_string(),
            writable_dirs: vec!["knowledge".to_string(), "skills".to_string()],
            extensions: vec!["md".to_string(), "txt".to_string(), "json".to_string()],
        }
    }
}

/// A memory path that has passed validation for one agent.
///
/// Only [`PathResolver`] can construct this, so holding one is proof that
/// the path stays inside the agent's writable directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath {
    agent_id: AgentId,
    relative: String,
}

impl ResolvedPath {
    /// The agent that owns this path.
    #[must_use]
    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// The normalized path relative to the agent root, e.g. `knowledge/x.md`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.relative
    }

    /// The top-level writable directory, e.g. `knowledge`.
    #[must_use]
    pub fn top_dir(&self) -> &str {
        self.relative
            .split_once('/')
            .map_or(self.relative.as_str(), |(dir, _)| dir)
    }

    /// The final path segment.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.relative
            .rsplit_once('/')
            .map_or(self.relative.as_str(), |(_, name)| name)
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative)
    }
}

/// Validates and normalizes agent-supplied memory paths.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    policy: PathPolicy,
}

impl PathResolver {
    /// Create a resolver with a custom policy.
    #[must_use]
    pub fn new(policy: PathPolicy) -> Self {
        Self { policy }
    }

    /// The active policy.
    #[must_use]
    pub fn policy(&self) -> &PathPolicy {
        &self.policy
    }

    /// Resolve `logical_path` for `agent`.
    ///
    /// Both `/` and `\` separate segments. Empty and `.` segments are
    /// dropped. A path rooted at `{namespace_root}/{id}/` must name `agent`
    /// and has that prefix stripped.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::InvalidPath`] when the path contains `..`,
    /// percent-encoding, or control characters; names another agent's
    /// namespace; is outside the writable directories; or has a segment or
    /// file name outside the allowed grammar.
    pub fn resolve(&self, agent: &AgentId, logical_path: &str) -> MemoryResult<ResolvedPath> {
        let segments = self.canonical_segments(agent, logical_path)?;
        let invalid = |reason: String| MemoryError::InvalidPath {
            path: logical_path.to_string(),
            reason,
        };

        let Some((file_name, dirs)) = segments.split_last() else {
            return Err(invalid("path is empty".into()));
        };
        let Some(top) = dirs.first() else {
            return Err(invalid(format!(
                "path must be inside one of: {}",
                self.policy.writable_dirs.join(", ")
            )));
        };
        self.check_top_dir(top).map_err(invalid)?;

        if let Some(bad) = dirs.iter().find(|d| !SEGMENT_RE.is_match(d)) {
            return Err(invalid(format!("invalid directory name '{bad}'")));
        }

        let Some(caps) = FILE_NAME_RE.captures(file_name) else {
            return Err(invalid(format!("invalid file name '{file_name}'")));
        };
        let extension = caps.get(1).map_or("", |m| m.as_str());
        if !self.policy.extensions.iter().any(|e| e == extension) {
            return Err(invalid(format!(
                "extension '.{extension}' not allowed; use one of: {}",
                self.policy.extensions.join(", ")
            )));
        }

        Ok(ResolvedPath {
            agent_id: agent.clone(),
            relative: segments.join("/"),
        })
    }

    /// Resolve a directory prefix for listing.
    ///
    /// Returns the normalized prefix with a trailing `/`, e.g. `knowledge/`.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::InvalidPath`] under the same rules as
    /// [`resolve`](Self::resolve), applied to directory segments only.
    pub fn resolve_dir(&self, agent: &AgentId, logical_dir: &str) -> MemoryResult<String> {
        let segments = self.canonical_segments(agent, logical_dir)?;
        let invalid = |reason: String| MemoryError::InvalidPath {
            path: logical_dir.to_string(),
            reason,
        };

        let Some(top) = segments.first() else {
            return Err(invalid("directory is empty".into()));
        };
        self.check_top_dir(top).map_err(invalid)?;
        if let Some(bad) = segments.iter().find(|d| !SEGMENT_RE.is_match(d)) {
            return Err(invalid(format!("invalid directory name '{bad}'")));
        }

        let mut prefix = segments.join("/");
        prefix.push('/');
        Ok(prefix)
    }

    /// Split, clean, and de-namespace a raw path.
    fn canonical_segments<'a>(
        &self,
        agent: &AgentId,
        raw: &'a str,
    ) -> MemoryResult<Vec<&'a str>> {
        let invalid = |reason: &str| MemoryError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.contains('%') {
            return Err(invalid("percent-encoded sequences are not allowed"));
        }
        if raw.chars().any(char::is_control) {
            return Err(invalid("control characters are not allowed"));
        }

        let mut segments: Vec<&str> = raw
            .split(['/', '\\'])
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();

        if segments.contains(&"..") {
            return Err(invalid("parent directory segments are not allowed"));
        }

        if segments.first() == Some(&self.policy.namespace_root.as_str()) {
            match segments.get(1).copied() {
                Some(owner) if owner == agent.as_str() => {
                    segments = segments.split_off(2);
                },
                Some(_) => return Err(invalid("path names another agent's namespace")),
                None => return Err(invalid("namespace path is missing an agent id")),
            }
        }

        Ok(segments)
    }

    fn check_top_dir(&self, top: &str) -> Result<(), String> {
        if self.policy.writable_dirs.iter().any(|d| d == top) {
            Ok(())
        } else {
            Err(format!(
                "path must be inside one of: {}",
                self.policy.writable_dirs.join(", ")
            ))
        }
    }
}
