//! Configuration types.
//!
//! These types do not depend on other warden crates. The runtime converts
//! them into domain types at startup. Every struct implements [`Default`]
//! with the same values as `defaults.toml`, so a bare `[section]` header
//! produces a working configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Memory file limits and path rules.
    pub memory: MemorySection,
    /// Which actions need approval.
    pub approval: ApprovalSection,
    /// Where requests and memory files are kept.
    pub storage: StorageSection,
    /// Logging level, format, and directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// MemorySection
// ---------------------------------------------------------------------------

/// Memory store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySection {
    /// Largest file the store accepts, in bytes of UTF-8.
    pub max_content_bytes: usize,
    /// Leading segment of fully qualified paths (`agents/{id}/...`).
    pub namespace_root: String,
    /// Top-level directories an agent may write under.
    pub writable_dirs: Vec<String>,
    /// Allowed file extensions, without the dot.
    pub extensions: Vec<String>,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            max_content_bytes: 100_000,
            namespace_root: "agents".to_owned(),
            writable_dirs: vec!["knowledge".to_owned(), "skills".to_owned()],
            extensions: vec!["md".to_owned(), "txt".to_owned(), "json".to_owned()],
        }
    }
}

// ---------------------------------------------------------------------------
// ApprovalSection
// ---------------------------------------------------------------------------

/// Approval requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalSection {
    /// Whether memory actions need approval when the agent has no override.
    pub default_required: bool,
    /// Tool names whose actions always need approval.
    pub tools: Vec<String>,
    /// Buffer size of the reviewer event channel.
    pub event_capacity: usize,
    /// Per-agent overrides, keyed by agent id.
    pub agents: HashMap<String, AgentApproval>,
}

impl Default for ApprovalSection {
    fn default() -> Self {
        Self {
            default_required: true,
            tools: vec!["update_memory".to_owned()],
            event_capacity: 1024,
            agents: HashMap::new(),
        }
    }
}

/// Approval settings for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentApproval {
    /// Whether this agent's memory actions need approval.
    pub memory_approval_required: bool,
}

// ---------------------------------------------------------------------------
// StorageSection
// ---------------------------------------------------------------------------

/// Storage backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory. Nothing survives a restart.
    #[default]
    Memory,
    /// `SurrealKV` files on disk.
    Surrealkv,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Which backend to open.
    pub backend: StorageBackend,
    /// Data directory for on-disk backends. `None` uses `~/.warden/state`.
    pub path: Option<String>,
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global level (`"trace"`, `"debug"`, `"info"`, `"warn"`, `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate directives, e.g. `["warden_approval=debug"]`.
    pub directives: Vec<String>,
    /// Write rolling log files to this directory instead of stderr.
    pub directory: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            directory: None,
        }
    }
}
