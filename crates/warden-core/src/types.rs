//! Identifier and value types shared across Warden.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Maximum length of an agent identifier, in bytes.
pub const MAX_AGENT_ID_LEN: usize = 128;

// ---------------------------------------------------------------------------
// AgentId
// ---------------------------------------------------------------------------

/// Identifier of an agent.
///
/// Agent ids are used verbatim as storage namespace components, so they are
/// restricted to ASCII alphanumerics, `-`, and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentId(String);

impl AgentId {
    /// Create a validated agent id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAgentId`] if the id is empty, longer than
    /// [`MAX_AGENT_ID_LEN`], or contains characters outside `[A-Za-z0-9_-]`.
    pub fn new(value: impl Into<String>) -> CoreResult<Self> {
        let value = value.into();
        if let Some(reason) = agent_id_problem(&value) {
            return Err(CoreError::InvalidAgentId { value, reason });
        }
        Ok(Self(value))
    }

    /// Check whether a raw string would be accepted as an agent id.
    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        agent_id_problem(value).is_none()
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn agent_id_problem(value: &str) -> Option<String> {
    if value.is_empty() {
        return Some("must not be empty".into());
    }
    if value.len() > MAX_AGENT_ID_LEN {
        return Some(format!("longer than {MAX_AGENT_ID_LEN} bytes"));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Some(format!("forbidden character {bad:?}"));
    }
    None
}

impl TryFrom<String> for AgentId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AgentId> for String {
    fn from(id: AgentId) -> Self {
        id.0
    }
}

impl FromStr for AgentId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Engine-assigned identifiers
// ---------------------------------------------------------------------------

/// Identifier of a conversation thread inside the execution engine.
///
/// Opaque to Warden. A thread has at most one paused action at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub String);

impl ThreadId {
    /// Wrap an engine-supplied thread id.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a paused action (a single tool call) inside the engine.
///
/// This is what the engine needs to resume execution. It is deliberately a
/// different type from [`RequestId`] so the two can never be swapped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub String);

impl ActionId {
    /// Wrap an engine-supplied action id.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RequestId
// ---------------------------------------------------------------------------

/// Unique identifier for an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Create a new random request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The storage key used for this request (the bare UUID).
    #[must_use]
    pub fn key(&self) -> String {
        self.0.to_string()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    /// Parses both the bare UUID and the `req:`-prefixed display form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("req:").unwrap_or(s);
        Uuid::parse_str(raw).map(Self)
    }
}

// ---------------------------------------------------------------------------
// MemoryOperation
// ---------------------------------------------------------------------------

/// The kind of mutation a memory action performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryOperation {
    /// Replace the file content (creating it if needed).
    Write,
    /// Add to the end of the existing content.
    Append,
    /// Remove the file.
    Delete,
}

impl MemoryOperation {
    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Append => "append",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for MemoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryOperation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "write" => Ok(Self::Write),
            "append" => Ok(Self::Append),
            "delete" => Ok(Self::Delete),
            other => Err(CoreError::UnknownOperation(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// Timestamp wrapper for consistent handling throughout Warden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// Get the current timestamp.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Check if this timestamp is in the past.
    #[must_use]
    pub fn is_past(&self) -> bool {
        self.0 < Utc::now()
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_accepts_simple_ids() {
        assert!(AgentId::new("agent-1").is_ok());
        assert!(AgentId::new("Support_Bot").is_ok());
        assert!(AgentId::is_valid("a"));
    }

    #[test]
    fn test_agent_id_rejects_bad_input() {
        assert!(AgentId::new("").is_err());
        assert!(AgentId::new("../other").is_err());
        assert!(AgentId::new("a/b").is_err());
        assert!(AgentId::new("a b").is_err());
        assert!(AgentId::new("x".repeat(MAX_AGENT_ID_LEN.saturating_add(1))).is_err());
    }

    #[test]
    fn test_agent_id_serde_validates() {
        let ok: AgentId = serde_json::from_str("\"agent-7\"").unwrap();
        assert_eq!(ok.as_str(), "agent-7");

        let bad: Result<AgentId, _> = serde_json::from_str("\"../etc\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_request_id_display_and_parse() {
        let id = RequestId::new();
        let shown = id.to_string();
        assert!(shown.starts_with("req:"));

        let parsed: RequestId = shown.parse().unwrap();
        assert_eq!(parsed, id);

        let bare: RequestId = id.key().parse().unwrap();
        assert_eq!(bare, id);
    }

    #[test]
    fn test_request_ids_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_memory_operation_round_trip_names() {
        for op in [
            MemoryOperation::Write,
            MemoryOperation::Append,
            MemoryOperation::Delete,
        ] {
            assert_eq!(op.as_str().parse::<MemoryOperation>().unwrap(), op);
        }
        assert!("rename".parse::<MemoryOperation>().is_err());
    }

    #[test]
    fn test_memory_operation_serde_snake_case() {
        let json = serde_json::to_string(&MemoryOperation::Append).unwrap();
        assert_eq!(json, "\"append\"");
    }

    #[test]
    fn test_timestamp_display_format() {
        let ts = Timestamp::now();
        let s = ts.to_string();
        assert!(s.ends_with('Z'));
        assert_eq!(s.len(), 20);
    }
}
