//! Flag types produced by the scanner.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How concerning a matched pattern is.
///
/// Ordered so that `Danger > Warning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Worth a second look.
    Warning,
    /// Likely an attempt to change behaviour or leak data.
    Danger,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Danger => write!(f, "danger"),
        }
    }
}

/// A single risk flag raised against scanned content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspiciousFlag {
    /// Identifier of the rule that matched.
    pub pattern_id: String,
    /// The exact substring of the scanned content that matched.
    pub matched_text: String,
    /// Human-readable description of the rule.
    pub description: String,
    /// Severity of the rule.
    pub severity: Severity,
}

impl fmt::Display for SuspiciousFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: \"{}\"",
            self.severity, self.description, self.matched_text
        )
    }
}
