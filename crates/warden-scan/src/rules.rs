//! The built-in rule set.
//!
//! Declaration order is significant: flags are reported grouped by rule in
//! the order below.

use regex::{Regex, RegexBuilder};

use crate::error::{ScanError, ScanResult};
use crate::flag::Severity;

/// A single scanning rule.
#[derive(Debug, Clone)]
pub struct ScanRule {
    /// Stable identifier, reported as `pattern_id`.
    pub id: String,
    /// Case-insensitive matcher.
    pub pattern: Regex,
    /// Description shown to the reviewer.
    pub description: String,
    /// Severity of every match.
    pub severity: Severity,
}

impl ScanRule {
    /// Compile a rule. Matching is always case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidPattern`] if `pattern` does not compile.
    pub fn new(
        id: impl Into<String>,
        pattern: &str,
        description: impl Into<String>,
        severity: Severity,
    ) -> ScanResult<Self> {
        let id = id.into();
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| ScanError::InvalidPattern {
                id: id.clone(),
                source,
            })?;
        Ok(Self {
            id,
            pattern,
            description: description.into(),
            severity,
        })
    }
}

/// `(id, pattern, description, severity)` for every built-in rule.
const BUILTIN: &[(&str, &str, &str, Severity)] = &[
    (
        "unconditional_action",
        r"\balways\s+(?:do|send|forward|reply|respond)(?:s|es|ed|ing)?\b",
        "Unconditional action instruction",
        Severity::Warning,
    ),
    (
        "automatic_action",
        r"\bautomatically\s+(?:do|send|forward|reply|respond)(?:s|es|ed|ing)?\b",
        "Automatic action instruction",
        Severity::Warning,
    ),
    (
        "bypass_verification",
        r"\bnever\s+(?:ask|check|verify|confirm|wait)(?:s|ed|ing)?\b",
        "Instruction to bypass verification",
        Severity::Danger,
    ),
    (
        "skip_approval",
        r"\bskip(?:s|ped|ping)?\s+(?:the\s+)?(?:approval|verification|confirmation)s?\b",
        "Instruction to skip approval",
        Severity::Danger,
    ),
    (
        "without_verification",
        r"\bwithout\s+(?:asking|checking|verifying|confirming)\b",
        "Action without verification",
        Severity::Danger,
    ),
    (
        "ignore_instructions",
        r"\bignore\s+(?:all\s+)?(?:previous|prior|user|system|instructions)\b",
        "Instruction to ignore prior guidance",
        Severity::Danger,
    ),
    (
        "disregard_instructions",
        r"\bdisregard\s+(?:all\s+)?(?:previous|prior|user|system)\b",
        "Instruction to disregard prior guidance",
        Severity::Danger,
    ),
    (
        "override_settings",
        r"\boverride\s+(?:the\s+)?(?:instructions|settings|rules)\b",
        "Instruction to override settings",
        Severity::Danger,
    ),
    ("url", r"https?://\S+", "Contains URL", Severity::Warning),
    (
        "email_address",
        r"[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}",
        "Contains email address",
        Severity::Warning,
    ),
    (
        "credential_assignment",
        r"\b(?:api[_-]?key|secret|token|password)\s*[:=]",
        "Possible credential",
        Severity::Danger,
    ),
    (
        "execution_call",
        r"\b(?:execute|run|eval)\s*\(",
        "Code execution pattern",
        Severity::Danger,
    ),
    (
        "base64_blob",
        r"[a-z0-9+/]{40,}={0,2}",
        "Possible encoded payload",
        Severity::Warning,
    ),
];

/// Build the built-in rule set, in declaration order.
///
/// # Panics
///
/// Panics if a built-in pattern fails to compile, which the tests rule out.
#[must_use]
pub fn default_rules() -> Vec<ScanRule> {
    BUILTIN
        .iter()
        .map(|(id, pattern, description, severity)| {
            ScanRule::new(*id, pattern, *description, *severity).expect("invalid built-in rule")
        })
        .collect()
}
