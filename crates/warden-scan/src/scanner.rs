//! The pattern scanner.

use std::sync::LazyLock;

use crate::flag::{Severity, SuspiciousFlag};
use crate::rules::{ScanRule, default_rules};

static DEFAULT_SCANNER: LazyLock<PatternScanner> = LazyLock::new(PatternScanner::new);

/// Scan `content` with the built-in rule set.
///
/// Shorthand for [`PatternScanner::scan`] on a shared default scanner.
#[must_use]
pub fn scan(content: &str) -> Vec<SuspiciousFlag> {
    DEFAULT_SCANNER.scan(content)
}

/// Runs an ordered list of [`ScanRule`]s over text.
#[derive(Debug, Clone)]
pub struct PatternScanner {
    rules: Vec<ScanRule>,
}

impl PatternScanner {
    /// Create a scanner with the built-in rules.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Create a scanner with a custom rule list.
    #[must_use]
    pub fn with_rules(rules: Vec<ScanRule>) -> Self {
        Self { rules }
    }

    /// Append a rule after the existing ones.
    #[must_use]
    pub fn with_rule(mut self, rule: ScanRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// The rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[ScanRule] {
        &self.rules
    }

    /// Scan `content`, returning every match of every rule.
    ///
    /// Flags are ordered by rule, then by position of the match. Each
    /// flag's `matched_text` is the literal matched slice of `content`.
    #[must_use]
    pub fn scan(&self, content: &str) -> Vec<SuspiciousFlag> {
        self.rules
            .iter()
            .flat_map(|rule| {
                rule.pattern.find_iter(content).map(|m| SuspiciousFlag {
                    pattern_id: rule.id.clone(),
                    matched_text: m.as_str().to_string(),
                    description: rule.description.clone(),
                    severity: rule.severity,
                })
            })
            .collect()
    }

    /// Whether any rule matches `content`.
    #[must_use]
    pub fn has_suspicious_content(&self, content: &str) -> bool {
        self.rules.iter().any(|rule| rule.pattern.is_match(content))
    }

    /// The most severe level among the rules matching `content`.
    #[must_use]
    pub fn highest_severity(&self, content: &str) -> Option<Severity> {
        self.rules
            .iter()
            .filter(|rule| rule.pattern.is_match(content))
            .map(|rule| rule.severity)
            .max()
    }
}

impl Default for PatternScanner {
    fn default() -> Self {
        Self::new()
    }
}
