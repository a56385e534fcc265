//! Post-merge validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Largest accepted `memory.max_content_bytes` (10 MB).
const MAX_CONTENT_UPPER_BOUND: usize = 10_485_760;

/// Longest accepted agent id.
const MAX_AGENT_ID_LEN: usize = 128;

/// Validate a merged configuration.
///
/// # Errors
///
/// Returns the first [`ConfigError::ValidationError`] found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_memory(config)?;
    validate_approval(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

fn is_segment(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn validate_memory(config: &Config) -> ConfigResult<()> {
    let m = &config.memory;

    if m.max_content_bytes == 0 || m.max_content_bytes > MAX_CONTENT_UPPER_BOUND {
        return Err(invalid(
            "memory.max_content_bytes",
            format!(
                "{} is out of range; must be between 1 and {MAX_CONTENT_UPPER_BOUND}",
                m.max_content_bytes
            ),
        ));
    }

    if !is_segment(&m.namespace_root) {
        return Err(invalid(
            "memory.namespace_root",
            format!("'{}' is not a valid directory name", m.namespace_root),
        ));
    }

    if m.writable_dirs.is_empty() {
        return Err(invalid("memory.writable_dirs", "at least one directory is required"));
    }
    if let Some(bad) = m.writable_dirs.iter().find(|d| !is_segment(d)) {
        return Err(invalid(
            "memory.writable_dirs",
            format!("'{bad}' is not a valid directory name"),
        ));
    }
    if m.writable_dirs.contains(&m.namespace_root) {
        return Err(invalid(
            "memory.writable_dirs",
            format!("'{}' is reserved as the namespace root", m.namespace_root),
        ));
    }

    if m.extensions.is_empty() {
        return Err(invalid("memory.extensions", "at least one extension is required"));
    }
    if let Some(bad) = m
        .extensions
        .iter()
        .find(|e| e.is_empty() || !e.chars().all(|c| c.is_ascii_alphanumeric()))
    {
        return Err(invalid(
            "memory.extensions",
            format!("'{bad}' is not a valid extension; use letters and digits without a dot"),
        ));
    }

    Ok(())
}

fn validate_approval(config: &Config) -> ConfigResult<()> {
    let a = &config.approval;

    if a.event_capacity == 0 {
        return Err(invalid("approval.event_capacity", "must be greater than 0"));
    }

    if let Some(bad) = a.tools.iter().find(|t| t.trim().is_empty()) {
        return Err(invalid(
            "approval.tools",
            format!("'{bad}' is not a valid tool name"),
        ));
    }

    for id in a.agents.keys() {
        if id.len() > MAX_AGENT_ID_LEN || !is_segment(id) {
            return Err(invalid(
                format!("approval.agents.{id}"),
                "agent ids use letters, digits, '_' and '-', up to 128 characters",
            ));
        }
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        ));
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentApproval;

    fn field_of(result: ConfigResult<()>) -> String {
        match result {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        validate(&Config::default()).unwrap();
    }

    #[test]
    fn test_content_ceiling_bounds() {
        let mut config = Config::default();
        config.memory.max_content_bytes = 0;
        assert_eq!(field_of(validate(&config)), "memory.max_content_bytes");

        config.memory.max_content_bytes = MAX_CONTENT_UPPER_BOUND.saturating_add(1);
        assert_eq!(field_of(validate(&config)), "memory.max_content_bytes");
    }

    #[test]
    fn test_bad_directories() {
        let mut config = Config::default();
        config.memory.writable_dirs = vec!["../etc".into()];
        assert_eq!(field_of(validate(&config)), "memory.writable_dirs");

        config.memory.writable_dirs = Vec::new();
        assert_eq!(field_of(validate(&config)), "memory.writable_dirs");

        config.memory.writable_dirs = vec!["agents".into()];
        assert_eq!(field_of(validate(&config)), "memory.writable_dirs");
    }

    #[test]
    fn test_bad_extension() {
        let mut config = Config::default();
        config.memory.extensions = vec![".md".into()];
        assert_eq!(field_of(validate(&config)), "memory.extensions");
    }

    #[test]
    fn test_bad_agent_override() {
        let mut config = Config::default();
        config.approval.agents.insert(
            "not valid!".into(),
            AgentApproval {
                memory_approval_required: false,
            },
        );
        assert_eq!(field_of(validate(&config)), "approval.agents.not valid!");
    }

    #[test]
    fn test_bad_logging() {
        let mut config = Config::default();
        config.logging.level = "loud".into();
        assert_eq!(field_of(validate(&config)), "logging.level");

        let mut config = Config::default();
        config.logging.format = "xml".into();
        assert_eq!(field_of(validate(&config)), "logging.format");
    }
}
