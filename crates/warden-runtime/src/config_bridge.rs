//! Bridge from `warden_config::Config` to domain types.
//!
//! The config crate has no dependencies on other warden crates. These
//! functions translate its sections into the types the memory store, the
//! interrupt detector, and the logging setup consume, so the conversion
//! happens in one place.

use std::path::PathBuf;

use warden_approval::ApprovalRequirements;
use warden_config::Config;
use warden_core::AgentId;
use warden_memory::PathPolicy;
use warden_telemetry::{LogConfig, LogFormat};

use crate::error::{RuntimeError, RuntimeResult};

/// Convert the `[memory]` section to a [`PathPolicy`].
#[must_use]
pub fn to_path_policy(cfg: &Config) -> PathPolicy {
    PathPolicy {
        namespace_root: cfg.memory.namespace_root.clone(),
        writable_dirs: cfg.memory.writable_dirs.clone(),
        extensions: cfg.memory.extensions.clone(),
    }
}

/// Convert the `[approval]` section to [`ApprovalRequirements`].
///
/// # Errors
///
/// Returns [`RuntimeError::InvalidConfig`] if an override is keyed by
/// something that is not a valid agent id.
pub fn to_approval_requirements(cfg: &Config) -> RuntimeResult<ApprovalRequirements> {
    let mut requirements = ApprovalRequirements {
        default_required: cfg.approval.default_required,
        ..ApprovalRequirements::default()
    };

    for tool in &cfg.approval.tools {
        requirements = requirements.with_tool(tool.as_str());
    }

    for (name, agent) in &cfg.approval.agents {
        let id = AgentId::new(name.as_str()).map_err(|e| RuntimeError::InvalidConfig {
            field: format!("approval.agents.{name}"),
            message: e.to_string(),
        })?;
        requirements = requirements.with_agent(id, agent.memory_approval_required);
    }

    Ok(requirements)
}

/// Convert the `[logging]` section to a [`LogConfig`].
///
/// # Errors
///
/// Returns [`RuntimeError::InvalidConfig`] if the format is unknown.
pub fn to_log_config(cfg: &Config) -> RuntimeResult<LogConfig> {
    let format: LogFormat =
        cfg.logging
            .format
            .parse()
            .map_err(|e: warden_telemetry::TelemetryError| RuntimeError::InvalidConfig {
                field: "logging.format".to_owned(),
                message: e.to_string(),
            })?;

    let mut log = LogConfig::new(cfg.logging.level.as_str()).with_format(format);
    for directive in &cfg.logging.directives {
        log = log.with_directive(directive.as_str());
    }
    if let Some(dir) = &cfg.logging.directory {
        log = log.with_file_logging(PathBuf::from(dir));
    }
    Ok(log)
}
