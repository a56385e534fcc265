//! Environment variable fallbacks.
//!
//! Environment variables fill in fields that no config file set. They never
//! override a value a file set explicitly.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: ValueKind,
}

#[derive(Clone, Copy)]
enum ValueKind {
    String,
    Integer,
    Boolean,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "WARDEN_LOG_LEVEL",
        field_path: "logging.level",
        kind: ValueKind::String,
    },
    EnvMapping {
        var_name: "WARDEN_LOG_FORMAT",
        field_path: "logging.format",
        kind: ValueKind::String,
    },
    EnvMapping {
        var_name: "WARDEN_LOG_DIR",
        field_path: "logging.directory",
        kind: ValueKind::String,
    },
    EnvMapping {
        var_name: "WARDEN_STORAGE_BACKEND",
        field_path: "storage.backend",
        kind: ValueKind::String,
    },
    EnvMapping {
        var_name: "WARDEN_STORAGE_PATH",
        field_path: "storage.path",
        kind: ValueKind::String,
    },
    EnvMapping {
        var_name: "WARDEN_MEMORY_MAX_CONTENT_BYTES",
        field_path: "memory.max_content_bytes",
        kind: ValueKind::Integer,
    },
    EnvMapping {
        var_name: "WARDEN_APPROVAL_DEFAULT_REQUIRED",
        field_path: "approval.default_required",
        kind: ValueKind::Boolean,
    },
];

/// Apply fallbacks for every mapped field no file layer has set.
///
/// Returns the number of variables applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );
            set_field(merged, mapping.field_path, coerce(mapping.kind, val));
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Collect the current process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Values that fail to parse stay strings so deserialization reports them.
fn coerce(kind: ValueKind, val: &str) -> toml::Value {
    match kind {
        ValueKind::Integer => val
            .parse::<i64>()
            .map_or_else(|_| toml::Value::String(val.to_owned()), toml::Value::Integer),
        ValueKind::Boolean => val
            .parse::<bool>()
            .map_or_else(|_| toml::Value::String(val.to_owned()), toml::Value::Boolean),
        ValueKind::String => toml::Value::String(val.to_owned()),
    }
}

fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut current = root;
    for segment in segments {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        current = table
            .entry(segment.to_owned())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_fallback_applies_to_default_fields() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"info\"\n").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("logging.level".into(), ConfigLayer::Defaults);

        let env = make_env(&[
            ("WARDEN_LOG_LEVEL", "debug"),
            ("WARDEN_MEMORY_MAX_CONTENT_BYTES", "5000"),
            ("WARDEN_APPROVAL_DEFAULT_REQUIRED", "false"),
        ]);
        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 3);
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(merged["memory"]["max_content_bytes"].as_integer(), Some(5000));
        assert_eq!(merged["approval"]["default_required"].as_bool(), Some(false));
        assert_eq!(sources.get("logging.level"), Some(&ConfigLayer::Environment));
    }

    #[test]
    fn test_file_values_win_over_env() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"\n").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("logging.level".into(), ConfigLayer::User);

        let env = make_env(&[("WARDEN_LOG_LEVEL", "trace")]);
        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0);
        assert_eq!(merged["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn test_unparseable_number_stays_string() {
        assert_eq!(
            coerce(ValueKind::Integer, "lots"),
            toml::Value::String("lots".into())
        );
        assert_eq!(coerce(ValueKind::Boolean, "true"), toml::Value::Boolean(true));
    }
}
