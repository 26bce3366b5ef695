//! Built-in output plugins and registry assembly.
//!
//! The plugin set is static: each `[[plugin]]` entry in the
//! configuration is turned into a value implementing
//! [`AlarmPlugin`](funkwache_core::plugin::AlarmPlugin) at startup.
//! There is no runtime code loading.

pub mod console;
pub mod jsonl;

pub use console::ConsolePlugin;
pub use jsonl::JsonlPlugin;

use funkwache_core::config::PluginEntry;
use funkwache_core::error::{ConfigError, FunkwacheError};
use funkwache_core::plugin::PluginRegistry;

/// Build the plugin registry from the ordered configuration entries.
///
/// Registration order is the configuration order; the dispatcher
/// preserves it. An empty entry list yields an empty registry, which
/// is allowed -- alarms are then parsed and counted but go nowhere.
pub fn build_registry(entries: &[PluginEntry]) -> Result<PluginRegistry, FunkwacheError> {
    let mut registry = PluginRegistry::new();

    for entry in entries {
        match entry.kind.as_str() {
            "console" => {
                registry.register(Box::new(ConsolePlugin::new(entry.name.clone())))?;
            }
            "jsonl" => {
                registry.register(Box::new(JsonlPlugin::new(
                    entry.name.clone(),
                    entry.path.clone(),
                )))?;
            }
            other => {
                return Err(ConfigError::InvalidValue {
                    field: format!("plugin '{}' kind", entry.name),
                    reason: format!("unknown plugin kind '{other}'"),
                }
                .into());
            }
        }
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: &str, path: &str) -> PluginEntry {
        PluginEntry {
            name: name.to_owned(),
            kind: kind.to_owned(),
            path: path.to_owned(),
        }
    }

    #[test]
    fn builds_registry_in_configuration_order() {
        let registry = build_registry(&[
            entry("console", "console", ""),
            entry("archive", "jsonl", "alarms.jsonl"),
        ])
        .unwrap();
        let names: Vec<&str> = registry.list().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["console", "archive"]);
    }

    #[test]
    fn empty_entries_build_empty_registry() {
        let registry = build_registry(&[]).unwrap();
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn unknown_kind_fails() {
        let err = build_registry(&[entry("db", "mysql", "")]).unwrap_err();
        assert!(err.to_string().contains("mysql"));
    }

    #[test]
    fn duplicate_names_fail() {
        let result = build_registry(&[
            entry("out", "console", ""),
            entry("out", "console", ""),
        ]);
        assert!(result.is_err());
    }
}
