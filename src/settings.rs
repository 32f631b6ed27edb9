//! Settings store capability
//!
//! The host's settings system is reduced to a single lookup. Plugins see it
//! through `PluginSettings`, which scopes keys under `plugins.<plugin_key>.`
//! and falls back to the plugin's declared defaults.

use serde_json::Value;
use std::collections::HashMap;

/// Read-only key/value lookup. Keys are dotted paths like
/// `plugins.health_check.disabled_checks`.
pub trait SettingsStore {
    /// `None` means the key is unset; callers apply their own default.
    fn get(&self, key: &str) -> Option<Value>;
}

impl<S: SettingsStore + ?Sized> SettingsStore for &S {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }
}

/// Flat in-memory settings
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: HashMap<String, Value>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }
}

/// Settings view for one plugin
pub struct PluginSettings<S> {
    store: S,
    plugin_key: String,
    defaults: HashMap<String, Value>,
}

impl<S: SettingsStore> PluginSettings<S> {
    pub fn new(store: S, plugin_key: impl Into<String>) -> Self {
        Self {
            store,
            plugin_key: plugin_key.into(),
            defaults: HashMap::new(),
        }
    }

    /// Default returned when the store has no value for `key`
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    pub fn plugin_key(&self) -> &str {
        &self.plugin_key
    }

    /// Store value for `plugins.<plugin_key>.<key>`, else the default
    pub fn get(&self, key: &str) -> Option<Value> {
        let scoped = format!("plugins.{}.{}", self.plugin_key, key);
        self.store
            .get(&scoped)
            .filter(|v| !v.is_null())
            .or_else(|| self.defaults.get(key).cloned())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    /// String list; non-string entries are skipped. Missing key → empty.
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plugin_settings_scopes_keys() {
        let mut store = MemorySettings::new();
        store.set("plugins.health_check.enabled", false);
        store.set("plugins.other.enabled", true);

        let settings = PluginSettings::new(&store, "health_check");
        assert_eq!(settings.get_bool("enabled"), Some(false));
    }

    #[test]
    fn test_plugin_settings_falls_back_to_defaults() {
        let store = MemorySettings::new();
        let settings = PluginSettings::new(store, "achievements").with_default("enabled", true);

        assert_eq!(settings.get_bool("enabled"), Some(true));
        assert_eq!(settings.get("missing"), None);
    }

    #[test]
    fn test_null_value_counts_as_unset() {
        let mut store = MemorySettings::new();
        store.set("plugins.achievements.enabled", Value::Null);

        let settings = PluginSettings::new(store, "achievements").with_default("enabled", true);
        assert_eq!(settings.get_bool("enabled"), Some(true));
    }

    #[test]
    fn test_string_list() {
        let mut store = MemorySettings::new();
        store.set(
            "plugins.health_check.disabled_checks",
            json!(["only_admins", 3, "other"]),
        );

        let settings = PluginSettings::new(store, "health_check");
        assert_eq!(
            settings.get_string_list("disabled_checks"),
            vec!["only_admins".to_string(), "other".to_string()]
        );
        assert!(settings.get_string_list("unset").is_empty());
    }
}
