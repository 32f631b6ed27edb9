//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Serialize config to TOML string (single source of truth for format)
    pub fn to_toml(&self) -> String {
        format!(
            r#"# printhost-stats configuration

# Directory for yearly statistics (<year>.json) and migration markers
data_dir = "{data_dir}"

# JSON file listing user accounts, read by the health checks
users_file = "{users_file}"

# Feature flags
[features]
achievements = {achievements}
health_check = {health_check}

# ─────────────────────────────────────────────────────────────────────────────
# HEALTH CHECKS
# ─────────────────────────────────────────────────────────────────────────────
# Keys of checks to skip, e.g. ["only_admins"]

[health_check]
disabled_checks = {disabled_checks}

# ─────────────────────────────────────────────────────────────────────────────
# LOGGING
# ─────────────────────────────────────────────────────────────────────────────
# RUST_LOG overrides level when set.

[logging]
level = "{level}"
file_enabled = {file_enabled}
file_dir = "{file_dir}"
file_rotation = "{file_rotation}"   # hourly, daily, never
file_prefix = "{file_prefix}"
"#,
            data_dir = toml_path(&self.data_dir),
            users_file = toml_path(&self.users_file),
            achievements = self.features.achievements,
            health_check = self.features.health_check,
            disabled_checks = toml_string_list(&self.health_check.disabled_checks),
            level = toml_escape(&self.logging.level),
            file_enabled = self.logging.file_enabled,
            file_dir = toml_path(&self.logging.file_dir),
            file_rotation = self.logging.file_rotation.as_str(),
            file_prefix = toml_escape(&self.logging.file_prefix),
        )
    }
}

/// Contents of a TOML basic string; backslashes and quotes must be escaped
fn toml_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn toml_path(path: &std::path::Path) -> String {
    toml_escape(&path.display().to_string())
}

fn toml_string_list(items: &[String]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|s| format!("\"{}\"", toml_escape(s)))
        .collect();
    format!("[{}]", quoted.join(", "))
}
