//! Feature flags configuration
//!
//! Feature flags for optional modules (opt-out: default enabled).

use serde::Deserialize;

/// Feature flags for optional modules (opt-out: default enabled)
#[derive(Debug, Clone)]
pub struct Features {
    /// Yearly statistics tracking and the issue 5223 repair
    pub achievements: bool,

    /// Health checks
    pub health_check: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            achievements: true,
            health_check: true,
        }
    }
}

/// Feature flags as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileFeatures {
    pub achievements: Option<bool>,
    pub health_check: Option<bool>,
}

impl Features {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileFeatures>) -> Self {
        let file = file.unwrap_or_default();

        Self {
            achievements: file.achievements.unwrap_or(true),
            health_check: file.health_check.unwrap_or(true),
        }
    }
}

/// Health check settings
#[derive(Debug, Clone, Default)]
pub struct HealthCheckConfig {
    /// Check keys to skip, e.g. "only_admins"
    pub disabled_checks: Vec<String>,
}

/// Health check settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileHealthCheck {
    pub disabled_checks: Option<Vec<String>>,
}

impl HealthCheckConfig {
    pub fn from_file(file: Option<FileHealthCheck>) -> Self {
        let file = file.unwrap_or_default();

        Self {
            disabled_checks: file.disabled_checks.unwrap_or_default(),
        }
    }
}
