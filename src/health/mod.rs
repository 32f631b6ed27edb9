//! Health checks
//!
//! Each check inspects some piece of server state and classifies it. The
//! runner executes all registered checks, honouring the `disabled_checks`
//! plugin setting, and reports a check that fails to run as errored rather
//! than aborting the whole pass.

use crate::settings::{PluginSettings, SettingsStore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub mod only_admins;

pub use only_admins::OnlyAdminsCheck;

/// Plugin key used for health check settings
pub const PLUGIN_KEY: &str = "health_check";

/// Severity reported by a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthResult {
    Ok,
    Info,
    Warning,
    Issue,
}

impl HealthResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Issue => "issue",
        }
    }
}

impl fmt::Display for HealthResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub result: HealthResult,
    /// Check-specific details for display
    pub context: Map<String, Value>,
}

impl CheckResult {
    pub fn new(result: HealthResult) -> Self {
        Self {
            result,
            context: Map::new(),
        }
    }
}

pub trait HealthCheck {
    /// Stable identifier, also used in `disabled_checks`
    fn key(&self) -> &'static str;

    /// Inspect state and classify it. `force` asks the check to bypass any
    /// cached result.
    fn perform_check(&self, force: bool) -> anyhow::Result<CheckResult>;
}

/// What happened when the runner invoked a check
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CheckStatus {
    Completed(CheckResult),
    Errored { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub key: String,
    #[serde(flatten)]
    pub status: CheckStatus,
}

pub struct HealthCheckRunner<S> {
    checks: Vec<Box<dyn HealthCheck>>,
    settings: PluginSettings<S>,
}

impl<S: SettingsStore> HealthCheckRunner<S> {
    pub fn new(store: S) -> Self {
        Self {
            checks: Vec::new(),
            settings: PluginSettings::new(store, PLUGIN_KEY)
                .with_default("disabled_checks", Value::Array(Vec::new())),
        }
    }

    pub fn register(&mut self, check: Box<dyn HealthCheck>) {
        self.checks.push(check);
    }

    pub fn with_check(mut self, check: impl HealthCheck + 'static) -> Self {
        self.register(Box::new(check));
        self
    }

    /// Keys of every registered check, in registration order
    pub fn keys(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.key()).collect()
    }

    /// Run all enabled checks in registration order
    pub fn run_all(&self, force: bool) -> Vec<CheckOutcome> {
        let disabled = self.settings.get_string_list("disabled_checks");

        self.checks
            .iter()
            .filter(|check| {
                let skip = disabled.iter().any(|k| k == check.key());
                if skip {
                    tracing::debug!("Health check {} disabled", check.key());
                }
                !skip
            })
            .map(|check| {
                let status = match check.perform_check(force) {
                    Ok(result) => {
                        tracing::debug!("Health check {}: {}", check.key(), result.result);
                        CheckStatus::Completed(result)
                    }
                    Err(e) => {
                        tracing::warn!("Health check {} failed: {:#}", check.key(), e);
                        CheckStatus::Errored {
                            error: format!("{:#}", e),
                        }
                    }
                };
                CheckOutcome {
                    key: check.key().to_string(),
                    status,
                }
            })
            .collect()
    }
}
