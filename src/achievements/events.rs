//! Countable host events and how each one moves the yearly counters
//!
//! The printer-control and plugin subsystems emit these; the tracker applies
//! them to whichever year record is current at the time of the call.

use super::stats::{Counter, YearlyStats};
use chrono::{DateTime, Datelike, Local, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Weekday index as stored in `prints_started_per_weekday` (Monday = 0)
pub fn weekday_index(weekday: Weekday) -> u8 {
    weekday.num_days_from_monday() as u8
}

/// A single addressable counter slot, for `YearlyStatsTracker::increment`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    Counter(Counter),
    /// One weekday slot of `prints_started_per_weekday`
    PrintsStartedOn(Weekday),
}

impl From<Counter> for StatField {
    fn from(counter: Counter) -> Self {
        StatField::Counter(counter)
    }
}

impl From<Weekday> for StatField {
    fn from(weekday: Weekday) -> Self {
        StatField::PrintsStartedOn(weekday)
    }
}

/// How a print job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintOutcome {
    Finished,
    Cancelled,
    Errored,
}

impl PrintOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for PrintOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrintOutcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "finished" | "done" => Ok(Self::Finished),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "errored" | "failed" => Ok(Self::Errored),
            other => anyhow::bail!("unknown print outcome '{}'", other),
        }
    }
}

/// Events that feed the yearly statistics
#[derive(Debug, Clone, PartialEq)]
pub enum StatsEvent {
    ServerStarted {
        version: String,
    },
    PrintStarted {
        at: DateTime<Local>,
    },
    PrintDone {
        outcome: PrintOutcome,
        /// Seconds
        duration: f64,
        at: DateTime<Local>,
    },
    FileUploaded,
    FileDeleted,
    PluginInstalled,
    PluginUninstalled,
    /// Number of plugins currently installed
    PluginCount {
        count: u64,
    },
    AchievementUnlocked,
}

impl StatsEvent {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::ServerStarted { .. } => "server_started",
            Self::PrintStarted { .. } => "print_started",
            Self::PrintDone { .. } => "print_done",
            Self::FileUploaded => "file_uploaded",
            Self::FileDeleted => "file_deleted",
            Self::PluginInstalled => "plugin_installed",
            Self::PluginUninstalled => "plugin_uninstalled",
            Self::PluginCount { .. } => "plugin_count",
            Self::AchievementUnlocked => "achievement_unlocked",
        }
    }
}

impl YearlyStats {
    /// Bump a single counter slot, returning its new value
    pub fn increment(&mut self, field: StatField, amount: u64) -> u64 {
        let slot = match field {
            StatField::Counter(counter) => self.counter_mut(counter),
            StatField::PrintsStartedOn(weekday) => self
                .prints_started_per_weekday
                .entry(weekday_index(weekday))
                .or_insert(0),
        };
        *slot = slot.saturating_add(amount);
        *slot
    }

    /// Apply one host event
    pub fn apply(&mut self, event: &StatsEvent) {
        match event {
            StatsEvent::ServerStarted { version } => {
                self.increment(Counter::ServerStarts.into(), 1);
                if !version.is_empty() && *version != self.last_version {
                    self.increment(Counter::SeenVersions.into(), 1);
                    self.last_version = version.clone();
                }
            }
            StatsEvent::PrintStarted { at } => {
                self.increment(Counter::PrintsStarted.into(), 1);
                self.increment(StatField::PrintsStartedOn(at.weekday()), 1);
            }
            StatsEvent::PrintDone {
                outcome,
                duration,
                at,
            } => {
                // JSON has no encoding for inf/NaN; one of those would make
                // the whole year file unreadable
                let duration = if duration.is_finite() {
                    duration.max(0.0)
                } else {
                    tracing::warn!("Ignoring non-finite print duration {}", duration);
                    0.0
                };
                self.print_duration_total += duration;
                match outcome {
                    PrintOutcome::Finished => {
                        self.increment(Counter::PrintsFinished.into(), 1);
                        self.print_duration_finished += duration;
                        if duration > self.longest_print_duration {
                            self.longest_print_duration = duration;
                            self.longest_print_date = at.timestamp();
                        }
                    }
                    PrintOutcome::Cancelled => {
                        self.increment(Counter::PrintsCancelled.into(), 1);
                        self.print_duration_cancelled += duration;
                    }
                    PrintOutcome::Errored => {
                        self.increment(Counter::PrintsErrored.into(), 1);
                        self.print_duration_errored += duration;
                    }
                }
            }
            StatsEvent::FileUploaded => {
                self.increment(Counter::FilesUploaded.into(), 1);
            }
            StatsEvent::FileDeleted => {
                self.increment(Counter::FilesDeleted.into(), 1);
            }
            StatsEvent::PluginInstalled => {
                self.increment(Counter::PluginsInstalled.into(), 1);
            }
            StatsEvent::PluginUninstalled => {
                self.increment(Counter::PluginsUninstalled.into(), 1);
            }
            StatsEvent::PluginCount { count } => {
                self.most_plugins = self.most_plugins.max(*count);
            }
            StatsEvent::AchievementUnlocked => {
                self.increment(Counter::Achievements.into(), 1);
            }
        }
    }
}
