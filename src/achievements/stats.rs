//! Per-year usage counters and their JSON shape
//!
//! One `YearlyStats` record exists per calendar year. Field names are the
//! on-disk keys of `<year>.json`; every field defaults to zero so files written
//! by older releases (with fewer fields) still load.

use chrono::{Datelike, Local, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Print starts keyed by weekday index (0 = Monday .. 6 = Sunday).
/// Sparse: a missing key means zero.
pub type WeekdayCounts = BTreeMap<u8, u64>;

/// Highest valid weekday index
pub const MAX_WEEKDAY: u8 = 6;

/// Usage statistics for a single calendar year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YearlyStats {
    pub year: i32,

    /// Epoch seconds at which this record was first created
    pub created: i64,
    pub created_version: String,
    pub last_version: String,

    pub seen_versions: u64,
    pub server_starts: u64,

    pub prints_started: u64,
    pub prints_cancelled: u64,
    pub prints_errored: u64,
    pub prints_finished: u64,

    #[serde(deserialize_with = "deserialize_weekdays")]
    pub prints_started_per_weekday: WeekdayCounts,

    /// Accumulated print time in seconds
    pub print_duration_total: f64,
    pub print_duration_cancelled: f64,
    pub print_duration_errored: f64,
    pub print_duration_finished: f64,

    pub longest_print_duration: f64,
    /// Epoch seconds; 0 means no longest print has been recorded
    pub longest_print_date: i64,

    pub files_uploaded: u64,
    pub files_deleted: u64,

    pub plugins_installed: u64,
    pub plugins_uninstalled: u64,
    /// High-water mark of installed plugins
    pub most_plugins: u64,

    pub achievements: u64,
}

/// Counter fields that only grow during a year under normal operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    SeenVersions,
    ServerStarts,
    PrintsStarted,
    PrintsCancelled,
    PrintsErrored,
    PrintsFinished,
    FilesUploaded,
    FilesDeleted,
    PluginsInstalled,
    PluginsUninstalled,
    MostPlugins,
    Achievements,
}

impl Counter {
    /// Every increasing counter, in file order
    pub const INCREASING: [Counter; 12] = [
        Counter::SeenVersions,
        Counter::ServerStarts,
        Counter::PrintsStarted,
        Counter::PrintsCancelled,
        Counter::PrintsErrored,
        Counter::PrintsFinished,
        Counter::FilesUploaded,
        Counter::FilesDeleted,
        Counter::PluginsInstalled,
        Counter::PluginsUninstalled,
        Counter::MostPlugins,
        Counter::Achievements,
    ];

    /// JSON key of this counter
    pub fn as_str(&self) -> &'static str {
        match self {
            Counter::SeenVersions => "seen_versions",
            Counter::ServerStarts => "server_starts",
            Counter::PrintsStarted => "prints_started",
            Counter::PrintsCancelled => "prints_cancelled",
            Counter::PrintsErrored => "prints_errored",
            Counter::PrintsFinished => "prints_finished",
            Counter::FilesUploaded => "files_uploaded",
            Counter::FilesDeleted => "files_deleted",
            Counter::PluginsInstalled => "plugins_installed",
            Counter::PluginsUninstalled => "plugins_uninstalled",
            Counter::MostPlugins => "most_plugins",
            Counter::Achievements => "achievements",
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Counter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Counter::INCREASING
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown counter '{}'", s))
    }
}

impl YearlyStats {
    /// Zero-valued record for `year`
    pub fn new(year: i32) -> Self {
        Self {
            year,
            ..Default::default()
        }
    }

    pub fn counter(&self, counter: Counter) -> u64 {
        match counter {
            Counter::SeenVersions => self.seen_versions,
            Counter::ServerStarts => self.server_starts,
            Counter::PrintsStarted => self.prints_started,
            Counter::PrintsCancelled => self.prints_cancelled,
            Counter::PrintsErrored => self.prints_errored,
            Counter::PrintsFinished => self.prints_finished,
            Counter::FilesUploaded => self.files_uploaded,
            Counter::FilesDeleted => self.files_deleted,
            Counter::PluginsInstalled => self.plugins_installed,
            Counter::PluginsUninstalled => self.plugins_uninstalled,
            Counter::MostPlugins => self.most_plugins,
            Counter::Achievements => self.achievements,
        }
    }

    pub fn counter_mut(&mut self, counter: Counter) -> &mut u64 {
        match counter {
            Counter::SeenVersions => &mut self.seen_versions,
            Counter::ServerStarts => &mut self.server_starts,
            Counter::PrintsStarted => &mut self.prints_started,
            Counter::PrintsCancelled => &mut self.prints_cancelled,
            Counter::PrintsErrored => &mut self.prints_errored,
            Counter::PrintsFinished => &mut self.prints_finished,
            Counter::FilesUploaded => &mut self.files_uploaded,
            Counter::FilesDeleted => &mut self.files_deleted,
            Counter::PluginsInstalled => &mut self.plugins_installed,
            Counter::PluginsUninstalled => &mut self.plugins_uninstalled,
            Counter::MostPlugins => &mut self.most_plugins,
            Counter::Achievements => &mut self.achievements,
        }
    }

    /// Print starts recorded for a weekday index (absent = 0)
    pub fn weekday_count(&self, weekday: u8) -> u64 {
        self.prints_started_per_weekday
            .get(&weekday)
            .copied()
            .unwrap_or(0)
    }

    /// Local calendar year of the longest print, if one was recorded
    pub fn longest_print_year(&self) -> Option<i32> {
        if self.longest_print_date == 0 {
            return None;
        }
        Local
            .timestamp_opt(self.longest_print_date, 0)
            .single()
            .map(|dt| dt.year())
    }

    /// Forget the longest print
    pub fn clear_longest_print(&mut self) {
        self.longest_print_duration = 0.0;
        self.longest_print_date = 0;
    }

    /// Fold another year's record into this one (used for lifetime totals).
    ///
    /// Counters, weekday slots and durations add up, `most_plugins` keeps the
    /// maximum, and the longest print wins on duration.
    pub fn accumulate(&mut self, other: &YearlyStats) {
        for counter in Counter::INCREASING {
            if counter == Counter::MostPlugins {
                self.most_plugins = self.most_plugins.max(other.most_plugins);
            } else {
                *self.counter_mut(counter) += other.counter(counter);
            }
        }

        for (day, count) in &other.prints_started_per_weekday {
            *self.prints_started_per_weekday.entry(*day).or_insert(0) += count;
        }

        self.print_duration_total += other.print_duration_total;
        self.print_duration_cancelled += other.print_duration_cancelled;
        self.print_duration_errored += other.print_duration_errored;
        self.print_duration_finished += other.print_duration_finished;

        if other.longest_print_date != 0
            && other.longest_print_duration > self.longest_print_duration
        {
            self.longest_print_duration = other.longest_print_duration;
            self.longest_print_date = other.longest_print_date;
        }

        if !other.last_version.is_empty() {
            self.last_version = other.last_version.clone();
        }
    }
}

/// Weekday map keys arrive as JSON strings; anything that isn't 0..=6 is dropped.
fn deserialize_weekdays<'de, D>(deserializer: D) -> Result<WeekdayCounts, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, u64>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, count)| {
            let day = key.trim().parse::<u8>().ok()?;
            (day <= MAX_WEEKDAY).then_some((day, count))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_zero() {
        let stats: YearlyStats = serde_json::from_str(r#"{"year": 2024, "server_starts": 3}"#)
            .expect("deserialize");

        assert_eq!(stats.year, 2024);
        assert_eq!(stats.server_starts, 3);
        assert_eq!(stats.prints_finished, 0);
        assert!(stats.prints_started_per_weekday.is_empty());
        assert_eq!(stats.longest_print_year(), None);
    }

    #[test]
    fn test_weekday_keys_outside_range_are_dropped() {
        let stats: YearlyStats = serde_json::from_str(
            r#"{"year": 2025, "prints_started_per_weekday": {"0": 4, "6": 1, "7": 9, "x": 2}}"#,
        )
        .expect("deserialize");

        assert_eq!(stats.weekday_count(0), 4);
        assert_eq!(stats.weekday_count(6), 1);
        assert_eq!(stats.prints_started_per_weekday.len(), 2);
    }

    #[test]
    fn test_weekday_keys_serialize_as_strings() {
        let mut stats = YearlyStats::new(2025);
        stats.prints_started_per_weekday.insert(2, 5);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["prints_started_per_weekday"]["2"], 5);
    }

    #[test]
    fn test_counter_accessors_cover_every_field() {
        let mut stats = YearlyStats::new(2025);
        for (i, counter) in Counter::INCREASING.iter().enumerate() {
            *stats.counter_mut(*counter) = i as u64 + 1;
        }

        let json = serde_json::to_value(&stats).unwrap();
        for (i, counter) in Counter::INCREASING.iter().enumerate() {
            assert_eq!(json[counter.as_str()], i as u64 + 1, "{}", counter);
        }
    }

    #[test]
    fn test_counter_from_str() {
        assert_eq!(
            "plugins_installed".parse::<Counter>().unwrap(),
            Counter::PluginsInstalled
        );
        assert!("print_duration_total".parse::<Counter>().is_err());
    }

    #[test]
    fn test_accumulate_sums_and_keeps_maxima() {
        let mut total = YearlyStats::default();

        let mut a = YearlyStats::new(2024);
        a.prints_finished = 10;
        a.most_plugins = 12;
        a.print_duration_total = 100.0;
        a.longest_print_duration = 50.0;
        a.longest_print_date = 1_700_000_000;
        a.prints_started_per_weekday.insert(1, 3);

        let mut b = YearlyStats::new(2025);
        b.prints_finished = 5;
        b.most_plugins = 8;
        b.print_duration_total = 25.0;
        b.longest_print_duration = 20.0;
        b.longest_print_date = 1_740_000_000;
        b.prints_started_per_weekday.insert(1, 2);
        b.last_version = "1.11.0".to_string();

        total.accumulate(&a);
        total.accumulate(&b);

        assert_eq!(total.prints_finished, 15);
        assert_eq!(total.most_plugins, 12);
        assert_eq!(total.weekday_count(1), 5);
        assert!((total.print_duration_total - 125.0).abs() < f64::EPSILON);
        assert_eq!(total.longest_print_date, 1_700_000_000);
        assert_eq!(total.last_version, "1.11.0");
    }
}
