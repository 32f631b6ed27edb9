//! One-time repair for issue #5223
//!
//! An earlier release copied the previous year's totals into the new year's
//! record at rollover, so the current year started out with last year's
//! numbers already in it. The repair runs once per installation; the sentinel
//! file `.issue_5223_handled` disables it permanently afterwards.
//!
//! Heuristic: if every increasing counter and every weekday slot of the
//! current year is at least as large as last year's, assume
//! `current = previous + actual` and subtract. Otherwise the data wasn't a
//! plain duplicate and the increasing counters are wiped. In both cases
//! `achievements` and `most_plugins` end up at zero because they can't be
//! delta-corrected.

use super::clock::Clock;
use super::stats::{Counter, YearlyStats};
use super::tracker::YearlyStatsTracker;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Marker file whose existence means the repair already ran
pub const ISSUE_5223_SENTINEL: &str = ".issue_5223_handled";

/// What `fix_current_year_data` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    /// Sentinel present, nothing touched
    AlreadyHandled,
    /// No file for last year, nothing touched
    NoPreviousYear,
    /// Counters looked duplicated; last year's values were subtracted
    Subtracted,
    /// Counters were inconsistent; increasing counters were zeroed
    Reset,
}

impl RepairOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyHandled => "already handled",
            Self::NoPreviousYear => "no previous year",
            Self::Subtracted => "subtracted previous year",
            Self::Reset => "reset counters",
        }
    }
}

/// True if `current` dominates `previous` on every increasing counter and
/// every weekday slot.
fn all_increasing(current: &YearlyStats, previous: &YearlyStats) -> bool {
    let counters = Counter::INCREASING
        .iter()
        .all(|c| current.counter(*c) >= previous.counter(*c));

    let weekdays = previous
        .prints_started_per_weekday
        .iter()
        .all(|(day, count)| current.weekday_count(*day) >= *count);

    counters && weekdays
}

/// Undo the duplicated totals in `current` given last year's record.
pub fn repair_duplicated_totals(
    current: &mut YearlyStats,
    previous: &YearlyStats,
) -> RepairOutcome {
    let outcome = if all_increasing(current, previous) {
        for counter in Counter::INCREASING {
            let slot = current.counter_mut(counter);
            *slot = slot.saturating_sub(previous.counter(counter));
        }
        for (day, count) in &previous.prints_started_per_weekday {
            if let Some(slot) = current.prints_started_per_weekday.get_mut(day) {
                *slot = slot.saturating_sub(*count);
            }
        }

        // a longest print dated in an earlier year was carried over too
        if current.longest_print_year() != Some(current.year) {
            current.clear_longest_print();
        }

        RepairOutcome::Subtracted
    } else {
        for counter in Counter::INCREASING {
            *current.counter_mut(counter) = 0;
        }
        for slot in current.prints_started_per_weekday.values_mut() {
            *slot = 0;
        }

        RepairOutcome::Reset
    };

    current.achievements = 0;
    current.most_plugins = 0;

    outcome
}

impl<C: Clock> YearlyStatsTracker<C> {
    pub fn sentinel_path(&self) -> PathBuf {
        self.data_dir().join(ISSUE_5223_SENTINEL)
    }

    /// Run the issue #5223 repair once. Safe to call on every startup.
    pub fn fix_current_year_data(&mut self) -> Result<RepairOutcome> {
        let sentinel = self.sentinel_path();
        if sentinel.exists() {
            tracing::trace!("Issue 5223 already handled");
            return Ok(RepairOutcome::AlreadyHandled);
        }

        let previous_year = self.clock().year() - 1;
        if !self.year_file_path(previous_year).exists() {
            tracing::debug!("No stats for {}, nothing to repair", previous_year);
            return Ok(RepairOutcome::NoPreviousYear);
        }
        let Some(previous) = self.read_year_file(previous_year) else {
            return Ok(RepairOutcome::NoPreviousYear);
        };

        let current = self.load_current_year()?;
        let outcome = repair_duplicated_totals(current, &previous);
        let snapshot = current.clone();

        self.write_year_file(&snapshot, snapshot.year)?;
        fs::write(&sentinel, b"")
            .with_context(|| format!("Failed to write {}", sentinel.display()))?;

        tracing::info!(
            "Repaired stats for {} against {} (issue 5223): {}",
            snapshot.year,
            previous_year,
            outcome.as_str()
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::clock::ManualClock;
    use chrono::{Local, TimeZone};
    use std::path::Path;

    fn ts(y: i32, m: u32, d: u32) -> i64 {
        Local.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap().timestamp()
    }

    /// A busy year, as the buggy release would have left it
    fn stats_2025() -> YearlyStats {
        let mut stats = YearlyStats::new(2025);
        stats.created = ts(2025, 1, 1);
        stats.created_version = "1.10.3".to_string();
        stats.last_version = "1.11.0".to_string();
        stats.seen_versions = 3;
        stats.server_starts = 1207;
        stats.prints_started = 410;
        stats.prints_cancelled = 31;
        stats.prints_errored = 12;
        stats.prints_finished = 367;
        stats.prints_started_per_weekday = [
            (0, 60),
            (1, 58),
            (2, 61),
            (3, 55),
            (4, 70),
            (5, 52),
            (6, 54),
        ]
        .into_iter()
        .collect();
        stats.print_duration_total = 3_000_000.0;
        stats.print_duration_cancelled = 90_000.0;
        stats.print_duration_errored = 30_000.0;
        stats.print_duration_finished = 2_880_000.0;
        stats.longest_print_duration = 171_000.0;
        stats.longest_print_date = ts(2025, 8, 17);
        stats.files_uploaded = 523;
        stats.files_deleted = 201;
        stats.plugins_installed = 14;
        stats.plugins_uninstalled = 6;
        stats.most_plugins = 38;
        stats.achievements = 27;
        stats
    }

    fn stats_2026() -> YearlyStats {
        YearlyStats {
            year: 2026,
            server_starts: 1208,
            ..stats_2025()
        }
    }

    fn setup(
        dir: &Path,
        previous: &YearlyStats,
        current: &YearlyStats,
    ) -> YearlyStatsTracker<ManualClock> {
        let clock = ManualClock::new(Local.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        let tracker = YearlyStatsTracker::with_clock(dir, clock).unwrap();
        tracker.write_year_file(previous, previous.year).unwrap();
        tracker.write_year_file(current, current.year).unwrap();
        tracker
    }

    fn assert_increasing_zero_except_server_starts(stats: &YearlyStats, server_starts: u64) {
        for counter in Counter::INCREASING {
            let expected = if counter == Counter::ServerStarts {
                server_starts
            } else {
                0
            };
            assert_eq!(stats.counter(counter), expected, "{}", counter);
        }
        for day in 0..=6 {
            assert_eq!(stats.weekday_count(day), 0, "weekday {}", day);
        }
    }

    #[test]
    fn test_fix_with_longest_print_from_previous_year() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = setup(dir.path(), &stats_2025(), &stats_2026());

        let outcome = tracker.fix_current_year_data().unwrap();

        assert_eq!(outcome, RepairOutcome::Subtracted);
        let current = tracker.current().unwrap().clone();
        assert_increasing_zero_except_server_starts(&current, 1);
        assert_eq!(current.achievements, 0);
        assert_eq!(current.most_plugins, 0);
        assert_eq!(current.longest_print_date, 0);
        assert_eq!(current.longest_print_duration, 0.0);

        // persisted too
        assert_eq!(tracker.read_year_file(2026).unwrap(), current);
        assert!(dir.path().join(ISSUE_5223_SENTINEL).exists());
    }

    #[test]
    fn test_fix_with_longest_print_in_current_year() {
        let dir = tempfile::tempdir().unwrap();
        let mut current = stats_2026();
        current.longest_print_date = ts(2026, 1, 10);
        current.longest_print_duration = 200_000.0;
        let mut tracker = setup(dir.path(), &stats_2025(), &current);

        tracker.fix_current_year_data().unwrap();

        let fixed = tracker.current().unwrap();
        assert_increasing_zero_except_server_starts(fixed, 1);
        assert_eq!(fixed.longest_print_date, ts(2026, 1, 10));
        assert_eq!(fixed.longest_print_duration, 200_000.0);
    }

    #[test]
    fn test_fix_with_decreasing_values_resets_everything() {
        let dir = tempfile::tempdir().unwrap();
        let current = YearlyStats {
            server_starts: 1206,
            ..stats_2026()
        };
        let mut tracker = setup(dir.path(), &stats_2025(), &current);

        let outcome = tracker.fix_current_year_data().unwrap();

        assert_eq!(outcome, RepairOutcome::Reset);
        let fixed = tracker.current().unwrap();
        assert_increasing_zero_except_server_starts(fixed, 0);
        // durations and longest print are left alone in this branch
        assert_eq!(fixed.print_duration_total, 3_000_000.0);
        assert_eq!(fixed.longest_print_date, ts(2025, 8, 17));
    }

    #[test]
    fn test_fix_with_decreasing_weekday_resets() {
        let dir = tempfile::tempdir().unwrap();
        let mut current = stats_2026();
        current.prints_started_per_weekday.insert(4, 1);
        current.prints_finished = 400;
        let mut tracker = setup(dir.path(), &stats_2025(), &current);

        assert_eq!(tracker.fix_current_year_data().unwrap(), RepairOutcome::Reset);
        assert_eq!(tracker.current().unwrap().prints_finished, 0);
    }

    #[test]
    fn test_fix_subtracts_genuine_growth() {
        let dir = tempfile::tempdir().unwrap();
        let mut current = stats_2026();
        current.prints_finished += 4;
        current.prints_started_per_weekday.insert(3, 55 + 2);
        let mut tracker = setup(dir.path(), &stats_2025(), &current);

        tracker.fix_current_year_data().unwrap();

        let fixed = tracker.current().unwrap();
        assert_eq!(fixed.prints_finished, 4);
        assert_eq!(fixed.weekday_count(3), 2);
        assert_eq!(fixed.weekday_count(0), 0);
    }

    #[test]
    fn test_fix_is_noop_when_sentinel_exists() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = setup(dir.path(), &stats_2025(), &stats_2026());
        fs::write(dir.path().join(ISSUE_5223_SENTINEL), b"").unwrap();

        let outcome = tracker.fix_current_year_data().unwrap();

        assert_eq!(outcome, RepairOutcome::AlreadyHandled);
        assert_eq!(tracker.current().unwrap(), &stats_2026());
    }

    #[test]
    fn test_fix_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = setup(dir.path(), &stats_2025(), &stats_2026());

        tracker.fix_current_year_data().unwrap();
        let once = tracker.current().unwrap().clone();
        assert!(dir.path().join(ISSUE_5223_SENTINEL).exists());

        let outcome = tracker.fix_current_year_data().unwrap();
        assert_eq!(outcome, RepairOutcome::AlreadyHandled);
        assert_eq!(tracker.current().unwrap(), &once);
    }

    #[test]
    fn test_fix_on_first_start_of_new_year() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Local.with_ymd_and_hms(2026, 1, 1, 0, 5, 0).unwrap());
        let mut tracker = YearlyStatsTracker::with_clock(dir.path(), clock).unwrap();
        tracker.write_year_file(&stats_2025(), 2025).unwrap();
        assert!(!dir.path().join("2026.json").exists());

        let outcome = tracker.fix_current_year_data().unwrap();

        assert_eq!(outcome, RepairOutcome::Reset);
        let fixed = tracker.read_year_file(2026).unwrap();
        assert_increasing_zero_except_server_starts(&fixed, 0);
        assert_eq!(fixed.longest_print_date, 0);
        assert!(dir.path().join(ISSUE_5223_SENTINEL).exists());
        // last year is left as it was
        assert_eq!(tracker.read_year_file(2025).unwrap(), stats_2025());
    }

    #[test]
    fn test_fix_without_previous_year_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Local.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        let mut tracker = YearlyStatsTracker::with_clock(dir.path(), clock).unwrap();
        tracker.write_year_file(&stats_2026(), 2026).unwrap();

        let outcome = tracker.fix_current_year_data().unwrap();

        assert_eq!(outcome, RepairOutcome::NoPreviousYear);
        assert_eq!(tracker.current().unwrap(), &stats_2026());
        assert!(!dir.path().join(ISSUE_5223_SENTINEL).exists());
    }
}
