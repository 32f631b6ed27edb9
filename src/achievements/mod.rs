//! Yearly usage statistics ("achievements" stats)
//!
//! Counters for server starts, prints, files and plugins, kept per calendar
//! year in `<data_dir>/<year>.json`. See `tracker` for the rollover rules and
//! `repair` for the one-time issue #5223 migration.

pub mod clock;
pub mod events;
pub mod repair;
pub mod stats;
pub mod tracker;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
pub use events::{weekday_index, PrintOutcome, StatField, StatsEvent};
pub use repair::{repair_duplicated_totals, RepairOutcome, ISSUE_5223_SENTINEL};
pub use stats::{Counter, WeekdayCounts, YearlyStats};
pub use tracker::{LifetimeTotals, YearlyStatsTracker};
