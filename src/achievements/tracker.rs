//! Yearly statistics tracker
//!
//! Owns the in-memory record for the current calendar year and keeps it in
//! sync with `<data_dir>/<year>.json`.
//!
//! # Rollover
//!
//! Every access goes through `load_current_year()`, which compares the clock's
//! year with the record's year. When they differ the outgoing record is
//! written one last time, the new year's file is loaded (or a fresh record is
//! created) and immediately persisted, so `<year>.json` exists as soon as a
//! year becomes current.
//!
//! ```text
//! ABSENT ──load──→ LOADED ──increment/record──→ MUTATED ─┐
//!                    ▲                                    │ year changes
//!                    └──────── next year ◄── FINALIZED ◄──┘
//! ```
//!
//! Methods take `&mut self`; a host sharing the tracker between threads
//! wraps it in a `Mutex` since read-modify-persist is not atomic.

use super::clock::{Clock, SystemClock};
use super::events::{StatField, StatsEvent};
use super::stats::YearlyStats;
use crate::util::write_atomically;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Aggregate over every persisted year
#[derive(Debug, Clone, Default, Serialize)]
pub struct LifetimeTotals {
    /// Years that contributed, ascending
    pub years: Vec<i32>,
    /// Summed record; its `year` field is the first contributing year
    pub stats: YearlyStats,
}

pub struct YearlyStatsTracker<C: Clock = SystemClock> {
    data_dir: PathBuf,
    clock: C,
    /// Version stamped into freshly created records
    version: String,
    pub(super) current_year_stats: Option<YearlyStats>,
}

impl YearlyStatsTracker<SystemClock> {
    /// Tracker on the local system clock
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_clock(data_dir, SystemClock)
    }
}

impl<C: Clock> YearlyStatsTracker<C> {
    pub fn with_clock(data_dir: impl Into<PathBuf>, clock: C) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).with_context(|| {
            format!("Failed to create stats directory {}", data_dir.display())
        })?;

        Ok(Self {
            data_dir,
            clock,
            version: String::new(),
            current_year_stats: None,
        })
    }

    /// Version recorded as `created_version` on new year records
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub(super) fn clock(&self) -> &C {
        &self.clock
    }

    /// Path of the file holding `year`
    pub fn year_file_path(&self, year: i32) -> PathBuf {
        self.data_dir.join(format!("{}.json", year))
    }

    /// Make sure the in-memory record belongs to the clock's current year.
    pub fn load_current_year(&mut self) -> Result<&mut YearlyStats> {
        let year = self.clock.year();

        let stale = match &self.current_year_stats {
            Some(stats) => stats.year != year,
            None => true,
        };

        if stale {
            // The outgoing record stays in memory until it is on disk, so a
            // failed write can be retried on the next access.
            if let Some(outgoing) = &self.current_year_stats {
                tracing::info!(
                    "Year changed from {} to {}, finalizing {}.json",
                    outgoing.year,
                    year,
                    outgoing.year
                );
                self.write_year_file(outgoing, outgoing.year)?;
            }

            // Longest print is per year and is not carried over; the lifetime
            // record comes from `lifetime_totals`.
            let stats = match self.read_year_file(year) {
                Some(stats) => {
                    tracing::debug!("Loaded stats for {}", year);
                    stats
                }
                None => {
                    tracing::info!("Starting fresh stats for {}", year);
                    YearlyStats {
                        created: self.clock.now().timestamp(),
                        created_version: self.version.clone(),
                        ..YearlyStats::new(year)
                    }
                }
            };

            self.write_year_file(&stats, year)?;
            self.current_year_stats = Some(stats);
        }

        self.current_year_stats
            .as_mut()
            .context("current year stats missing after load")
    }

    /// Current year's record, rolled over first if the year changed
    pub fn current(&mut self) -> Result<&YearlyStats> {
        self.load_current_year().map(|stats| &*stats)
    }

    /// Mutable access to the current year's record. Changes are persisted on
    /// the next `save_current()`, mutation call, rollover or `shutdown()`.
    pub fn current_mut(&mut self) -> Result<&mut YearlyStats> {
        self.load_current_year()
    }

    /// Persist the current record (loading it first if needed)
    pub fn save_current(&mut self) -> Result<()> {
        let stats = self.load_current_year()?.clone();
        self.write_year_file(&stats, stats.year)
    }

    /// Serialize `record` to `<year>.json`, replacing any existing file
    pub fn write_year_file(&self, record: &YearlyStats, year: i32) -> Result<()> {
        let path = self.year_file_path(year);
        let mut json =
            serde_json::to_vec_pretty(record).context("Failed to serialize year stats")?;
        json.push(b'\n');

        write_atomically(&path, &json)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::trace!("Wrote {}", path.display());
        Ok(())
    }

    /// Read a persisted year. Missing, unreadable or malformed files, and
    /// files whose record names another year, all count as absent.
    pub fn read_year_file(&self, year: i32) -> Option<YearlyStats> {
        let path = self.year_file_path(year);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Could not read {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_slice::<YearlyStats>(&bytes) {
            Ok(stats) if stats.year == year => Some(stats),
            Ok(stats) => {
                tracing::warn!(
                    "{} holds stats for {}, ignoring it",
                    path.display(),
                    stats.year
                );
                None
            }
            Err(e) => {
                tracing::warn!("Malformed stats file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Stats for any year. The current year comes from memory.
    pub fn load_year(&mut self, year: i32) -> Result<Option<YearlyStats>> {
        let current = self.current()?;
        if current.year == year {
            return Ok(Some(current.clone()));
        }
        Ok(self.read_year_file(year))
    }

    /// Years that have a file in the data directory, ascending
    pub fn available_years(&self) -> Result<Vec<i32>> {
        let entries = fs::read_dir(&self.data_dir).with_context(|| {
            format!("Failed to list stats directory {}", self.data_dir.display())
        })?;

        let mut years: Vec<i32> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                name.strip_suffix(".json")?.parse().ok()
            })
            .collect();

        years.sort_unstable();
        Ok(years)
    }

    /// Bump one counter slot of the current year and persist.
    /// Returns the slot's new value.
    pub fn increment(&mut self, field: impl Into<StatField>, amount: u64) -> Result<u64> {
        let field = field.into();
        let stats = self.load_current_year()?;
        let value = stats.increment(field, amount);
        let snapshot = stats.clone();

        tracing::debug!("{:?} += {} -> {}", field, amount, value);
        self.write_year_file(&snapshot, snapshot.year)?;
        Ok(value)
    }

    /// Apply a host event to the current year and persist
    pub fn record(&mut self, event: &StatsEvent) -> Result<()> {
        let stats = self.load_current_year()?;
        stats.apply(event);
        let snapshot = stats.clone();

        tracing::debug!("Recorded {} for {}", event.name(), snapshot.year);
        self.write_year_file(&snapshot, snapshot.year)
    }

    /// Sum of every persisted year plus the in-memory current year
    pub fn lifetime_totals(&mut self) -> Result<LifetimeTotals> {
        let current = self.current()?.clone();
        let mut totals = LifetimeTotals::default();

        for year in self.available_years()? {
            let stats = if year == current.year {
                Some(current.clone())
            } else {
                self.read_year_file(year)
            };

            if let Some(stats) = stats {
                if totals.years.is_empty() {
                    totals.stats.year = year;
                }
                totals.stats.accumulate(&stats);
                totals.years.push(year);
            }
        }

        Ok(totals)
    }

    /// Persist the current record, if one is loaded. Does not roll over.
    pub fn shutdown(&mut self) -> Result<()> {
        if let Some(stats) = &self.current_year_stats {
            self.write_year_file(stats, stats.year)?;
            tracing::debug!("Stats for {} saved on shutdown", stats.year);
        }
        Ok(())
    }
}
