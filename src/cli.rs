// CLI module - command-line argument parsing and handlers
//
// Subcommands:
// - config --show | --reset | --path: configuration management
// - stats show | years | lifetime | fix: inspect the yearly statistics
// - record <event>: feed a host event into the current year
// - health: run the health checks

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use printhost_stats::access::JsonUserDirectory;
use printhost_stats::achievements::{
    Counter, PrintOutcome, StatsEvent, YearlyStats, YearlyStatsTracker,
};
use printhost_stats::config::{Config, VERSION};
use printhost_stats::health::{CheckStatus, HealthCheckRunner, OnlyAdminsCheck, PLUGIN_KEY};
use printhost_stats::settings::MemorySettings;
use std::io::Write;

/// printhost-stats - usage statistics and health checks for a printer host
#[derive(Parser)]
#[command(name = "printhost-stats")]
#[command(version = VERSION)]
#[command(about = "Yearly usage statistics and health checks for a 3D-printer host", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Inspect yearly statistics
    Stats {
        #[command(subcommand)]
        action: StatsAction,
    },

    /// Record a host event in the current year's statistics
    Record {
        #[command(subcommand)]
        event: RecordEvent,
    },

    /// Run health checks
    Health {
        /// Bypass cached results
        #[arg(long)]
        force: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum StatsAction {
    /// Show one year's statistics (default: current year)
    Show {
        #[arg(long)]
        year: Option<i32>,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// List years with stored statistics
    Years,
    /// Show totals across all stored years
    Lifetime {
        #[arg(long)]
        json: bool,
    },
    /// Run the one-time issue 5223 repair now
    Fix,
}

#[derive(Subcommand)]
pub enum RecordEvent {
    /// The server started
    ServerStart {
        #[arg(long, default_value = VERSION)]
        version: String,
    },
    /// A print job started now
    PrintStarted,
    /// A print job ended now
    PrintDone {
        /// finished, cancelled or errored
        #[arg(long, default_value = "finished")]
        outcome: PrintOutcome,

        /// Print duration in seconds
        #[arg(long, value_parser = parse_duration)]
        duration: f64,
    },
    FileUploaded,
    FileDeleted,
    PluginInstalled,
    PluginUninstalled,
    /// Current number of installed plugins
    PluginCount { count: u64 },
    /// An achievement was unlocked
    Achievement,
    /// Bump a raw counter, e.g. `files_uploaded`
    Increment {
        counter: Counter,

        #[arg(long, default_value_t = 1)]
        amount: u64,
    },
}

/// Dispatch a parsed command
pub fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Config { show, reset, path } => {
            if show {
                handle_config_show(config);
                Ok(())
            } else {
                handle_config(show, reset, path)
            }
        }
        Commands::Stats { action } => handle_stats(action, config),
        Commands::Record { event } => handle_record(event, config),
        Commands::Health { force, json } => handle_health(config, force, json),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// config
// ─────────────────────────────────────────────────────────────────────────────

/// Config subcommands that don't need a loaded config
pub fn handle_config(show: bool, reset: bool, path: bool) -> Result<()> {
    if path {
        let path = Config::config_path().context("Could not determine config path")?;
        println!("{}", path.display());
    } else if reset {
        handle_config_reset()?;
    } else if !show {
        // No flag provided, show help
        println!("Usage: printhost-stats config [--show|--reset|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --path    Show config file path");
    }
    Ok(())
}

fn handle_config_show(config: &Config) {
    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    // Show source info
    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
}

fn handle_config_reset() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    // Confirm if file exists
    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    // Write the default config (using Config's single source of truth)
    std::fs::write(&path, Config::default().to_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Config reset to defaults: {}", path.display());
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// stats / record
// ─────────────────────────────────────────────────────────────────────────────

fn open_tracker(config: &Config) -> Result<YearlyStatsTracker> {
    if !config.features.achievements {
        bail!("The achievements feature is disabled ([features] achievements = false)");
    }
    Ok(YearlyStatsTracker::new(&config.data_dir)?.with_version(VERSION))
}

/// Tracker with the startup repair already applied, as the host does on boot
fn open_repaired_tracker(config: &Config) -> Result<YearlyStatsTracker> {
    let mut tracker = open_tracker(config)?;
    tracker.fix_current_year_data()?;
    Ok(tracker)
}

fn handle_stats(action: StatsAction, config: &Config) -> Result<()> {
    match action {
        StatsAction::Show { year, json } => {
            let mut tracker = open_repaired_tracker(config)?;
            let year = match year {
                Some(year) => year,
                None => tracker.current()?.year,
            };
            let stats = tracker
                .load_year(year)?
                .with_context(|| format!("No statistics stored for {}", year))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&format!("Statistics for {}", year), &stats);
            }
        }
        StatsAction::Years => {
            let tracker = open_tracker(config)?;
            for year in tracker.available_years()? {
                println!("{}", year);
            }
        }
        StatsAction::Lifetime { json } => {
            let mut tracker = open_repaired_tracker(config)?;
            let totals = tracker.lifetime_totals()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&totals)?);
            } else {
                let title = match (totals.years.first(), totals.years.last()) {
                    (Some(first), Some(last)) => format!("Lifetime statistics ({}-{})", first, last),
                    _ => "Lifetime statistics".to_string(),
                };
                print_stats(&title, &totals.stats);
            }
        }
        StatsAction::Fix => {
            let mut tracker = open_tracker(config)?;
            let outcome = tracker.fix_current_year_data()?;
            println!("Issue 5223 repair: {}", outcome.as_str());
        }
    }

    Ok(())
}

fn handle_record(event: RecordEvent, config: &Config) -> Result<()> {
    let mut tracker = open_repaired_tracker(config)?;
    let now = Local::now();

    let event = match event {
        RecordEvent::Increment { counter, amount } => {
            let value = tracker.increment(counter, amount)?;
            println!("{} = {}", counter, value);
            return Ok(());
        }
        RecordEvent::ServerStart { version } => StatsEvent::ServerStarted { version },
        RecordEvent::PrintStarted => StatsEvent::PrintStarted { at: now },
        RecordEvent::PrintDone { outcome, duration } => StatsEvent::PrintDone {
            outcome,
            duration,
            at: now,
        },
        RecordEvent::FileUploaded => StatsEvent::FileUploaded,
        RecordEvent::FileDeleted => StatsEvent::FileDeleted,
        RecordEvent::PluginInstalled => StatsEvent::PluginInstalled,
        RecordEvent::PluginUninstalled => StatsEvent::PluginUninstalled,
        RecordEvent::PluginCount { count } => StatsEvent::PluginCount { count },
        RecordEvent::Achievement => StatsEvent::AchievementUnlocked,
    };

    tracker.record(&event)?;
    println!("Recorded {}", event.name());
    Ok(())
}

/// Seconds, finite and not negative
fn parse_duration(s: &str) -> Result<f64, String> {
    let seconds: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("'{}' is not a valid duration in seconds", s));
    }
    Ok(seconds)
}

fn print_stats(title: &str, stats: &YearlyStats) {
    println!("{}", title);
    println!();
    for counter in Counter::INCREASING {
        println!("  {:<22} {}", counter.as_str(), stats.counter(counter));
    }

    println!();
    println!("  prints_started_per_weekday");
    for (day, name) in ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
        .iter()
        .enumerate()
    {
        println!("    {:<20} {}", name, stats.weekday_count(day as u8));
    }

    println!();
    println!("  {:<22} {}", "print_time_total", format_hours(stats.print_duration_total));
    println!("  {:<22} {}", "print_time_finished", format_hours(stats.print_duration_finished));
    println!("  {:<22} {}", "print_time_cancelled", format_hours(stats.print_duration_cancelled));
    println!("  {:<22} {}", "print_time_errored", format_hours(stats.print_duration_errored));

    match chrono::DateTime::from_timestamp(stats.longest_print_date, 0) {
        Some(date) if stats.longest_print_date != 0 => println!(
            "  {:<22} {} on {}",
            "longest_print",
            format_hours(stats.longest_print_duration),
            date.with_timezone(&Local).format("%Y-%m-%d")
        ),
        _ => println!("  {:<22} -", "longest_print"),
    }

    if !stats.last_version.is_empty() {
        println!("  {:<22} {}", "last_version", stats.last_version);
    }
}

fn format_hours(seconds: f64) -> String {
    format!("{:.1}h", seconds / 3600.0)
}

// ─────────────────────────────────────────────────────────────────────────────
// health
// ─────────────────────────────────────────────────────────────────────────────

fn handle_health(config: &Config, force: bool, json: bool) -> Result<()> {
    if !config.features.health_check {
        bail!("The health_check feature is disabled ([features] health_check = false)");
    }

    let mut settings = MemorySettings::new();
    settings.set(
        format!("plugins.{}.disabled_checks", PLUGIN_KEY),
        config.health_check.disabled_checks.clone(),
    );

    let runner = HealthCheckRunner::new(settings)
        .with_check(OnlyAdminsCheck::new(JsonUserDirectory::new(&config.users_file)));

    let outcomes = runner.run_all(force);

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(());
    }

    for outcome in &outcomes {
        match &outcome.status {
            CheckStatus::Completed(result) => println!("  {:<16} {}", outcome.key, result.result),
            CheckStatus::Errored { error } => {
                println!("  {:<16} error: {}", outcome.key, error)
            }
        }
    }
    Ok(())
}
