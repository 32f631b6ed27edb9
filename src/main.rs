// printhost-stats - command-line front end
//
// Architecture:
// - Config: env > ~/.config/printhost-stats/config.toml > defaults
// - Logging: tracing to stderr, optional rolling JSON file
// - Commands: inspect and feed the yearly stats, run health checks
//
// The library does the work; this binary only wires config, logging and CLI.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use printhost_stats::{config::Config, logging};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config management works even when the config file is broken
    if let Commands::Config { show, reset, path } = &cli.command {
        if !*show {
            return cli::handle_config(false, *reset, *path);
        }
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let config = Config::from_env()?;

    // The guard must be kept alive for the duration of the program to ensure logs flush
    let _file_guard = logging::init(&config.logging);

    tracing::debug!("Data directory: {}", config.data_dir.display());

    cli::run(cli.command, &config)
}
