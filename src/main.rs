//! livepatch - live reload for hashed build output.

#![allow(dead_code)]

mod actor;
mod cli;
mod client;
mod config;
mod core;
mod embed;
mod logger;
mod reload;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{LivepatchConfig, init_config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // tail polls the shutdown flag itself; everything else may exit at once
    core::setup_shutdown_handler(!matches!(cli.command, Commands::Tail { .. }))?;

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(LivepatchConfig::load(&cli)?);

    match &cli.command {
        Commands::Serve { .. } => cli::serve::serve(config),
        Commands::Notify { host, .. } => cli::notify::send_server_reloaded(&config, host.as_deref()),
        Commands::Tail { host, .. } => cli::tail::tail(&config, host.as_deref()),
        Commands::Snapshot { .. } => cli::snapshot::print_snapshot(&config),
    }
}
