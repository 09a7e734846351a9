//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Live reload for hashed build output
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: livepatch.toml)
    #[arg(short = 'C', long, global = true, default_value = "livepatch.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Watch the output root and notify connected pages
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        watch_args: WatchArgs,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<IpAddr>,

        /// WebSocket port number
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Tell a running server the app server restarted (reloads every page)
    #[command(visible_alias = "n")]
    Notify {
        /// Server host (default: [serve] interface)
        #[arg(long)]
        host: Option<String>,

        /// WebSocket port number
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Connect as a headless client and print every message
    #[command(visible_alias = "t")]
    Tail {
        /// Server host (default: [serve] interface)
        #[arg(long)]
        host: Option<String>,

        /// WebSocket port number
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the comparable snapshot of the output root
    #[command(visible_alias = "ls")]
    Snapshot {
        #[command(flatten)]
        watch_args: WatchArgs,
    },
}

/// Shared arguments for commands that look at the output root
#[derive(clap::Args, Debug, Clone, Default)]
pub struct WatchArgs {
    /// Output root to watch (relative to the config file)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Public URL prefix mapped onto the root (e.g. /public/)
    #[arg(short = 'u', long = "url-prefix")]
    pub url_prefix: Option<String>,
}

impl Cli {
    /// Root/prefix overrides, if the command takes them.
    pub fn watch_args(&self) -> Option<&WatchArgs> {
        match &self.command {
            Commands::Serve { watch_args, .. } | Commands::Snapshot { watch_args } => {
                Some(watch_args)
            }
            Commands::Notify { .. } | Commands::Tail { .. } => None,
        }
    }
}
