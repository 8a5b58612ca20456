use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `likebot` - scheduled profile likes for OneBot sessions.
#[derive(Parser, Debug)]
#[command(name = "likebot")]
#[command(version = "0.1.0")]
#[command(
    about = "Daily profile-like automation with a liveness watchdog and fleet manager.",
    long_about = None
)]
pub struct Cli {
    /// Config file (default: ~/.likebot/config.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one automation instance (scheduler, plus the admin API when enabled)
    Bot {
        /// Admin API host (overrides admin.host)
        #[arg(long)]
        host: Option<String>,

        /// Admin API port (overrides admin.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Serve the admin API even if admin.enabled is false
        #[arg(long)]
        admin: bool,
    },

    /// Serve the fleet manager API over every configured instance
    Manager {
        /// Host to bind to (overrides manager.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides manager.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Watch session health and restart containers whose login is lost
    Watchdog,

    /// Run one like batch now and print the summary
    Like {
        /// Only this identity (default: every configured target)
        #[arg(short, long)]
        user: Option<String>,

        /// Likes per target (clamped to 1..=10; default: bot.like_times)
        #[arg(short, long)]
        times: Option<u32>,
    },
}
