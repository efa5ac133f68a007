use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// `nextup` - picks the next task to work on and coaches you through it.
#[derive(Parser, Debug)]
#[command(name = "nextup")]
#[command(version)]
#[command(about = "Decide what to do next.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.nextup/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one event (JSON) and print the response
    Process {
        /// Event file; reads stdin when omitted
        #[arg(short, long)]
        event: Option<PathBuf>,

        /// Seed an in-memory store from this fixtures file instead of using
        /// the configured storage
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },

    /// Load tasks, profiles and gamification state from a fixtures file into
    /// SQLite storage
    Import {
        /// Fixtures file (JSON)
        file: PathBuf,
    },

    /// Show a user's XP, level and streak
    Status {
        /// User id
        #[arg(short, long)]
        user: String,
    },

    /// Print the effective configuration
    Config,
}
