//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sleep tracker and alarm planner.
///
/// Records when you fall asleep and works out when your alarm should ring.
#[derive(Debug, Parser)]
#[command(name = "snooze", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP service (the default).
    Serve {
        /// Address to bind, overriding the config file.
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, overriding the config file.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show the latest sleep and today's alarms.
    Status,
}
