//! CLI argument definitions.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Command;

/// Manage users and token sessions.
#[derive(Parser, Debug)]
#[command(name = "tollgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "TOLLGATE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}
