//! Command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "kibitzer",
    about = "Asynchronous game-review pipeline: per-game analysis, profile synthesis, and baseline correlation",
    version
)]
pub struct Cli {
    /// Emit machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a review run for a player
    Review(commands::review::ReviewArgs),
    /// Show review progress for a player (pure store read)
    Status(commands::status::StatusArgs),
}

/// Print a top-level error and exit non-zero.
pub fn handle_error(err: &anyhow::Error, json: bool) -> ! {
    if json {
        let payload = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{payload}");
    } else {
        eprintln!("kibitzer: {err:#}");
    }
    std::process::exit(1);
}
