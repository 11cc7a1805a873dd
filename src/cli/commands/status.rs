//! `kibitzer status` - the poller read model over the progress store.

use anyhow::Result;
use clap::Args;

use crate::application::{PlayerStatus, StatusReader};
use crate::domain::models::Config;

#[derive(Args)]
pub struct StatusArgs {
    /// Player to inspect
    pub player_id: String,
}

pub async fn execute(args: StatusArgs, config: &Config, json: bool) -> Result<()> {
    let pool = super::open_database(config).await?;
    let (games, profiles) = super::repositories(&pool);
    let reader = StatusReader::new(games, profiles);

    let status = reader.snapshot(&args.player_id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status);
    }

    Ok(())
}

pub(crate) fn print_status(status: &PlayerStatus) {
    println!("Player: {}", status.player_id);
    println!(
        "Games: {} total, {} analyzed, {} baseline, {} correlated, {} awaiting correlation",
        status.total, status.analyzed, status.baseline, status.correlated, status.pending_correlation
    );

    for game in &status.games {
        let baseline = if game.is_baseline { " [baseline]" } else { "" };
        let correlation = match game.correlation_match {
            Some(true) => " [match]",
            Some(false) => " [no match]",
            None => "",
        };
        let summary = game.short_summary.as_deref().unwrap_or("no analysis yet");
        println!(
            "  {} ({}, {}){}{}: {}",
            game.game_id, game.outcome, game.state, baseline, correlation, summary
        );
    }

    match &status.profile {
        Some(profile) => {
            println!("Profile (after {} games):", profile.games_analyzed);
            println!("  style: {}", profile.style_summary);
            println!("  strengths: {}", profile.strengths);
            println!("  weaknesses: {}", profile.weaknesses);
        }
        None => println!("Profile: not synthesized yet"),
    }
}
