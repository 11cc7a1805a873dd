//! `kibitzer review` - start a review run for a player.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;

use crate::adapters::oracle::OracleClient;
use crate::adapters::provider::HttpGameProvider;
use crate::application::{ReviewPipeline, StatusReader};
use crate::domain::models::Config;
use crate::domain::ports::{GameProvider, Oracle};
use crate::services::{CorrelationStage, GameAnalyzer, ProfileSynthesizer, TriggerCoordinator};

#[derive(Args)]
pub struct ReviewArgs {
    /// Player to review
    pub player_id: String,

    /// Only consider games played after this RFC3339 timestamp
    #[arg(long)]
    pub since: Option<DateTime<Utc>>,

    /// Seconds to wait for the pipeline to drain before exiting
    #[arg(long, default_value_t = 600)]
    pub wait_secs: u64,

    /// Dispatch the run and exit without waiting
    #[arg(long)]
    pub no_wait: bool,
}

pub async fn execute(args: ReviewArgs, config: &Config, json: bool) -> Result<()> {
    let pool = super::open_database(config).await?;
    let (games, profiles) = super::repositories(&pool);

    let oracle: Arc<dyn Oracle> =
        Arc::new(OracleClient::from_config(&config.oracle).context("Failed to build oracle client")?);
    let provider: Arc<dyn GameProvider> = Arc::new(
        HttpGameProvider::new(&config.provider).context("Failed to build provider client")?,
    );

    let synthesizer = Arc::new(ProfileSynthesizer::new(
        Arc::clone(&games),
        Arc::clone(&profiles),
        Arc::clone(&oracle),
        config.pipeline.clone(),
    ));
    let correlator = Arc::new(CorrelationStage::new(
        Arc::clone(&games),
        Arc::clone(&profiles),
        Arc::clone(&oracle),
        config.pipeline.clone(),
    ));
    let trigger = Arc::new(TriggerCoordinator::new(
        Arc::clone(&games),
        synthesizer,
        correlator,
        config.pipeline.clone(),
    ));
    let analyzer = Arc::new(GameAnalyzer::new(
        Arc::clone(&games),
        Arc::clone(&provider),
        oracle,
        trigger,
        config.pipeline.clone(),
    ));
    let pipeline = ReviewPipeline::new(
        Arc::clone(&games),
        provider,
        analyzer,
        config.pipeline.clone(),
    );

    let summary = pipeline.run(&args.player_id, args.since).await?;
    if !json {
        println!(
            "Dispatched {} of {} selected games ({} candidates fetched)",
            summary.dispatched, summary.selected, summary.fetched
        );
    }

    let reader = StatusReader::new(games, profiles);
    if !args.no_wait {
        wait_for_drain(&reader, &args.player_id, args.wait_secs, json).await?;
    }

    let status = reader.snapshot(&args.player_id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        super::status::print_status(&status);
    }

    Ok(())
}

/// Poll the store until every known game is analyzed or the deadline
/// passes. Games stuck on fatal fetch errors never reach analyzed, so
/// the deadline is the only way out for a degraded run.
async fn wait_for_drain(
    reader: &StatusReader,
    player_id: &str,
    wait_secs: u64,
    json: bool,
) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(wait_secs);

    loop {
        let status = reader.snapshot(player_id).await?;
        if status.total > 0 && status.analyzed >= status.total {
            break;
        }
        if Instant::now() >= deadline {
            if !json {
                println!(
                    "Timed out waiting: {} of {} games analyzed",
                    status.analyzed, status.total
                );
            }
            break;
        }
        if !json {
            println!("{} of {} games analyzed...", status.analyzed, status.total);
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    Ok(())
}
