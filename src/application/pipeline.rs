//! Review pipeline orchestration.
//!
//! One run fetches candidates, selects a balanced work set, persists the
//! selected records, and spawns one analysis task per game. Tasks are
//! fire-and-forget: the run returns a dispatch summary immediately and
//! all further progress flows through the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{GameRecord, PipelineConfig};
use crate::domain::ports::{GameProvider, GameRepository};
use crate::services::analysis::GameAnalyzer;
use crate::services::selector::select_games;

/// Oversampling factor: fetch more candidates than the target so the
/// balanced selector has a pool to draw quotas from.
const FETCH_MULTIPLIER: usize = 4;

/// What one pipeline run dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Candidates returned by the provider
    pub fetched: usize,
    /// Games picked by the balanced selector
    pub selected: usize,
    /// Analysis tasks spawned (selected games not already analyzed)
    pub dispatched: usize,
}

pub struct ReviewPipeline {
    games: Arc<dyn GameRepository>,
    provider: Arc<dyn GameProvider>,
    analyzer: Arc<GameAnalyzer>,
    config: PipelineConfig,
}

impl ReviewPipeline {
    pub fn new(
        games: Arc<dyn GameRepository>,
        provider: Arc<dyn GameProvider>,
        analyzer: Arc<GameAnalyzer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            games,
            provider,
            analyzer,
            config,
        }
    }

    /// Fetch, select, and dispatch one analysis task per selected game.
    ///
    /// Re-running for the same player is safe: records that already
    /// advanced past selection are left untouched and not re-dispatched;
    /// games still awaiting analysis are picked up again.
    #[instrument(skip(self))]
    pub async fn run(
        &self,
        player_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> DomainResult<DispatchSummary> {
        let run_id = Uuid::new_v4();
        let raw = self
            .provider
            .list_games(player_id, since, self.config.target * FETCH_MULTIPLIER)
            .await?;
        let fetched = raw.len();

        let selected = select_games(raw, self.config.target, &self.config.quotas);
        let selected_count = selected.len();

        let mut dispatched = 0;
        for candidate in selected {
            let record = GameRecord::from_candidate(candidate);
            let inserted = self.games.insert_if_absent(&record).await?;

            let game = if inserted {
                record
            } else {
                match self.games.get_game(&record.player_id, &record.game_id).await? {
                    Some(existing) if !existing.is_analyzed() => existing,
                    _ => continue,
                }
            };

            let analyzer = Arc::clone(&self.analyzer);
            tokio::spawn(async move {
                let game_id = game.game_id.clone();
                if let Err(err) = analyzer.analyze(game).await {
                    warn!("Analysis of game {} failed: {}", game_id, err);
                }
            });
            dispatched += 1;
        }

        info!(
            %run_id,
            fetched,
            selected = selected_count,
            dispatched,
            "Review run dispatched"
        );
        Ok(DispatchSummary {
            fetched,
            selected: selected_count,
            dispatched,
        })
    }
}
