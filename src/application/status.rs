//! Poller-facing read model.
//!
//! Pure reads against the progress store: per-player counts, per-game
//! states, and the profile if synthesis has run. Imposes nothing on the
//! pipeline beyond the store staying eventually consistent.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::errors::DomainResult;
use crate::domain::models::{GameRecord, PlayerProfile};
use crate::domain::ports::{GameFilter, GameRepository, ProfileRepository};

/// One game's externally visible progress.
#[derive(Debug, Clone, Serialize)]
pub struct GameStatus {
    pub game_id: String,
    pub outcome: String,
    pub state: String,
    pub is_baseline: bool,
    /// Absent until analysis lands; a game with no analysis is simply
    /// "not analyzed yet", never an error state
    pub short_summary: Option<String>,
    pub correlation_match: Option<bool>,
}

impl From<&GameRecord> for GameStatus {
    fn from(game: &GameRecord) -> Self {
        Self {
            game_id: game.game_id.clone(),
            outcome: game.outcome.as_str().to_string(),
            state: game.state.as_str().to_string(),
            is_baseline: game.is_baseline,
            short_summary: game.analysis.as_ref().map(|a| a.short_summary.clone()),
            correlation_match: game.correlation.as_ref().map(|c| c.is_match),
        }
    }
}

/// Snapshot of one player's review progress.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStatus {
    pub player_id: String,
    pub total: i64,
    pub analyzed: i64,
    pub baseline: i64,
    pub correlated: i64,
    pub pending_correlation: i64,
    pub profile: Option<PlayerProfile>,
    pub games: Vec<GameStatus>,
}

pub struct StatusReader {
    games: Arc<dyn GameRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl StatusReader {
    pub fn new(games: Arc<dyn GameRepository>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { games, profiles }
    }

    pub async fn snapshot(&self, player_id: &str) -> DomainResult<PlayerStatus> {
        let total = self.games.count_games(GameFilter::for_player(player_id)).await?;
        let analyzed = self.games.count_games(GameFilter::analyzed(player_id)).await?;
        let baseline = self.games.count_games(GameFilter::baseline(player_id)).await?;
        let pending_correlation = self
            .games
            .count_games(GameFilter::correlation_candidates(player_id))
            .await?;

        let correlated_filter = GameFilter {
            player_id: Some(player_id.to_string()),
            analyzed: Some(true),
            is_baseline: Some(false),
            has_correlation: Some(true),
            ..GameFilter::default()
        };
        let correlated = self.games.count_games(correlated_filter).await?;

        let records = self.games.list_games(GameFilter::for_player(player_id)).await?;
        let games = records.iter().map(GameStatus::from).collect();
        let profile = self.profiles.get_profile(player_id).await?;

        Ok(PlayerStatus {
            player_id: player_id.to_string(),
            total,
            analyzed,
            baseline,
            correlated,
            pending_correlation,
            profile,
            games,
        })
    }
}
