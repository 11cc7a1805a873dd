//! Repository ports for the progress store.
//!
//! Two logical collections back the pipeline: games keyed by
//! `(player_id, game_id)` and profiles keyed by `player_id`. All gate
//! arithmetic runs through `count_games` at decision time; nothing in the
//! pipeline keeps an in-process counter.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{CorrelationVerdict, GameRecord, GameState, PlayerProfile};

/// Filters for querying and counting games
#[derive(Default, Debug, Clone)]
pub struct GameFilter {
    pub player_id: Option<String>,
    /// Exact state match
    pub state: Option<GameState>,
    /// True: only games at `Analyzed` or later. False: only earlier states.
    pub analyzed: Option<bool>,
    pub is_baseline: Option<bool>,
    /// True: only games carrying a correlation verdict. False: only games
    /// without one.
    pub has_correlation: Option<bool>,
    pub limit: Option<i64>,
}

impl GameFilter {
    /// All games for one player.
    pub fn for_player(player_id: impl Into<String>) -> Self {
        Self {
            player_id: Some(player_id.into()),
            ..Self::default()
        }
    }

    /// Analyzed games for one player (the synthesis gate count).
    pub fn analyzed(player_id: impl Into<String>) -> Self {
        Self {
            player_id: Some(player_id.into()),
            analyzed: Some(true),
            ..Self::default()
        }
    }

    /// Analyzed baseline games for one player (the correlation gate count).
    pub fn baseline(player_id: impl Into<String>) -> Self {
        Self {
            player_id: Some(player_id.into()),
            analyzed: Some(true),
            is_baseline: Some(true),
            ..Self::default()
        }
    }

    /// Analyzed non-baseline games with no verdict yet: the correlation
    /// stage's candidate set.
    pub fn correlation_candidates(player_id: impl Into<String>) -> Self {
        Self {
            player_id: Some(player_id.into()),
            analyzed: Some(true),
            is_baseline: Some(false),
            has_correlation: Some(false),
            ..Self::default()
        }
    }
}

/// Repository port for game persistence operations
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Insert a freshly selected game, leaving any existing row untouched.
    ///
    /// Re-running selection for a player must never clobber records that
    /// have already advanced past `Selected`. Returns true if a row was
    /// inserted.
    async fn insert_if_absent(&self, game: &GameRecord) -> DomainResult<bool>;

    /// Full-replace upsert keyed by `(player_id, game_id)`. Idempotent:
    /// repeating the same write yields the same stored state.
    async fn upsert_game(&self, game: &GameRecord) -> DomainResult<()>;

    /// Get a game by its composite key
    async fn get_game(&self, player_id: &str, game_id: &str) -> DomainResult<Option<GameRecord>>;

    /// List games matching the filter, oldest analysis first
    async fn list_games(&self, filter: GameFilter) -> DomainResult<Vec<GameRecord>>;

    /// Count games matching the filter
    async fn count_games(&self, filter: GameFilter) -> DomainResult<i64>;

    /// Record the baseline decision and advance the game to `Classified`
    async fn set_baseline(
        &self,
        player_id: &str,
        game_id: &str,
        is_baseline: bool,
    ) -> DomainResult<()>;

    /// Attach a correlation verdict; optionally overwrite the stored short
    /// summary with the oracle's contextualized rewrite
    async fn set_correlation(
        &self,
        player_id: &str,
        game_id: &str,
        verdict: &CorrelationVerdict,
        revised_summary: Option<&str>,
    ) -> DomainResult<()>;
}

/// Repository port for profile persistence operations
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Full-replace upsert keyed by `player_id`
    async fn upsert_profile(&self, profile: &PlayerProfile) -> DomainResult<()>;

    /// Get the profile for a player, if synthesis has run
    async fn get_profile(&self, player_id: &str) -> DomainResult<Option<PlayerProfile>>;
}
