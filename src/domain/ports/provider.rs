//! Game provider port: the external source of candidate games and
//! transcripts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::models::CandidateGame;

/// Errors returned by the game provider.
///
/// The transient/fatal split drives the analysis task's retry behavior:
/// transient errors are retried with backoff, fatal errors abort the one
/// item without touching its siblings.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Game not found: {0}")]
    NotFound(String),

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Provider rate limit exceeded")]
    RateLimited,

    #[error("Provider server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Returns true if the fetch should be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited | ProviderError::ServerError(_) | ProviderError::Network(_)
        )
    }
}

/// Port for the external game source.
#[async_trait]
pub trait GameProvider: Send + Sync {
    /// List candidate games for a player within a time window, newest
    /// first, at most `max` entries.
    async fn list_games(
        &self,
        player_id: &str,
        since: Option<DateTime<Utc>>,
        max: usize,
    ) -> Result<Vec<CandidateGame>, ProviderError>;

    /// Fetch the full transcript (move text) for one game.
    async fn fetch_transcript(&self, game_id: &str) -> Result<String, ProviderError>;
}
