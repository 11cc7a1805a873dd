//! HTTP client for the external game source.
//!
//! Transient errors (rate limits, 5xx, network) are retried with
//! exponential backoff; not-found and malformed payloads surface
//! immediately as fatal, item-scoped errors.

use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::models::{CandidateGame, GameOutcome, ProviderConfig};
use crate::domain::ports::{GameProvider, ProviderError};

/// HTTP client for the game provider API.
pub struct HttpGameProvider {
    http_client: ReqwestClient,
    base_url: String,
    max_retry_secs: u64,
}

impl HttpGameProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            max_retry_secs: config.max_retry_secs,
        })
    }

    fn backoff_policy(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(self.max_retry_secs)),
            ..ExponentialBackoff::default()
        }
    }

    async fn list_games_once(
        &self,
        player_id: &str,
        since: Option<DateTime<Utc>>,
        max: usize,
    ) -> Result<Vec<CandidateGame>, ProviderError> {
        let url = format!("{}/players/{}/games", self.base_url, player_id);

        debug!("GET {} (max={})", url, max);

        let mut request = self.http_client.get(&url).query(&[("max", max.to_string())]);
        if let Some(since) = since {
            request = request.query(&[("since", since.to_rfc3339())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        let body = check_status(player_id, response).await?;

        let entries: Vec<serde_json::Value> = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Malformed(format!("game list did not parse: {e}")))?;

        let mut candidates = Vec::with_capacity(entries.len());
        for entry in entries {
            match parse_candidate(player_id, &entry) {
                Some(candidate) => candidates.push(candidate),
                None => warn!("Skipping malformed game entry: {}", entry),
            }
        }
        Ok(candidates)
    }

    async fn fetch_transcript_once(&self, game_id: &str) -> Result<String, ProviderError> {
        let url = format!("{}/games/{}/transcript", self.base_url, game_id);

        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        let body = check_status(game_id, response).await?;

        if body.trim().is_empty() {
            return Err(ProviderError::Malformed(format!(
                "empty transcript for game {game_id}"
            )));
        }
        Ok(body)
    }
}

/// Map one provider entry to a candidate, carrying the full entry through
/// as the opaque raw payload. Entries without an id and outcome are
/// dropped by the caller.
fn parse_candidate(player_id: &str, entry: &serde_json::Value) -> Option<CandidateGame> {
    let game_id = entry.get("id").and_then(|v| v.as_str())?.to_string();
    let outcome = entry
        .get("outcome")
        .and_then(|v| v.as_str())
        .and_then(GameOutcome::from_str)?;
    let rating = entry.get("rating").and_then(serde_json::Value::as_i64);
    let played_at = entry
        .get("played_at")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Some(CandidateGame {
        game_id,
        player_id: player_id.to_string(),
        outcome,
        rating,
        played_at,
        raw: entry.clone(),
    })
}

async fn check_status(subject: &str, response: Response) -> Result<String, ProviderError> {
    let status = response.status();

    if status.is_success() {
        return response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::NOT_FOUND => ProviderError::NotFound(subject.to_string()),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
        status if status.is_server_error() => {
            ProviderError::ServerError(format!("HTTP {status}: {body}"))
        }
        _ => ProviderError::Malformed(format!("HTTP {status}: {body}")),
    })
}

/// Split provider errors into backoff's transient/permanent classes.
fn classify(err: ProviderError) -> backoff::Error<ProviderError> {
    if err.is_transient() {
        backoff::Error::transient(err)
    } else {
        backoff::Error::permanent(err)
    }
}

#[async_trait]
impl GameProvider for HttpGameProvider {
    async fn list_games(
        &self,
        player_id: &str,
        since: Option<DateTime<Utc>>,
        max: usize,
    ) -> Result<Vec<CandidateGame>, ProviderError> {
        retry(self.backoff_policy(), || async {
            self.list_games_once(player_id, since, max)
                .await
                .map_err(classify)
        })
        .await
    }

    async fn fetch_transcript(&self, game_id: &str) -> Result<String, ProviderError> {
        retry(self.backoff_policy(), || async {
            self.fetch_transcript_once(game_id).await.map_err(classify)
        })
        .await
    }
}
