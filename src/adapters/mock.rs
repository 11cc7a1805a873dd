//! Mock oracle and provider for testing.
//!
//! Both mocks mirror the real adapters' ports and support scripted
//! responses plus failure injection, so pipeline tests can drive every
//! degradation path without a network.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::models::CandidateGame;
use crate::domain::ports::{GameProvider, Oracle, OracleError, ProviderError};

/// Scripted oracle response.
#[derive(Debug, Clone)]
pub struct MockOracleResponse {
    /// Output text
    pub output: String,
    /// Whether to simulate failure
    pub fail: bool,
    /// Whether the simulated failure is transient
    pub transient: bool,
}

impl Default for MockOracleResponse {
    fn default() -> Self {
        Self {
            output: "{}".to_string(),
            fail: false,
            transient: false,
        }
    }
}

impl MockOracleResponse {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ..Default::default()
        }
    }

    pub fn failure() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

impl From<String> for MockOracleResponse {
    fn from(output: String) -> Self {
        Self::success(output)
    }
}

impl From<&str> for MockOracleResponse {
    fn from(output: &str) -> Self {
        Self::success(output)
    }
}

/// Mock oracle with per-prompt scripted responses.
///
/// Scripts are matched by substring against the incoming prompt, in
/// insertion order; the default response covers everything unmatched.
pub struct MockOracle {
    scripts: Arc<RwLock<Vec<(String, MockOracleResponse)>>>,
    default_response: Arc<RwLock<MockOracleResponse>>,
    prompts: Arc<RwLock<Vec<String>>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(RwLock::new(Vec::new())),
            default_response: Arc::new(RwLock::new(MockOracleResponse::default())),
            prompts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_default_response(response: MockOracleResponse) -> Self {
        Self {
            scripts: Arc::new(RwLock::new(Vec::new())),
            default_response: Arc::new(RwLock::new(response)),
            prompts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Set the response for any prompt not matched by a script.
    pub async fn set_default_response(&self, response: impl Into<MockOracleResponse>) {
        *self.default_response.write().await = response.into();
    }

    /// Script a response for prompts containing `key`.
    pub async fn respond_to(&self, key: impl Into<String>, response: impl Into<MockOracleResponse>) {
        self.scripts.write().await.push((key.into(), response.into()));
    }

    /// All prompts received so far, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.read().await.clone()
    }

    pub async fn prompt_count(&self) -> usize {
        self.prompts.read().await.len()
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn infer(&self, prompt: &str) -> Result<String, OracleError> {
        self.prompts.write().await.push(prompt.to_string());

        let scripted = {
            let scripts = self.scripts.read().await;
            scripts
                .iter()
                .find(|(key, _)| prompt.contains(key.as_str()))
                .map(|(_, response)| response.clone())
        };
        let response = match scripted {
            Some(response) => response,
            None => self.default_response.read().await.clone(),
        };

        if response.fail {
            if response.transient {
                return Err(OracleError::RateLimitExceeded);
            }
            return Err(OracleError::ServerError("scripted failure".to_string()));
        }
        Ok(response.output)
    }
}

/// Mock provider with per-game transcripts and error injection.
pub struct MockProvider {
    candidates: Arc<RwLock<Vec<CandidateGame>>>,
    transcripts: Arc<RwLock<HashMap<String, String>>>,
    errors: Arc<RwLock<HashMap<String, ProviderError>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            candidates: Arc::new(RwLock::new(Vec::new())),
            transcripts: Arc::new(RwLock::new(HashMap::new())),
            errors: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed the candidate list returned by `list_games`.
    pub async fn set_candidates(&self, candidates: Vec<CandidateGame>) {
        *self.candidates.write().await = candidates;
    }

    /// Seed a transcript for one game.
    pub async fn set_transcript(&self, game_id: impl Into<String>, transcript: impl Into<String>) {
        self.transcripts.write().await.insert(game_id.into(), transcript.into());
    }

    /// Inject an error for one game's transcript fetch.
    pub async fn fail_transcript(&self, game_id: impl Into<String>, error: ProviderError) {
        self.errors.write().await.insert(game_id.into(), error);
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GameProvider for MockProvider {
    async fn list_games(
        &self,
        player_id: &str,
        _since: Option<DateTime<Utc>>,
        max: usize,
    ) -> Result<Vec<CandidateGame>, ProviderError> {
        let candidates = self.candidates.read().await;
        Ok(candidates
            .iter()
            .filter(|c| c.player_id == player_id)
            .take(max)
            .cloned()
            .collect())
    }

    async fn fetch_transcript(&self, game_id: &str) -> Result<String, ProviderError> {
        if let Some(error) = self.errors.read().await.get(game_id) {
            return Err(error.clone());
        }

        self.transcripts
            .read()
            .await
            .get(game_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(game_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::GameOutcome;
    use serde_json::json;

    fn candidate(id: &str) -> CandidateGame {
        CandidateGame {
            game_id: id.to_string(),
            player_id: "magnus".to_string(),
            outcome: GameOutcome::Win,
            rating: None,
            played_at: None,
            raw: json!({}),
        }
    }

    #[tokio::test]
    async fn test_oracle_scripted_response() {
        let oracle = MockOracle::new();
        oracle
            .respond_to("game g1", MockOracleResponse::success("scripted"))
            .await;
        oracle
            .set_default_response(MockOracleResponse::success("default"))
            .await;

        assert_eq!(oracle.infer("analyze game g1 please").await.unwrap(), "scripted");
        assert_eq!(oracle.infer("something else").await.unwrap(), "default");
        assert_eq!(oracle.prompt_count().await, 2);
    }

    #[tokio::test]
    async fn test_oracle_failure_injection() {
        let oracle = MockOracle::new();
        oracle.respond_to("g2", MockOracleResponse::failure()).await;

        let err = oracle.infer("analyze g2").await.unwrap_err();
        assert!(matches!(err, OracleError::ServerError(_)));
    }

    #[tokio::test]
    async fn test_provider_transcript_and_errors() {
        let provider = MockProvider::new();
        provider.set_transcript("g1", "1. e4 e5").await;
        provider.fail_transcript("g2", ProviderError::RateLimited).await;

        assert_eq!(provider.fetch_transcript("g1").await.unwrap(), "1. e4 e5");
        assert!(matches!(
            provider.fetch_transcript("g2").await,
            Err(ProviderError::RateLimited)
        ));
        assert!(matches!(
            provider.fetch_transcript("g3").await,
            Err(ProviderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_provider_list_filters_by_player() {
        let provider = MockProvider::new();
        let mut other = candidate("g9");
        other.player_id = "rival".to_string();
        provider.set_candidates(vec![candidate("g1"), candidate("g2"), other]).await;

        let games = provider.list_games("magnus", None, 10).await.unwrap();
        assert_eq!(games.len(), 2);

        let capped = provider.list_games("magnus", None, 1).await.unwrap();
        assert_eq!(capped.len(), 1);
    }
}
