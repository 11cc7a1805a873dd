//! Common test utilities for integration tests
//!
//! Provides the in-memory store, mock adapters, and a wired pipeline
//! harness shared across integration test files.

use std::future::Future;
use std::sync::Arc;

use serde_json::json;
use sqlx::SqlitePool;

use kibitzer::adapters::mock::{MockOracle, MockOracleResponse, MockProvider};
use kibitzer::adapters::sqlite::{
    create_migrated_test_pool, SqliteGameRepository, SqliteProfileRepository,
};
use kibitzer::application::ReviewPipeline;
use kibitzer::domain::models::{CandidateGame, GameOutcome, PipelineConfig, SelectionQuotas};
use kibitzer::domain::ports::{GameProvider, GameRepository, Oracle, ProfileRepository};
use kibitzer::services::{
    CorrelationStage, GameAnalyzer, ProfileSynthesizer, TriggerCoordinator,
};

/// Everything a pipeline test needs, wired over one in-memory store.
#[allow(dead_code)]
pub struct TestHarness {
    pub pool: SqlitePool,
    pub games: Arc<dyn GameRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub oracle: Arc<MockOracle>,
    pub provider: Arc<MockProvider>,
    pub analyzer: Arc<GameAnalyzer>,
    pub trigger: Arc<TriggerCoordinator>,
    pub synthesizer: Arc<ProfileSynthesizer>,
    pub correlator: Arc<CorrelationStage>,
    pub pipeline: ReviewPipeline,
}

/// Pipeline config with test-friendly wait times: K=3, synthesis every 3,
/// near-instant correlation verify retries.
#[allow(dead_code)]
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        target: 10,
        quotas: SelectionQuotas { win: 4, loss: 4, draw: 2 },
        baseline_size: 3,
        synthesis_interval: 3,
        verify_attempts: 3,
        verify_delay_ms: 10,
    }
}

#[allow(dead_code)]
pub async fn setup_harness(config: PipelineConfig) -> TestHarness {
    let pool = create_migrated_test_pool()
        .await
        .expect("failed to create test database");

    let games: Arc<dyn GameRepository> = Arc::new(SqliteGameRepository::new(pool.clone()));
    let profiles: Arc<dyn ProfileRepository> = Arc::new(SqliteProfileRepository::new(pool.clone()));

    let oracle = Arc::new(MockOracle::with_default_response(MockOracleResponse::success(
        analysis_json("default summary", "Unknown Opening"),
    )));
    let provider = Arc::new(MockProvider::new());

    let oracle_port: Arc<dyn Oracle> = Arc::clone(&oracle) as Arc<dyn Oracle>;
    let provider_port: Arc<dyn GameProvider> = Arc::clone(&provider) as Arc<dyn GameProvider>;

    let synthesizer = Arc::new(ProfileSynthesizer::new(
        Arc::clone(&games),
        Arc::clone(&profiles),
        Arc::clone(&oracle_port),
        config.clone(),
    ));
    let correlator = Arc::new(CorrelationStage::new(
        Arc::clone(&games),
        Arc::clone(&profiles),
        Arc::clone(&oracle_port),
        config.clone(),
    ));
    let trigger = Arc::new(TriggerCoordinator::new(
        Arc::clone(&games),
        Arc::clone(&synthesizer),
        Arc::clone(&correlator),
        config.clone(),
    ));
    let analyzer = Arc::new(GameAnalyzer::new(
        Arc::clone(&games),
        Arc::clone(&provider_port),
        oracle_port,
        Arc::clone(&trigger),
        config.clone(),
    ));
    let pipeline = ReviewPipeline::new(
        Arc::clone(&games),
        provider_port,
        Arc::clone(&analyzer),
        config,
    );

    TestHarness {
        pool,
        games,
        profiles,
        oracle,
        provider,
        analyzer,
        trigger,
        synthesizer,
        correlator,
        pipeline,
    }
}

/// Candidate fixture for the default test player.
#[allow(dead_code)]
pub fn candidate(id: &str, outcome: GameOutcome) -> CandidateGame {
    CandidateGame {
        game_id: id.to_string(),
        player_id: "magnus".to_string(),
        outcome,
        rating: Some(2000),
        played_at: None,
        raw: json!({"id": id}),
    }
}

/// A well-formed analysis response the oracle can return.
#[allow(dead_code)]
pub fn analysis_json(summary: &str, opening: &str) -> String {
    json!({
        "short_summary": summary,
        "long_summary": format!("{summary} in detail"),
        "opening": opening,
        "motifs": ["fork", "pin", "outpost", "open file", "zugzwang"],
        "representative": true
    })
    .to_string()
}

/// A well-formed synthesis response.
#[allow(dead_code)]
pub fn synthesis_json(strengths: &str) -> String {
    json!({
        "strengths": strengths,
        "weaknesses": "endgames",
        "blind_spots": "back rank",
        "learning_priorities": ["rook endgames"],
        "style_summary": "aggressive",
        "rating_assessment": "underrated",
        "key_insights": ["plays too fast"]
    })
    .to_string()
}

/// A well-formed correlation verdict response.
#[allow(dead_code)]
pub fn correlation_json(is_match: bool, matched: &[&str], revised: Option<&str>) -> String {
    json!({
        "is_match": is_match,
        "matched_baseline_ids": matched,
        "rationale": "same structural collapse",
        "shared_themes": "weak dark squares",
        "revised_summary": revised
    })
    .to_string()
}

/// Poll an async predicate every 25ms until it returns true or the
/// timeout is reached.
#[allow(dead_code)]
pub async fn wait_for<F, Fut>(mut predicate: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);

    loop {
        if predicate().await {
            return true;
        }
        if start.elapsed() >= timeout {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
}
