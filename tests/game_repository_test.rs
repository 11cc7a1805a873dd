//! Integration tests for the SQLite progress store adapters.

mod common;

use kibitzer::adapters::sqlite::{
    create_migrated_test_pool, SqliteGameRepository, SqliteProfileRepository,
};
use kibitzer::domain::models::{
    CorrelationVerdict, GameAnalysis, GameOutcome, GameRecord, GameState, PlayerProfile,
};
use kibitzer::domain::ports::{GameFilter, GameRepository, ProfileRepository};

use common::candidate;

async fn setup_repo() -> SqliteGameRepository {
    let pool = create_migrated_test_pool().await.expect("test pool");
    SqliteGameRepository::new(pool)
}

fn analyzed_record(id: &str, outcome: GameOutcome) -> GameRecord {
    GameRecord::from_candidate(candidate(id, outcome))
        .with_analysis(GameAnalysis::degraded(format!("summary {id}")))
}

#[tokio::test]
async fn test_upsert_and_get_round_trip() {
    let repo = setup_repo().await;
    let record = analyzed_record("g1", GameOutcome::Win);

    repo.upsert_game(&record).await.unwrap();
    let loaded = repo.get_game("magnus", "g1").await.unwrap().expect("game exists");

    assert_eq!(loaded.game_id, record.game_id);
    assert_eq!(loaded.outcome, GameOutcome::Win);
    assert_eq!(loaded.state, GameState::Analyzed);
    assert_eq!(loaded.analysis, record.analysis);
    assert_eq!(loaded.raw, record.raw);
}

#[tokio::test]
async fn test_upsert_twice_is_idempotent() {
    let repo = setup_repo().await;
    let record = analyzed_record("g1", GameOutcome::Loss);

    repo.upsert_game(&record).await.unwrap();
    repo.upsert_game(&record).await.unwrap();

    let count = repo.count_games(GameFilter::for_player("magnus")).await.unwrap();
    assert_eq!(count, 1);

    let loaded = repo.get_game("magnus", "g1").await.unwrap().unwrap();
    assert_eq!(loaded, record);
}

#[tokio::test]
async fn test_insert_if_absent_never_clobbers() {
    let repo = setup_repo().await;
    let record = analyzed_record("g1", GameOutcome::Win);
    repo.upsert_game(&record).await.unwrap();

    // A later selection run must not reset the analyzed record
    let fresh = GameRecord::from_candidate(candidate("g1", GameOutcome::Win));
    let inserted = repo.insert_if_absent(&fresh).await.unwrap();
    assert!(!inserted);

    let loaded = repo.get_game("magnus", "g1").await.unwrap().unwrap();
    assert_eq!(loaded.state, GameState::Analyzed);
    assert!(loaded.analysis.is_some());

    let inserted = repo
        .insert_if_absent(&GameRecord::from_candidate(candidate("g2", GameOutcome::Draw)))
        .await
        .unwrap();
    assert!(inserted);
}

#[tokio::test]
async fn test_filters_and_counts() {
    let repo = setup_repo().await;

    repo.upsert_game(&analyzed_record("g1", GameOutcome::Win)).await.unwrap();
    repo.upsert_game(&analyzed_record("g2", GameOutcome::Loss)).await.unwrap();
    repo.upsert_game(&GameRecord::from_candidate(candidate("g3", GameOutcome::Win)))
        .await
        .unwrap();

    repo.set_baseline("magnus", "g1", true).await.unwrap();
    repo.set_baseline("magnus", "g2", false).await.unwrap();

    assert_eq!(repo.count_games(GameFilter::for_player("magnus")).await.unwrap(), 3);
    assert_eq!(repo.count_games(GameFilter::analyzed("magnus")).await.unwrap(), 2);
    assert_eq!(repo.count_games(GameFilter::baseline("magnus")).await.unwrap(), 1);
    assert_eq!(
        repo.count_games(GameFilter::correlation_candidates("magnus")).await.unwrap(),
        1
    );
    assert_eq!(repo.count_games(GameFilter::for_player("rival")).await.unwrap(), 0);

    let candidates = repo
        .list_games(GameFilter::correlation_candidates("magnus"))
        .await
        .unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].game_id, "g2");
}

#[tokio::test]
async fn test_set_baseline_advances_to_classified() {
    let repo = setup_repo().await;
    repo.upsert_game(&analyzed_record("g1", GameOutcome::Win)).await.unwrap();

    repo.set_baseline("magnus", "g1", true).await.unwrap();

    let loaded = repo.get_game("magnus", "g1").await.unwrap().unwrap();
    assert!(loaded.is_baseline);
    assert_eq!(loaded.state, GameState::Classified);
    // Classified still counts as analyzed for gate arithmetic
    assert_eq!(repo.count_games(GameFilter::analyzed("magnus")).await.unwrap(), 1);
}

#[tokio::test]
async fn test_set_baseline_missing_game_errors() {
    let repo = setup_repo().await;
    let result = repo.set_baseline("magnus", "ghost", true).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_set_correlation_with_summary_rewrite() {
    let repo = setup_repo().await;
    repo.upsert_game(&analyzed_record("g1", GameOutcome::Loss)).await.unwrap();

    let verdict = CorrelationVerdict {
        is_match: true,
        matched_baseline_ids: vec!["g9".to_string()],
        rationale: "same collapse".to_string(),
        shared_themes: "rook endings".to_string(),
    };
    repo.set_correlation("magnus", "g1", &verdict, Some("rewritten in context"))
        .await
        .unwrap();

    let loaded = repo.get_game("magnus", "g1").await.unwrap().unwrap();
    assert_eq!(loaded.correlation, Some(verdict));
    assert_eq!(
        loaded.analysis.unwrap().short_summary,
        "rewritten in context"
    );
}

#[tokio::test]
async fn test_set_correlation_without_rewrite_keeps_summary() {
    let repo = setup_repo().await;
    repo.upsert_game(&analyzed_record("g1", GameOutcome::Loss)).await.unwrap();

    let verdict = CorrelationVerdict::no_match("nothing shared");
    repo.set_correlation("magnus", "g1", &verdict, None).await.unwrap();

    let loaded = repo.get_game("magnus", "g1").await.unwrap().unwrap();
    assert_eq!(loaded.correlation, Some(verdict));
    assert_eq!(loaded.analysis.unwrap().short_summary, "summary g1");
}

#[tokio::test]
async fn test_profile_upsert_is_full_replace() {
    let pool = create_migrated_test_pool().await.expect("test pool");
    let repo = SqliteProfileRepository::new(pool);

    let mut profile = PlayerProfile::empty("magnus");
    profile.strengths = "tactics".to_string();
    profile.games_analyzed = 3;
    profile.top_motifs = vec![("fork".to_string(), 2)];
    repo.upsert_profile(&profile).await.unwrap();

    let mut replacement = PlayerProfile::empty("magnus");
    replacement.strengths = "endgames".to_string();
    replacement.games_analyzed = 6;
    repo.upsert_profile(&replacement).await.unwrap();

    let loaded = repo.get_profile("magnus").await.unwrap().expect("profile exists");
    assert_eq!(loaded.games_analyzed, 6);
    assert_eq!(loaded.strengths, "endgames");
    // Fully replaced: the old motifs are gone
    assert!(loaded.top_motifs.is_empty());

    assert!(repo.get_profile("rival").await.unwrap().is_none());
}
