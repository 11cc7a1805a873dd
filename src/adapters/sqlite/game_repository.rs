//! SQLite implementation of the GameRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CorrelationVerdict, GameAnalysis, GameOutcome, GameRecord, GameState,
};
use crate::domain::ports::{GameFilter, GameRepository};

use super::{parse_datetime, parse_optional_datetime};

#[derive(Clone)]
pub struct SqliteGameRepository {
    pool: SqlitePool,
}

impl SqliteGameRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn bind_record(game: &GameRecord) -> DomainResult<BoundRecord> {
        Ok(BoundRecord {
            raw_json: serde_json::to_string(&game.raw)?,
            analysis_json: game.analysis.as_ref().map(serde_json::to_string).transpose()?,
            correlation_json: game.correlation.as_ref().map(serde_json::to_string).transpose()?,
        })
    }
}

/// Pre-serialized JSON columns of one record.
struct BoundRecord {
    raw_json: String,
    analysis_json: Option<String>,
    correlation_json: Option<String>,
}

/// Append the filter's WHERE clauses. String bindings are collected in
/// order; boolean and state-set conditions are embedded directly.
fn push_filter(query: &mut String, bindings: &mut Vec<String>, filter: &GameFilter) {
    if let Some(player_id) = &filter.player_id {
        query.push_str(" AND player_id = ?");
        bindings.push(player_id.clone());
    }
    if let Some(state) = &filter.state {
        query.push_str(" AND state = ?");
        bindings.push(state.as_str().to_string());
    }
    if let Some(analyzed) = filter.analyzed {
        if analyzed {
            query.push_str(" AND state IN ('analyzed', 'classified')");
        } else {
            query.push_str(" AND state NOT IN ('analyzed', 'classified')");
        }
    }
    if let Some(is_baseline) = filter.is_baseline {
        query.push_str(if is_baseline {
            " AND is_baseline = 1"
        } else {
            " AND is_baseline = 0"
        });
    }
    if let Some(has_correlation) = filter.has_correlation {
        query.push_str(if has_correlation {
            " AND correlation IS NOT NULL"
        } else {
            " AND correlation IS NULL"
        });
    }
}

#[async_trait]
impl GameRepository for SqliteGameRepository {
    async fn insert_if_absent(&self, game: &GameRecord) -> DomainResult<bool> {
        let bound = Self::bind_record(game)?;

        let result = sqlx::query(
            r#"INSERT INTO games (player_id, game_id, outcome, rating, played_at, raw,
               state, is_baseline, analysis, correlation, created_at, updated_at, analyzed_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (player_id, game_id) DO NOTHING"#,
        )
        .bind(&game.player_id)
        .bind(&game.game_id)
        .bind(game.outcome.as_str())
        .bind(game.rating)
        .bind(game.played_at.map(|t| t.to_rfc3339()))
        .bind(&bound.raw_json)
        .bind(game.state.as_str())
        .bind(game.is_baseline)
        .bind(&bound.analysis_json)
        .bind(&bound.correlation_json)
        .bind(game.created_at.to_rfc3339())
        .bind(game.updated_at.to_rfc3339())
        .bind(game.analyzed_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert_game(&self, game: &GameRecord) -> DomainResult<()> {
        let bound = Self::bind_record(game)?;

        sqlx::query(
            r#"INSERT INTO games (player_id, game_id, outcome, rating, played_at, raw,
               state, is_baseline, analysis, correlation, created_at, updated_at, analyzed_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (player_id, game_id) DO UPDATE SET
                   outcome = excluded.outcome,
                   rating = excluded.rating,
                   played_at = excluded.played_at,
                   raw = excluded.raw,
                   state = excluded.state,
                   is_baseline = CASE WHEN games.is_baseline = 1 THEN 1 ELSE excluded.is_baseline END,
                   analysis = excluded.analysis,
                   correlation = excluded.correlation,
                   updated_at = excluded.updated_at,
                   analyzed_at = excluded.analyzed_at"#,
        )
        .bind(&game.player_id)
        .bind(&game.game_id)
        .bind(game.outcome.as_str())
        .bind(game.rating)
        .bind(game.played_at.map(|t| t.to_rfc3339()))
        .bind(&bound.raw_json)
        .bind(game.state.as_str())
        .bind(game.is_baseline)
        .bind(&bound.analysis_json)
        .bind(&bound.correlation_json)
        .bind(game.created_at.to_rfc3339())
        .bind(game.updated_at.to_rfc3339())
        .bind(game.analyzed_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_game(&self, player_id: &str, game_id: &str) -> DomainResult<Option<GameRecord>> {
        let row: Option<GameRow> =
            sqlx::query_as("SELECT * FROM games WHERE player_id = ? AND game_id = ?")
                .bind(player_id)
                .bind(game_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(GameRecord::try_from).transpose()
    }

    async fn list_games(&self, filter: GameFilter) -> DomainResult<Vec<GameRecord>> {
        let mut query = String::from("SELECT * FROM games WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();
        push_filter(&mut query, &mut bindings, &filter);
        query.push_str(" ORDER BY COALESCE(analyzed_at, created_at) ASC, game_id ASC");
        if let Some(limit) = filter.limit {
            query.push_str(&format!(" LIMIT {limit}"));
        }

        let mut q = sqlx::query_as::<_, GameRow>(&query);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let rows: Vec<GameRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(GameRecord::try_from).collect()
    }

    async fn count_games(&self, filter: GameFilter) -> DomainResult<i64> {
        let mut query = String::from("SELECT COUNT(*) FROM games WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();
        push_filter(&mut query, &mut bindings, &filter);

        let mut q = sqlx::query_scalar::<_, i64>(&query);
        for binding in &bindings {
            q = q.bind(binding);
        }

        Ok(q.fetch_one(&self.pool).await?)
    }

    async fn set_baseline(
        &self,
        player_id: &str,
        game_id: &str,
        is_baseline: bool,
    ) -> DomainResult<()> {
        // Baseline membership is set once: a later write can never demote
        // an established member.
        let result = sqlx::query(
            "UPDATE games
             SET is_baseline = CASE WHEN is_baseline = 1 THEN 1 ELSE ? END,
                 state = 'classified', updated_at = ?
             WHERE player_id = ? AND game_id = ?",
        )
        .bind(is_baseline)
        .bind(Utc::now().to_rfc3339())
        .bind(player_id)
        .bind(game_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::GameNotFound {
                player_id: player_id.to_string(),
                game_id: game_id.to_string(),
            });
        }

        Ok(())
    }

    async fn set_correlation(
        &self,
        player_id: &str,
        game_id: &str,
        verdict: &CorrelationVerdict,
        revised_summary: Option<&str>,
    ) -> DomainResult<()> {
        let verdict_json = serde_json::to_string(verdict)?;

        // The summary rewrite lives inside the analysis JSON column, so it
        // takes a read-modify-write round trip.
        let analysis_json = if let Some(summary) = revised_summary {
            let current: Option<String> =
                sqlx::query_scalar("SELECT analysis FROM games WHERE player_id = ? AND game_id = ?")
                    .bind(player_id)
                    .bind(game_id)
                    .fetch_optional(&self.pool)
                    .await?
                    .flatten();

            current
                .map(|json| -> DomainResult<String> {
                    let mut analysis: GameAnalysis = serde_json::from_str(&json)?;
                    analysis.short_summary = summary.to_string();
                    Ok(serde_json::to_string(&analysis)?)
                })
                .transpose()?
        } else {
            None
        };

        let result = if let Some(analysis_json) = analysis_json {
            sqlx::query(
                "UPDATE games SET correlation = ?, analysis = ?, updated_at = ?
                 WHERE player_id = ? AND game_id = ?",
            )
            .bind(&verdict_json)
            .bind(&analysis_json)
            .bind(Utc::now().to_rfc3339())
            .bind(player_id)
            .bind(game_id)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                "UPDATE games SET correlation = ?, updated_at = ?
                 WHERE player_id = ? AND game_id = ?",
            )
            .bind(&verdict_json)
            .bind(Utc::now().to_rfc3339())
            .bind(player_id)
            .bind(game_id)
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(DomainError::GameNotFound {
                player_id: player_id.to_string(),
                game_id: game_id.to_string(),
            });
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct GameRow {
    player_id: String,
    game_id: String,
    outcome: String,
    rating: Option<i64>,
    played_at: Option<String>,
    raw: String,
    state: String,
    is_baseline: bool,
    analysis: Option<String>,
    correlation: Option<String>,
    created_at: String,
    updated_at: String,
    analyzed_at: Option<String>,
}

impl TryFrom<GameRow> for GameRecord {
    type Error = DomainError;

    fn try_from(row: GameRow) -> DomainResult<Self> {
        let outcome = GameOutcome::from_str(&row.outcome).ok_or_else(|| {
            DomainError::SerializationError(format!("Unknown outcome: {}", row.outcome))
        })?;
        let state = GameState::from_str(&row.state).ok_or_else(|| {
            DomainError::SerializationError(format!("Unknown state: {}", row.state))
        })?;

        Ok(GameRecord {
            outcome,
            state,
            raw: serde_json::from_str(&row.raw)?,
            analysis: row.analysis.map(|json| serde_json::from_str(&json)).transpose()?,
            correlation: row.correlation.map(|json| serde_json::from_str(&json)).transpose()?,
            is_baseline: row.is_baseline,
            rating: row.rating,
            played_at: parse_optional_datetime(row.played_at)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
            analyzed_at: parse_optional_datetime(row.analyzed_at)?,
            player_id: row.player_id,
            game_id: row.game_id,
        })
    }
}
