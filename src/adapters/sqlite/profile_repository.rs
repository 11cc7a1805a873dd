//! SQLite implementation of the ProfileRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::PlayerProfile;
use crate::domain::ports::ProfileRepository;

use super::{parse_datetime, parse_optional_datetime};

#[derive(Clone)]
pub struct SqliteProfileRepository {
    pool: SqlitePool,
}

impl SqliteProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for SqliteProfileRepository {
    async fn upsert_profile(&self, profile: &PlayerProfile) -> DomainResult<()> {
        let priorities_json = serde_json::to_string(&profile.learning_priorities)?;
        let insights_json = serde_json::to_string(&profile.key_insights)?;
        let motifs_json = serde_json::to_string(&profile.top_motifs)?;
        let openings_json = serde_json::to_string(&profile.top_openings)?;
        let (rating_min, rating_max) = match profile.rating_range {
            Some((min, max)) => (Some(min), Some(max)),
            None => (None, None),
        };

        sqlx::query(
            r#"INSERT INTO profiles (player_id, strengths, weaknesses, blind_spots,
               learning_priorities, style_summary, rating_assessment, key_insights,
               games_analyzed, wins, losses, draws, average_rating, rating_min, rating_max,
               top_motifs, top_openings, degraded, last_game_analyzed_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (player_id) DO UPDATE SET
                   strengths = excluded.strengths,
                   weaknesses = excluded.weaknesses,
                   blind_spots = excluded.blind_spots,
                   learning_priorities = excluded.learning_priorities,
                   style_summary = excluded.style_summary,
                   rating_assessment = excluded.rating_assessment,
                   key_insights = excluded.key_insights,
                   games_analyzed = excluded.games_analyzed,
                   wins = excluded.wins,
                   losses = excluded.losses,
                   draws = excluded.draws,
                   average_rating = excluded.average_rating,
                   rating_min = excluded.rating_min,
                   rating_max = excluded.rating_max,
                   top_motifs = excluded.top_motifs,
                   top_openings = excluded.top_openings,
                   degraded = excluded.degraded,
                   last_game_analyzed_at = excluded.last_game_analyzed_at,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&profile.player_id)
        .bind(&profile.strengths)
        .bind(&profile.weaknesses)
        .bind(&profile.blind_spots)
        .bind(&priorities_json)
        .bind(&profile.style_summary)
        .bind(&profile.rating_assessment)
        .bind(&insights_json)
        .bind(profile.games_analyzed)
        .bind(profile.wins)
        .bind(profile.losses)
        .bind(profile.draws)
        .bind(profile.average_rating)
        .bind(rating_min)
        .bind(rating_max)
        .bind(&motifs_json)
        .bind(&openings_json)
        .bind(profile.degraded)
        .bind(profile.last_game_analyzed_at.map(|t| t.to_rfc3339()))
        .bind(profile.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_profile(&self, player_id: &str) -> DomainResult<Option<PlayerProfile>> {
        let row: Option<ProfileRow> =
            sqlx::query_as("SELECT * FROM profiles WHERE player_id = ?")
                .bind(player_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(PlayerProfile::try_from).transpose()
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    player_id: String,
    strengths: String,
    weaknesses: String,
    blind_spots: String,
    learning_priorities: String,
    style_summary: String,
    rating_assessment: String,
    key_insights: String,
    games_analyzed: i64,
    wins: i64,
    losses: i64,
    draws: i64,
    average_rating: Option<f64>,
    rating_min: Option<i64>,
    rating_max: Option<i64>,
    top_motifs: String,
    top_openings: String,
    degraded: bool,
    last_game_analyzed_at: Option<String>,
    updated_at: String,
}

impl TryFrom<ProfileRow> for PlayerProfile {
    type Error = DomainError;

    fn try_from(row: ProfileRow) -> DomainResult<Self> {
        let rating_range = match (row.rating_min, row.rating_max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        };

        Ok(PlayerProfile {
            learning_priorities: serde_json::from_str(&row.learning_priorities)?,
            key_insights: serde_json::from_str(&row.key_insights)?,
            top_motifs: serde_json::from_str(&row.top_motifs)?,
            top_openings: serde_json::from_str(&row.top_openings)?,
            rating_range,
            last_game_analyzed_at: parse_optional_datetime(row.last_game_analyzed_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
            player_id: row.player_id,
            strengths: row.strengths,
            weaknesses: row.weaknesses,
            blind_spots: row.blind_spots,
            style_summary: row.style_summary,
            rating_assessment: row.rating_assessment,
            games_analyzed: row.games_analyzed,
            wins: row.wins,
            losses: row.losses,
            draws: row.draws,
            average_rating: row.average_rating,
            degraded: row.degraded,
        })
    }
}
