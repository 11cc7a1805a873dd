//! Per-game analysis task.
//!
//! One invocation carries a single game from `Selected` to `Classified`:
//! fetch the transcript, ask the oracle for a structured reading, persist
//! the merged record, decide baseline membership from the store count,
//! and signal the trigger coordinator. Each game's task runs isolated;
//! nothing here touches sibling games.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, instrument, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{GameRecord, GameState, OracleAnalysis, OracleReading, PipelineConfig};
use crate::domain::ports::{GameFilter, GameProvider, GameRepository, Oracle};
use crate::services::extract::extract_json;
use crate::services::trigger::TriggerCoordinator;

/// What one analysis task produced.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub game_id: String,
    pub is_baseline: bool,
    /// True when the oracle output failed to parse and fallback defaults
    /// were stored
    pub degraded: bool,
}

pub struct GameAnalyzer {
    games: Arc<dyn GameRepository>,
    provider: Arc<dyn GameProvider>,
    oracle: Arc<dyn Oracle>,
    trigger: Arc<TriggerCoordinator>,
    config: PipelineConfig,
}

impl GameAnalyzer {
    pub fn new(
        games: Arc<dyn GameRepository>,
        provider: Arc<dyn GameProvider>,
        oracle: Arc<dyn Oracle>,
        trigger: Arc<TriggerCoordinator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            games,
            provider,
            oracle,
            trigger,
            config,
        }
    }

    /// Run the full analysis for one game.
    ///
    /// Transient provider/oracle errors are retried inside the adapters;
    /// what surfaces here is fatal for this game only and leaves its
    /// record in the prior state. Every successful run ends with an
    /// idempotent upsert, so re-running the same input reproduces the
    /// same stored state.
    #[instrument(skip(self, game), fields(player_id = %game.player_id, game_id = %game.game_id))]
    pub async fn analyze(&self, mut game: GameRecord) -> DomainResult<AnalysisOutcome> {
        // 1. Transcript fetch: fatal errors abort this game only
        let transcript = match self.provider.fetch_transcript(&game.game_id).await {
            Ok(transcript) => transcript,
            Err(err) => {
                error!("Transcript fetch failed: {}", err);
                return Err(err.into());
            }
        };

        game.state = GameState::DetailFetched;
        game.updated_at = Utc::now();
        self.games.upsert_game(&game).await?;

        // 2. Oracle reading; parse failure degrades, never aborts
        let prompt = build_analysis_prompt(&game, &transcript);
        let raw = self.oracle.infer(&prompt).await.map_err(|err| {
            error!("Oracle call failed after retries: {}", err);
            err
        })?;
        let reading = parse_reading(&raw);
        let degraded = matches!(reading, OracleReading::Degraded { .. });
        if degraded {
            warn!("Oracle output did not parse; storing degraded analysis");
        }

        // 3. Persist the merged record
        game = game.with_analysis(reading.into_analysis());
        self.games.upsert_game(&game).await?;

        // 4. Baseline decision from the store count, which includes the
        //    write above. Two racing tasks can both land inside K; that
        //    race is accepted, the correlation gate tolerates >= K.
        let analyzed = self
            .games
            .count_games(GameFilter::analyzed(&game.player_id))
            .await?;
        let is_baseline = analyzed <= self.config.baseline_size as i64;
        debug!(analyzed, is_baseline, "Classifying game");

        // 5. Re-persist the decision, advancing to Classified
        self.games
            .set_baseline(&game.player_id, &game.game_id, is_baseline)
            .await?;

        // 6. Signal completion; a coordinator failure never fails the task
        let trigger = Arc::clone(&self.trigger);
        let player_id = game.player_id.clone();
        tokio::spawn(async move {
            if let Err(err) = trigger.on_game_analyzed(&player_id).await {
                warn!("Trigger evaluation for {} failed: {}", player_id, err);
            }
        });

        Ok(AnalysisOutcome {
            game_id: game.game_id,
            is_baseline,
            degraded,
        })
    }
}

/// Parse the oracle's raw output into a reading, degrading on any
/// structural mismatch.
pub fn parse_reading(raw: &str) -> OracleReading {
    match serde_json::from_str::<OracleAnalysis>(&extract_json(raw)) {
        Ok(parsed) => OracleReading::Parsed(parsed),
        Err(_) => OracleReading::Degraded {
            raw: raw.to_string(),
        },
    }
}

fn build_analysis_prompt(game: &GameRecord, transcript: &str) -> String {
    format!(
        "You are reviewing one chess game played by {player}. \
         The game ended in a {outcome} for them.\n\n\
         TRANSCRIPT:\n{transcript}\n\n\
         Respond with ONLY a JSON object with these fields:\n\
         - short_summary: one or two sentences on how the game went\n\
         - long_summary: a paragraph narrating the course of the game\n\
         - opening: the opening family played\n\
         - motifs: exactly 5 tactical or strategic motifs that decided the game\n\
         - representative: boolean, whether this game is representative of the player\n\
         No additional text or formatting.",
        player = game.player_id,
        outcome = game.outcome.as_str(),
        transcript = transcript,
    )
}
