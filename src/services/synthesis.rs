//! Profile synthesis stage.
//!
//! Aggregates every analyzed game for a player into one profile document.
//! The gate is re-checked on entry so stale or duplicate dispatches exit
//! silently, and the write is a full replace so re-synthesis at a later
//! multiple simply overwrites the previous profile.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    GameOutcome, GameRecord, OracleSynthesis, PipelineConfig, PlayerProfile,
};
use crate::domain::ports::{GameFilter, GameRepository, Oracle, ProfileRepository};
use crate::services::extract::extract_json;
use crate::services::trigger::synthesis_gate;

const TOP_MOTIF_COUNT: usize = 10;
const TOP_OPENING_COUNT: usize = 5;

/// What one synthesis invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    /// Gate no longer satisfied at entry; nothing written
    NotEligible,
    /// Profile written (fully replacing any previous one)
    Written { games_analyzed: i64, degraded: bool },
}

pub struct ProfileSynthesizer {
    games: Arc<dyn GameRepository>,
    profiles: Arc<dyn ProfileRepository>,
    oracle: Arc<dyn Oracle>,
    config: PipelineConfig,
}

impl ProfileSynthesizer {
    pub fn new(
        games: Arc<dyn GameRepository>,
        profiles: Arc<dyn ProfileRepository>,
        oracle: Arc<dyn Oracle>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            games,
            profiles,
            oracle,
            config,
        }
    }

    /// Synthesize the player's profile from all analyzed games.
    ///
    /// The quantitative aggregates are always computed locally and always
    /// written; only the qualitative fields depend on the oracle, and they
    /// degrade to truncated raw text when its output does not parse.
    #[instrument(skip(self))]
    pub async fn synthesize(&self, player_id: &str) -> DomainResult<SynthesisOutcome> {
        let analyzed = self.games.count_games(GameFilter::analyzed(player_id)).await?;
        if !synthesis_gate(analyzed, self.config.synthesis_interval as i64) {
            debug!("Synthesis gate no longer satisfied at {} games; exiting", analyzed);
            return Ok(SynthesisOutcome::NotEligible);
        }

        let games = self.games.list_games(GameFilter::analyzed(player_id)).await?;
        if games.is_empty() {
            return Ok(SynthesisOutcome::NotEligible);
        }

        let mut profile = PlayerProfile::empty(player_id);
        aggregate(&mut profile, &games);

        let prompt = build_synthesis_prompt(player_id, &games);
        match self.oracle.infer(&prompt).await {
            Ok(raw) => match serde_json::from_str::<OracleSynthesis>(&extract_json(&raw)) {
                Ok(parsed) => profile.apply_synthesis(parsed),
                Err(_) => {
                    warn!("Synthesis output did not parse; storing raw text fallback");
                    profile.apply_degraded(&raw);
                }
            },
            Err(err) => {
                // The aggregates still get written
                warn!("Synthesis oracle call failed: {}; writing aggregates only", err);
                profile.apply_degraded("");
            }
        }

        profile.updated_at = Utc::now();
        let degraded = profile.degraded;
        self.profiles.upsert_profile(&profile).await?;

        info!(
            games_analyzed = profile.games_analyzed,
            degraded, "Profile written"
        );
        Ok(SynthesisOutcome::Written {
            games_analyzed: profile.games_analyzed,
            degraded,
        })
    }
}

/// Compute the quantitative aggregates from the analyzed games.
fn aggregate(profile: &mut PlayerProfile, games: &[GameRecord]) {
    profile.games_analyzed = games.len() as i64;
    profile.wins = games.iter().filter(|g| g.outcome == GameOutcome::Win).count() as i64;
    profile.losses = games.iter().filter(|g| g.outcome == GameOutcome::Loss).count() as i64;
    profile.draws = games.iter().filter(|g| g.outcome == GameOutcome::Draw).count() as i64;

    let ratings: Vec<i64> = games.iter().filter_map(|g| g.rating).collect();
    if !ratings.is_empty() {
        let sum: i64 = ratings.iter().sum();
        profile.average_rating = Some(sum as f64 / ratings.len() as f64);
        let min = *ratings.iter().min().unwrap_or(&0);
        let max = *ratings.iter().max().unwrap_or(&0);
        profile.rating_range = Some((min, max));
    }

    let mut motif_counts: HashMap<&str, i64> = HashMap::new();
    let mut opening_counts: HashMap<&str, i64> = HashMap::new();
    for game in games {
        if let Some(analysis) = &game.analysis {
            for motif in &analysis.motifs {
                if !motif.is_empty() {
                    *motif_counts.entry(motif.as_str()).or_default() += 1;
                }
            }
            if !analysis.opening.is_empty() {
                *opening_counts.entry(analysis.opening.as_str()).or_default() += 1;
            }
        }
    }
    profile.top_motifs = top_n(motif_counts, TOP_MOTIF_COUNT);
    profile.top_openings = top_n(opening_counts, TOP_OPENING_COUNT);

    profile.last_game_analyzed_at = games.iter().filter_map(|g| g.analyzed_at).max();
}

/// Highest counts first; ties break on name for a stable result.
fn top_n(counts: HashMap<&str, i64>, n: usize) -> Vec<(String, i64)> {
    let mut entries: Vec<(String, i64)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}

fn build_synthesis_prompt(player_id: &str, games: &[GameRecord]) -> String {
    let mut digest = String::new();
    for game in games {
        if let Some(analysis) = &game.analysis {
            digest.push_str(&format!(
                "- game {id} ({outcome}): {summary} [opening: {opening}; motifs: {motifs}]\n",
                id = game.game_id,
                outcome = game.outcome.as_str(),
                summary = analysis.short_summary,
                opening = analysis.opening,
                motifs = analysis.motifs.join(", "),
            ));
        }
    }

    format!(
        "You have analyzed {count} games played by {player}. Synthesize an \
         overall profile of their play from these per-game summaries.\n\n\
         GAMES:\n{digest}\n\
         Respond with ONLY a JSON object with these fields:\n\
         - strengths: what this player does well\n\
         - weaknesses: where they lose games\n\
         - blind_spots: recurring oversights they appear unaware of\n\
         - learning_priorities: list of the most valuable things to study next\n\
         - style_summary: a characterization of their playing style\n\
         - rating_assessment: how their results compare to their rating\n\
         - key_insights: list of the most important takeaways\n\
         Do not compute any statistics; they are derived elsewhere. \
         No additional text or formatting.",
        count = games.len(),
        player = player_id,
        digest = digest,
    )
}
