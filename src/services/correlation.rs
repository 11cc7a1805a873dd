//! Correlation stage.
//!
//! Links later games back to the established baseline set. One invocation
//! verifies the baseline is visible (bounded wait absorbs read-after-write
//! lag against the store), loads the baseline and the profile, then
//! processes every pending candidate independently: each ends in a
//! terminal verdict even when its oracle call fails, so the gate cannot
//! re-trigger forever on the same game.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CorrelationReading, CorrelationVerdict, GameRecord, PipelineConfig, PlayerProfile,
};
use crate::domain::ports::{GameFilter, GameRepository, Oracle, ProfileRepository};
use crate::services::extract::extract_json;

/// What one correlation invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationOutcome {
    /// Baseline still not visible after the bounded wait; nothing done
    NotEligible,
    /// All pending candidates were processed
    Completed {
        processed: usize,
        matched: usize,
        /// Candidates that received the deterministic fallback verdict
        fallbacks: usize,
    },
}

pub struct CorrelationStage {
    games: Arc<dyn GameRepository>,
    profiles: Arc<dyn ProfileRepository>,
    oracle: Arc<dyn Oracle>,
    config: PipelineConfig,
}

impl CorrelationStage {
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

    #[instrument(skip(self), fields(pass_id = %Uuid::new_v4()))]
    pub async fn correlate(&self, player_id: &str) -> DomainResult<CorrelationOutcome> {
        // Verify: the wait compensates for store lag, not for genuinely
        // missing data
        if !self.verify_baseline(player_id).await? {
            return Ok(CorrelationOutcome::NotEligible);
        }

        let baseline = self.games.list_games(GameFilter::baseline(player_id)).await?;
        // The profile is an optional enrichment; never block on it
        let profile = self.profiles.get_profile(player_id).await?;
        let candidates = self
            .games
            .list_games(GameFilter::correlation_candidates(player_id))
            .await?;

        if candidates.is_empty() {
            debug!("No pending correlation candidates");
            return Ok(CorrelationOutcome::Completed {
                processed: 0,
                matched: 0,
                fallbacks: 0,
            });
        }

        info!(
            candidates = candidates.len(),
            baseline = baseline.len(),
            has_profile = profile.is_some(),
            "Correlating candidates against baseline"
        );

        // Candidates are independent: no fail-fast, results aggregated
        let results = join_all(
            candidates
                .into_iter()
                .map(|candidate| self.correlate_candidate(candidate, &baseline, profile.as_ref())),
        )
        .await;

        let mut processed = 0;
        let mut matched = 0;
        let mut fallbacks = 0;
        for result in results {
            match result {
                CandidateResult::Matched => {
                    processed += 1;
                    matched += 1;
                }
                CandidateResult::NotMatched => processed += 1,
                CandidateResult::Fallback => {
                    processed += 1;
                    fallbacks += 1;
                }
                CandidateResult::PersistFailed => {}
            }
        }

        info!(processed, matched, fallbacks, "Correlation pass complete");
        Ok(CorrelationOutcome::Completed {
            processed,
            matched,
            fallbacks,
        })
    }

    /// Bounded wait for the baseline count to become visible.
    async fn verify_baseline(&self, player_id: &str) -> DomainResult<bool> {
        let needed = self.config.baseline_size as i64;
        let mut attempt = 0;

        loop {
            let baseline = self.games.count_games(GameFilter::baseline(player_id)).await?;
            if baseline >= needed {
                return Ok(true);
            }

            attempt += 1;
            if attempt >= self.config.verify_attempts {
                info!(
                    baseline,
                    needed, "Baseline set not visible after {} attempts; giving up", attempt
                );
                return Ok(false);
            }

            debug!(baseline, needed, attempt, "Baseline not yet visible; waiting");
            sleep(Duration::from_millis(self.config.verify_delay_ms)).await;
        }
    }

    /// Produce and persist a terminal verdict for one candidate.
    async fn correlate_candidate(
        &self,
        candidate: GameRecord,
        baseline: &[GameRecord],
        profile: Option<&PlayerProfile>,
    ) -> CandidateResult {
        let prompt = build_correlation_prompt(&candidate, baseline, profile);

        let (verdict, revised_summary, fallback) = match self.oracle.infer(&prompt).await {
            Ok(raw) => match serde_json::from_str::<CorrelationReading>(&extract_json(&raw)) {
                Ok(reading) => {
                    let revised = if reading.is_match {
                        reading.revised_summary.clone()
                    } else {
                        None
                    };
                    (reading.into_verdict(), revised, false)
                }
                Err(_) => {
                    warn!(
                        game_id = %candidate.game_id,
                        "Correlation output did not parse; storing fallback verdict"
                    );
                    (
                        CorrelationVerdict::no_match("not evaluated: oracle response did not parse"),
                        None,
                        true,
                    )
                }
            },
            Err(err) => {
                warn!(
                    game_id = %candidate.game_id,
                    "Correlation oracle call failed: {}; storing fallback verdict", err
                );
                (
                    CorrelationVerdict::no_match(format!("not evaluated: oracle call failed: {err}")),
                    None,
                    true,
                )
            }
        };

        let is_match = verdict.is_match;

        if let Err(err) = self
            .games
            .set_correlation(
                &candidate.player_id,
                &candidate.game_id,
                &verdict,
                revised_summary.as_deref(),
            )
            .await
        {
            // Candidate stays pending and the next dispatch retries it
            warn!(game_id = %candidate.game_id, "Failed to persist verdict: {}", err);
            return CandidateResult::PersistFailed;
        }

        if fallback {
            CandidateResult::Fallback
        } else if is_match {
            CandidateResult::Matched
        } else {
            CandidateResult::NotMatched
        }
    }
}

enum CandidateResult {
    Matched,
    NotMatched,
    Fallback,
    PersistFailed,
}

fn build_correlation_prompt(
    candidate: &GameRecord,
    baseline: &[GameRecord],
    profile: Option<&PlayerProfile>,
) -> String {
    let candidate_digest = game_digest(candidate);

    let mut baseline_digest = String::new();
    for game in baseline {
        baseline_digest.push_str(&format!("- {}\n", game_digest(game)));
    }

    let profile_digest = profile.map_or_else(
        || "(no profile synthesized yet)".to_string(),
        |p| {
            format!(
                "strengths: {}\nweaknesses: {}\nblind spots: {}",
                p.strengths, p.weaknesses, p.blind_spots
            )
        },
    );

    format!(
        "You are checking whether a recently analyzed game fits patterns \
         established by a player's baseline games.\n\n\
         CANDIDATE:\n{candidate_digest}\n\n\
         BASELINE GAMES:\n{baseline_digest}\n\
         PLAYER PROFILE:\n{profile_digest}\n\n\
         Respond with ONLY a JSON object with these fields:\n\
         - is_match: boolean, whether the candidate repeats baseline patterns\n\
         - matched_baseline_ids: list of baseline game ids it matches\n\
         - rationale: why it does or does not match\n\
         - shared_themes: themes shared with the matched games\n\
         - revised_summary: if is_match, the candidate's summary rewritten in \
         the context of those patterns; otherwise null\n\
         No additional text or formatting.",
    )
}

fn game_digest(game: &GameRecord) -> String {
    match &game.analysis {
        Some(analysis) => format!(
            "game {id} ({outcome}): {summary} [opening: {opening}; motifs: {motifs}]",
            id = game.game_id,
            outcome = game.outcome.as_str(),
            summary = analysis.short_summary,
            opening = analysis.opening,
            motifs = analysis.motifs.join(", "),
        ),
        None => format!(
            "game {id} ({outcome}): no analysis recorded",
            id = game.game_id,
            outcome = game.outcome.as_str(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CandidateGame, GameAnalysis, GameOutcome};
    use serde_json::json;

    fn analyzed(id: &str) -> GameRecord {
        let candidate = CandidateGame {
            game_id: id.to_string(),
            player_id: "magnus".to_string(),
            outcome: GameOutcome::Loss,
            rating: None,
            played_at: None,
            raw: json!({}),
        };
        GameRecord::from_candidate(candidate)
            .with_analysis(GameAnalysis::degraded(format!("summary {id}")))
    }

    #[test]
    fn test_prompt_contains_candidate_baseline_and_profile() {
        let candidate = analyzed("c1");
        let baseline = vec![analyzed("b1"), analyzed("b2")];
        let mut profile = PlayerProfile::empty("magnus");
        profile.strengths = "attacks".to_string();

        let prompt = build_correlation_prompt(&candidate, &baseline, Some(&profile));
        assert!(prompt.contains("game c1"));
        assert!(prompt.contains("game b1"));
        assert!(prompt.contains("game b2"));
        assert!(prompt.contains("attacks"));
    }

    #[test]
    fn test_prompt_without_profile() {
        let candidate = analyzed("c1");
        let prompt = build_correlation_prompt(&candidate, &[], None);
        assert!(prompt.contains("no profile synthesized yet"));
    }
}
