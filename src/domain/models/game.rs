//! Game record domain model.
//!
//! A `GameRecord` is one unit of work in the review pipeline: a past game
//! of the player under review, carried from selection through analysis,
//! baseline classification, and (for non-baseline games) correlation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analysis::{CorrelationVerdict, GameAnalysis};

/// Outcome of a game from the reviewed player's perspective.
///
/// Also the category used for balanced sampling in the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    Win,
    Loss,
    Draw,
}

impl GameOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Draw => "draw",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "win" | "won" => Some(Self::Win),
            "loss" | "lost" => Some(Self::Loss),
            "draw" | "drawn" => Some(Self::Draw),
            _ => None,
        }
    }
}

/// Position of a game in the review pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    /// Picked by the selector, not yet processed
    Selected,
    /// Transcript fetched, analysis pending
    DetailFetched,
    /// Oracle analysis persisted
    Analyzed,
    /// Baseline membership decided
    Classified,
}

impl Default for GameState {
    fn default() -> Self {
        Self::Selected
    }
}

impl GameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Selected => "selected",
            Self::DetailFetched => "detail_fetched",
            Self::Analyzed => "analyzed",
            Self::Classified => "classified",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "selected" => Some(Self::Selected),
            "detail_fetched" => Some(Self::DetailFetched),
            "analyzed" => Some(Self::Analyzed),
            "classified" => Some(Self::Classified),
            _ => None,
        }
    }

    /// Whether analysis has been persisted for this state.
    ///
    /// `Classified` is strictly later than `Analyzed`, so both count as
    /// analyzed for gate arithmetic.
    pub fn is_analyzed(&self) -> bool {
        matches!(self, Self::Analyzed | Self::Classified)
    }
}

/// A candidate game as returned by the provider, before selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateGame {
    /// Stable external identifier, unique per player
    pub game_id: String,
    /// Player under review
    pub player_id: String,
    /// Outcome from the player's perspective
    pub outcome: GameOutcome,
    /// Player's rating in this game, if the provider reports one
    pub rating: Option<i64>,
    /// When the game was played
    pub played_at: Option<DateTime<Utc>>,
    /// Opaque provider payload, carried through unmodified
    pub raw: serde_json::Value,
}

/// One unit of work in the review pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: String,
    pub player_id: String,
    pub outcome: GameOutcome,
    pub rating: Option<i64>,
    pub played_at: Option<DateTime<Utc>>,
    /// Opaque provider payload
    pub raw: serde_json::Value,
    pub state: GameState,
    /// True iff this game was among the first K to reach `Analyzed` for
    /// its player. Set once, immutable thereafter.
    pub is_baseline: bool,
    /// Oracle analysis, present from `Analyzed` onward
    pub analysis: Option<GameAnalysis>,
    /// Correlation verdict, present only for non-baseline games once the
    /// correlation stage has processed them
    pub correlation: Option<CorrelationVerdict>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl GameRecord {
    /// Create a freshly selected record from a provider candidate.
    pub fn from_candidate(candidate: CandidateGame) -> Self {
        let now = Utc::now();
        Self {
            game_id: candidate.game_id,
            player_id: candidate.player_id,
            outcome: candidate.outcome,
            rating: candidate.rating,
            played_at: candidate.played_at,
            raw: candidate.raw,
            state: GameState::Selected,
            is_baseline: false,
            analysis: None,
            correlation: None,
            created_at: now,
            updated_at: now,
            analyzed_at: None,
        }
    }

    /// Attach an analysis and advance to `Analyzed`.
    pub fn with_analysis(mut self, analysis: GameAnalysis) -> Self {
        self.analysis = Some(analysis);
        self.state = GameState::Analyzed;
        let now = Utc::now();
        self.analyzed_at = Some(now);
        self.updated_at = now;
        self
    }

    /// Whether analysis has been persisted.
    pub fn is_analyzed(&self) -> bool {
        self.state.is_analyzed()
    }

    /// Whether this game still needs a correlation verdict.
    pub fn needs_correlation(&self) -> bool {
        self.is_analyzed() && !self.is_baseline && self.correlation.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(id: &str, outcome: GameOutcome) -> CandidateGame {
        CandidateGame {
            game_id: id.to_string(),
            player_id: "magnus".to_string(),
            outcome,
            rating: Some(2850),
            played_at: None,
            raw: json!({"id": id}),
        }
    }

    #[test]
    fn test_outcome_round_trip() {
        for outcome in [GameOutcome::Win, GameOutcome::Loss, GameOutcome::Draw] {
            assert_eq!(GameOutcome::from_str(outcome.as_str()), Some(outcome));
        }
        assert_eq!(GameOutcome::from_str("stalemate"), None);
    }

    #[test]
    fn test_state_is_analyzed() {
        assert!(!GameState::Selected.is_analyzed());
        assert!(!GameState::DetailFetched.is_analyzed());
        assert!(GameState::Analyzed.is_analyzed());
        assert!(GameState::Classified.is_analyzed());
    }

    #[test]
    fn test_from_candidate_starts_selected() {
        let record = GameRecord::from_candidate(candidate("g1", GameOutcome::Win));
        assert_eq!(record.state, GameState::Selected);
        assert!(!record.is_baseline);
        assert!(record.analysis.is_none());
        assert!(record.analyzed_at.is_none());
    }

    #[test]
    fn test_with_analysis_advances_state() {
        let record = GameRecord::from_candidate(candidate("g1", GameOutcome::Loss))
            .with_analysis(GameAnalysis::degraded("raw oracle text"));
        assert_eq!(record.state, GameState::Analyzed);
        assert!(record.analyzed_at.is_some());
        assert!(record.is_analyzed());
    }

    #[test]
    fn test_needs_correlation() {
        let mut record = GameRecord::from_candidate(candidate("g1", GameOutcome::Win))
            .with_analysis(GameAnalysis::degraded("text"));
        assert!(record.needs_correlation());

        record.is_baseline = true;
        assert!(!record.needs_correlation());

        record.is_baseline = false;
        record.correlation = Some(CorrelationVerdict::no_match("done"));
        assert!(!record.needs_correlation());
    }
}
