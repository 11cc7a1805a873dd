//! Synthesized player profile.
//!
//! The profile is the aggregate output of the synthesis stage. It does not
//! exist until the synthesis gate first fires, and every re-synthesis fully
//! replaces the stored document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analysis::OracleSynthesis;

/// Aggregate review of one player, recomputed at every synthesis gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_id: String,

    // Qualitative fields, produced by the oracle (or a degraded fallback).
    pub strengths: String,
    pub weaknesses: String,
    pub blind_spots: String,
    pub learning_priorities: Vec<String>,
    pub style_summary: String,
    pub rating_assessment: String,
    pub key_insights: Vec<String>,

    // Quantitative fields, always computed locally from the analyzed games.
    pub games_analyzed: i64,
    pub wins: i64,
    pub losses: i64,
    pub draws: i64,
    pub average_rating: Option<f64>,
    pub rating_range: Option<(i64, i64)>,
    /// Most frequent motifs across analyzed games, descending by count
    pub top_motifs: Vec<(String, i64)>,
    /// Most frequent opening families, descending by count
    pub top_openings: Vec<(String, i64)>,

    /// True when the synthesis oracle output failed to parse and the
    /// qualitative fields hold fallback text
    pub degraded: bool,
    pub last_game_analyzed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl PlayerProfile {
    /// Profile shell with quantitative fields zeroed and qualitative fields
    /// empty. Used as the base for both parsed and degraded synthesis.
    pub fn empty(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            strengths: String::new(),
            weaknesses: String::new(),
            blind_spots: String::new(),
            learning_priorities: Vec::new(),
            style_summary: String::new(),
            rating_assessment: String::new(),
            key_insights: Vec::new(),
            games_analyzed: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            average_rating: None,
            rating_range: None,
            top_motifs: Vec::new(),
            top_openings: Vec::new(),
            degraded: false,
            last_game_analyzed_at: None,
            updated_at: Utc::now(),
        }
    }

    /// Fill the qualitative fields from a parsed oracle synthesis.
    pub fn apply_synthesis(&mut self, synthesis: OracleSynthesis) {
        self.strengths = synthesis.strengths;
        self.weaknesses = synthesis.weaknesses;
        self.blind_spots = synthesis.blind_spots;
        self.learning_priorities = synthesis.learning_priorities;
        self.style_summary = synthesis.style_summary;
        self.rating_assessment = synthesis.rating_assessment;
        self.key_insights = synthesis.key_insights;
        self.degraded = false;
    }

    /// Fill the qualitative fields from raw oracle text that failed to
    /// parse. The quantitative fields are untouched.
    pub fn apply_degraded(&mut self, raw: &str) {
        const LIMIT: usize = 2000;
        let mut text = raw.to_string();
        if text.len() > LIMIT {
            text.truncate(LIMIT);
        }
        self.style_summary = text;
        self.degraded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile_has_no_aggregates() {
        let profile = PlayerProfile::empty("magnus");
        assert_eq!(profile.games_analyzed, 0);
        assert!(profile.average_rating.is_none());
        assert!(profile.top_motifs.is_empty());
        assert!(!profile.degraded);
    }

    #[test]
    fn test_apply_synthesis_fills_qualitative_fields() {
        let mut profile = PlayerProfile::empty("magnus");
        profile.apply_synthesis(OracleSynthesis {
            strengths: "endgame technique".to_string(),
            weaknesses: "time trouble".to_string(),
            blind_spots: "knight forks".to_string(),
            learning_priorities: vec!["calculation".to_string()],
            style_summary: "positional".to_string(),
            rating_assessment: "stable".to_string(),
            key_insights: vec!["trades into winning endgames".to_string()],
        });
        assert_eq!(profile.strengths, "endgame technique");
        assert_eq!(profile.learning_priorities.len(), 1);
        assert!(!profile.degraded);
    }

    #[test]
    fn test_apply_degraded_truncates_and_flags() {
        let mut profile = PlayerProfile::empty("magnus");
        profile.apply_degraded(&"x".repeat(5000));
        assert!(profile.degraded);
        assert!(profile.style_summary.len() <= 2000);
    }
}
