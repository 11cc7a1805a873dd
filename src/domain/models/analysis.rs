//! Analysis payloads produced by the oracle.
//!
//! The oracle gives no format guarantee, so everything it returns is
//! modeled as a tagged reading: either the structured payload parsed
//! cleanly, or we degrade to the raw text and conservative defaults.

use serde::{Deserialize, Serialize};

/// Number of secondary tags the analysis prompt asks for.
pub const SECONDARY_TAG_COUNT: usize = 5;

/// Maximum characters of raw oracle text kept when degrading.
const DEGRADED_SUMMARY_LIMIT: usize = 2000;

/// Structured per-game analysis as stored on a `GameRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameAnalysis {
    /// One-to-two sentence summary of the game
    pub short_summary: String,
    /// Longer narrative of the game's course
    pub long_summary: String,
    /// Primary categorical tag (opening family)
    pub opening: String,
    /// Secondary categorical tags (tactical/strategic motifs)
    pub motifs: Vec<String>,
    /// Whether the oracle judged the game representative of the player
    pub representative: bool,
    /// True when the oracle output failed to parse and defaults were used
    pub degraded: bool,
}

impl GameAnalysis {
    /// Fallback analysis built from raw oracle text that failed to parse.
    ///
    /// The raw text becomes the short summary, tags are empty, and the
    /// game is conservatively treated as representative.
    pub fn degraded(raw: impl Into<String>) -> Self {
        let mut raw = raw.into();
        if raw.len() > DEGRADED_SUMMARY_LIMIT {
            raw.truncate(DEGRADED_SUMMARY_LIMIT);
        }
        Self {
            short_summary: raw,
            long_summary: String::new(),
            opening: String::new(),
            motifs: Vec::new(),
            representative: true,
            degraded: true,
        }
    }
}

/// Raw structured response expected from the analysis prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleAnalysis {
    pub short_summary: String,
    #[serde(default)]
    pub long_summary: String,
    #[serde(default)]
    pub opening: String,
    #[serde(default)]
    pub motifs: Vec<String>,
    #[serde(default = "default_representative")]
    pub representative: bool,
}

const fn default_representative() -> bool {
    true
}

/// What came back from the oracle for a single game.
#[derive(Debug, Clone)]
pub enum OracleReading {
    /// Response parsed into the expected structure
    Parsed(OracleAnalysis),
    /// Response did not parse; the raw text is all we have
    Degraded { raw: String },
}

impl OracleReading {
    /// Collapse the reading into a storable `GameAnalysis`.
    ///
    /// Parsed readings are normalized to exactly `SECONDARY_TAG_COUNT`
    /// motifs at most; degraded readings fall back to raw-text defaults.
    pub fn into_analysis(self) -> GameAnalysis {
        match self {
            Self::Parsed(parsed) => {
                let mut motifs = parsed.motifs;
                motifs.truncate(SECONDARY_TAG_COUNT);
                GameAnalysis {
                    short_summary: parsed.short_summary,
                    long_summary: parsed.long_summary,
                    opening: parsed.opening,
                    motifs,
                    representative: parsed.representative,
                    degraded: false,
                }
            }
            Self::Degraded { raw } => GameAnalysis::degraded(raw),
        }
    }
}

/// Correlation verdict stored on a non-baseline `GameRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationVerdict {
    /// Whether the game matches patterns in the baseline set
    pub is_match: bool,
    /// Baseline game ids the oracle linked this game to
    pub matched_baseline_ids: Vec<String>,
    /// Free-text rationale for the verdict
    pub rationale: String,
    /// Themes shared with the matched baseline games
    pub shared_themes: String,
}

impl CorrelationVerdict {
    /// Terminal "no match" verdict, used both for genuine non-matches and
    /// as the deterministic fallback when the oracle call fails.
    pub fn no_match(rationale: impl Into<String>) -> Self {
        Self {
            is_match: false,
            matched_baseline_ids: Vec::new(),
            rationale: rationale.into(),
            shared_themes: String::new(),
        }
    }
}

/// Raw structured response expected from the correlation prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationReading {
    pub is_match: bool,
    #[serde(default)]
    pub matched_baseline_ids: Vec<String>,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub shared_themes: String,
    /// Contextualized rewrite of the candidate's short summary, applied
    /// only when `is_match` is true
    #[serde(default)]
    pub revised_summary: Option<String>,
}

impl CorrelationReading {
    pub fn into_verdict(self) -> CorrelationVerdict {
        CorrelationVerdict {
            is_match: self.is_match,
            matched_baseline_ids: self.matched_baseline_ids,
            rationale: self.rationale,
            shared_themes: self.shared_themes,
        }
    }
}

/// Raw structured response expected from the synthesis prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleSynthesis {
    #[serde(default)]
    pub strengths: String,
    #[serde(default)]
    pub weaknesses: String,
    #[serde(default)]
    pub blind_spots: String,
    #[serde(default)]
    pub learning_priorities: Vec<String>,
    #[serde(default)]
    pub style_summary: String,
    #[serde(default)]
    pub rating_assessment: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_reading_truncates_motifs() {
        let reading = OracleReading::Parsed(OracleAnalysis {
            short_summary: "sharp middlegame".to_string(),
            long_summary: String::new(),
            opening: "Sicilian".to_string(),
            motifs: (0..8).map(|i| format!("motif-{i}")).collect(),
            representative: true,
        });
        let analysis = reading.into_analysis();
        assert_eq!(analysis.motifs.len(), SECONDARY_TAG_COUNT);
        assert!(!analysis.degraded);
    }

    #[test]
    fn test_degraded_reading_keeps_raw_text() {
        let reading = OracleReading::Degraded {
            raw: "not json at all".to_string(),
        };
        let analysis = reading.into_analysis();
        assert_eq!(analysis.short_summary, "not json at all");
        assert!(analysis.motifs.is_empty());
        assert!(analysis.representative);
        assert!(analysis.degraded);
    }

    #[test]
    fn test_degraded_summary_is_bounded() {
        let raw = "x".repeat(10_000);
        let analysis = GameAnalysis::degraded(raw);
        assert!(analysis.short_summary.len() <= 2000);
    }

    #[test]
    fn test_correlation_reading_to_verdict() {
        let reading = CorrelationReading {
            is_match: true,
            matched_baseline_ids: vec!["g1".to_string(), "g4".to_string()],
            rationale: "same endgame collapse".to_string(),
            shared_themes: "rook endgames".to_string(),
            revised_summary: Some("rewritten".to_string()),
        };
        let verdict = reading.into_verdict();
        assert!(verdict.is_match);
        assert_eq!(verdict.matched_baseline_ids.len(), 2);
    }
}
