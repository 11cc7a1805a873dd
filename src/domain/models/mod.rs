pub mod analysis;
pub mod config;
pub mod game;
pub mod profile;

pub use analysis::{
    CorrelationReading, CorrelationVerdict, GameAnalysis, OracleAnalysis, OracleReading,
    OracleSynthesis, SECONDARY_TAG_COUNT,
};
pub use config::{
    Config, DatabaseConfig, LoggingConfig, OracleConfig, PipelineConfig, ProviderConfig,
    SelectionQuotas,
};
pub use game::{CandidateGame, GameOutcome, GameRecord, GameState};
pub use profile::PlayerProfile;
