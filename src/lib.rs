//! Kibitzer - Asynchronous Game-Review Pipeline
//!
//! Kibitzer ingests a batch of a player's past games, runs an independent
//! multi-step LLM analysis on each game, and progressively derives two
//! cross-game results once enough games finish: a synthesized player
//! profile and a correlation pass linking later games back to a baseline
//! set. The pipeline tolerates partial failure, concurrent completions,
//! and out-of-order arrival; external observers poll the progress store
//! without ever blocking on it.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure business logic and domain models
//! - **Application Layer** (`application`): Pipeline orchestration and the
//!   poller read model
//! - **Service Layer** (`services`): Selection, analysis, trigger
//!   coordination, synthesis, correlation
//! - **Adapters** (`adapters`): SQLite progress store, oracle and provider
//!   HTTP clients, test mocks
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{DispatchSummary, PlayerStatus, ReviewPipeline, StatusReader};
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    CandidateGame, Config, GameAnalysis, GameOutcome, GameRecord, GameState, PipelineConfig,
    PlayerProfile, SelectionQuotas,
};
pub use domain::ports::{
    GameFilter, GameProvider, GameRepository, Oracle, OracleError, ProfileRepository,
    ProviderError,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    select_games, CorrelationStage, GameAnalyzer, ProfileSynthesizer, TriggerCoordinator,
};
