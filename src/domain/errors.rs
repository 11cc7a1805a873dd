//! Domain errors for the Kibitzer review pipeline.

use thiserror::Error;

use crate::domain::ports::{OracleError, ProviderError};

/// Domain-level errors that can occur in the review pipeline.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Game not found: {player_id}/{game_id}")]
    GameNotFound { player_id: String, game_id: String },

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Provider error: {0}")]
    ProviderError(#[from] ProviderError),

    #[error("Oracle error: {0}")]
    OracleError(#[from] OracleError),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
