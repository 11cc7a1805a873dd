//! Oracle port: the external inference service.
//!
//! The oracle returns free-form text with no format guarantee; every
//! caller parses and degrades on its own terms.

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by the oracle client.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Oracle server error: {0}")]
    ServerError(String),

    #[error("Oracle overloaded")]
    Overloaded,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout waiting for response")]
    Timeout,

    #[error("Empty response")]
    EmptyResponse,

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl OracleError {
    /// Returns true if this error is transient and should be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OracleError::RateLimitExceeded
                | OracleError::ServerError(_)
                | OracleError::Overloaded
                | OracleError::Network(_)
                | OracleError::Timeout
        )
    }

    /// Map an HTTP status code and response body to an error variant.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            400 => OracleError::InvalidRequest(body),
            401 | 403 => OracleError::AuthenticationFailed(body),
            429 => OracleError::RateLimitExceeded,
            529 => OracleError::Overloaded,
            500..=599 => OracleError::ServerError(body),
            _ => OracleError::Unknown(format!("HTTP {status}: {body}")),
        }
    }
}

/// Port for the external text-generation service.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Submit a prompt and return the raw response text.
    async fn infer(&self, prompt: &str) -> Result<String, OracleError>;
}
