use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid rate limit: {0}. Must be at least 1 request per second")]
    InvalidRateLimit(u32),

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid target: {0}. Must be at least 1")]
    InvalidTarget(usize),

    #[error("Invalid quotas: they sum to {0}, which exceeds the target {1}")]
    QuotasExceedTarget(usize, usize),

    #[error("Invalid baseline_size: {0}. Must be at least 1")]
    InvalidBaselineSize(usize),

    #[error("Invalid synthesis_interval: {0}. Must be at least 1")]
    InvalidSynthesisInterval(usize),

    #[error("Invalid verify_attempts: {0}. Must be at least 1")]
    InvalidVerifyAttempts(u32),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .kibitzer/config.yaml (project config)
    /// 3. .kibitzer/local.yaml (project local overrides, optional)
    /// 4. Environment variables (KIBITZER_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".kibitzer/config.yaml"))
            .merge(Yaml::file(".kibitzer/local.yaml"))
            .merge(Env::prefixed("KIBITZER_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.oracle.rate_limit_rps == 0 {
            return Err(ConfigError::InvalidRateLimit(config.oracle.rate_limit_rps));
        }
        if config.oracle.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.oracle.max_retries));
        }
        if config.oracle.initial_backoff_ms >= config.oracle.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.oracle.initial_backoff_ms,
                config.oracle.max_backoff_ms,
            ));
        }

        if config.pipeline.target == 0 {
            return Err(ConfigError::InvalidTarget(config.pipeline.target));
        }
        if config.pipeline.quotas.total() > config.pipeline.target {
            return Err(ConfigError::QuotasExceedTarget(
                config.pipeline.quotas.total(),
                config.pipeline.target,
            ));
        }
        if config.pipeline.baseline_size == 0 {
            return Err(ConfigError::InvalidBaselineSize(config.pipeline.baseline_size));
        }
        if config.pipeline.synthesis_interval == 0 {
            return Err(ConfigError::InvalidSynthesisInterval(
                config.pipeline.synthesis_interval,
            ));
        }
        if config.pipeline.verify_attempts == 0 {
            return Err(ConfigError::InvalidVerifyAttempts(
                config.pipeline.verify_attempts,
            ));
        }

        Ok(())
    }
}
