use serde::{Deserialize, Serialize};

/// Main configuration structure for Kibitzer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Oracle (LLM inference API) configuration
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Game provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Review pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            oracle: OracleConfig::default(),
            provider: ProviderConfig::default(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".kibitzer/kibitzer.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Oracle API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OracleConfig {
    /// Base URL for the inference API
    #[serde(default = "default_oracle_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier sent with every request
    #[serde(default = "default_oracle_model")]
    pub model: String,

    /// Maximum tokens per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request rate limit in requests per second
    #[serde(default = "default_rate_limit_rps")]
    pub rate_limit_rps: u32,

    /// Maximum retry attempts for transient errors
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial retry backoff in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum retry backoff in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_oracle_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_api_key_env() -> String {
    "KIBITZER_ORACLE_API_KEY".to_string()
}

fn default_oracle_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

const fn default_max_tokens() -> u32 {
    4096
}

const fn default_rate_limit_rps() -> u32 {
    5
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    60_000
}

const fn default_timeout_secs() -> u64 {
    300
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_oracle_base_url(),
            api_key_env: default_api_key_env(),
            model: default_oracle_model(),
            max_tokens: default_max_tokens(),
            rate_limit_rps: default_rate_limit_rps(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Game provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProviderConfig {
    /// Base URL for the game source API
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,

    /// Maximum elapsed retry time for transient fetch errors, in seconds
    #[serde(default = "default_provider_retry_secs")]
    pub max_retry_secs: u64,

    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider_base_url() -> String {
    "https://api.chess.example.com".to_string()
}

const fn default_provider_retry_secs() -> u64 {
    120
}

const fn default_provider_timeout_secs() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            max_retry_secs: default_provider_retry_secs(),
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

/// Per-outcome selection quotas for the balanced sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SelectionQuotas {
    #[serde(default = "default_win_quota")]
    pub win: usize,
    #[serde(default = "default_loss_quota")]
    pub loss: usize,
    #[serde(default = "default_draw_quota")]
    pub draw: usize,
}

const fn default_win_quota() -> usize {
    10
}

const fn default_loss_quota() -> usize {
    10
}

const fn default_draw_quota() -> usize {
    5
}

impl SelectionQuotas {
    pub const fn total(&self) -> usize {
        self.win + self.loss + self.draw
    }
}

impl Default for SelectionQuotas {
    fn default() -> Self {
        Self {
            win: default_win_quota(),
            loss: default_loss_quota(),
            draw: default_draw_quota(),
        }
    }
}

/// Review pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Target number of games to select per review run
    #[serde(default = "default_target")]
    pub target: usize,

    /// Per-outcome selection quotas
    #[serde(default)]
    pub quotas: SelectionQuotas,

    /// Baseline set size K: the first K games to finish analysis anchor
    /// the correlation stage
    #[serde(default = "default_baseline_size")]
    pub baseline_size: usize,

    /// Synthesis fires whenever the analyzed count reaches a positive
    /// multiple of this interval
    #[serde(default = "default_synthesis_interval")]
    pub synthesis_interval: usize,

    /// Attempts the correlation stage waits for the baseline count to
    /// become visible before giving up
    #[serde(default = "default_verify_attempts")]
    pub verify_attempts: u32,

    /// Delay between correlation verify attempts, in milliseconds
    #[serde(default = "default_verify_delay_ms")]
    pub verify_delay_ms: u64,
}

const fn default_target() -> usize {
    25
}

const fn default_baseline_size() -> usize {
    10
}

const fn default_synthesis_interval() -> usize {
    3
}

const fn default_verify_attempts() -> u32 {
    5
}

const fn default_verify_delay_ms() -> u64 {
    30_000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            quotas: SelectionQuotas::default(),
            baseline_size: default_baseline_size(),
            synthesis_interval: default_synthesis_interval(),
            verify_attempts: default_verify_attempts(),
            verify_delay_ms: default_verify_delay_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for rolling file output; stdout-only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pipeline.target, 25);
        assert_eq!(config.pipeline.baseline_size, 10);
        assert_eq!(config.pipeline.synthesis_interval, 3);
        assert_eq!(config.pipeline.quotas.total(), 25);
        assert_eq!(config.database.path, ".kibitzer/kibitzer.db");
    }

    #[test]
    fn test_quota_total() {
        let quotas = SelectionQuotas { win: 3, loss: 2, draw: 1 };
        assert_eq!(quotas.total(), 6);
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = r"
pipeline:
  target: 12
  baseline_size: 4
  quotas:
    win: 5
    loss: 5
    draw: 2
oracle:
  rate_limit_rps: 2
";
        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");
        assert_eq!(config.pipeline.target, 12);
        assert_eq!(config.pipeline.baseline_size, 4);
        assert_eq!(config.pipeline.quotas.draw, 2);
        assert_eq!(config.oracle.rate_limit_rps, 2);
        // Untouched sections keep their defaults
        assert_eq!(config.pipeline.synthesis_interval, 3);
    }
}
