//! HTTP client for the inference oracle.
//!
//! Speaks the messages API dialect: POST /v1/messages with a model, a
//! token budget, and a single user message; the response text is the
//! concatenation of the returned content blocks.

use std::num::NonZeroU32;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{header, Client as ReqwestClient, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::domain::models::OracleConfig;
use crate::domain::ports::{Oracle, OracleError};

use super::retry::RetryPolicy;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// HTTP client for the oracle with rate limiting and retry.
pub struct OracleClient {
    http_client: ReqwestClient,
    base_url: String,
    model: String,
    max_tokens: u32,
    rate_limiter: DirectRateLimiter,
    retry_policy: RetryPolicy,
}

impl OracleClient {
    /// Build a client from config, reading the API key from the
    /// configured environment variable.
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            OracleError::AuthenticationFailed(format!("{} is not set", config.api_key_env))
        })?;
        Self::new(config, &api_key)
    }

    pub fn new(config: &OracleConfig, api_key: &str) -> Result<Self, OracleError> {
        // Scrub the API key from logs
        let api_key_scrubbed = if api_key.len() > 8 {
            format!("{}...[REDACTED]", &api_key[..8])
        } else {
            "[REDACTED]".to_string()
        };

        info!(
            "Initializing oracle client: base_url={}, model={}, rate_limit={} rps, api_key={}",
            config.base_url, config.model, config.rate_limit_rps, api_key_scrubbed
        );

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "x-api-key",
            header::HeaderValue::from_str(api_key)
                .map_err(|e| OracleError::InvalidRequest(format!("Invalid API key: {e}")))?,
        );
        headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static("2023-06-01"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http_client = ReqwestClient::builder()
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(config.timeout_secs))
            .tcp_nodelay(true)
            .default_headers(headers)
            .build()
            .map_err(|e| OracleError::Network(e.to_string()))?;

        let rps = NonZeroU32::new(config.rate_limit_rps).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));
        let retry_policy = RetryPolicy::new(
            config.max_retries,
            config.initial_backoff_ms,
            config.max_backoff_ms,
        );

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            rate_limiter,
            retry_policy,
        })
    }

    async fn execute_request(&self, request: &MessageRequest) -> Result<MessageResponse, OracleError> {
        let url = format!("{}/v1/messages", self.base_url);

        debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        self.handle_response(response).await
    }

    async fn handle_response(&self, response: Response) -> Result<MessageResponse, OracleError> {
        let status = response.status();

        debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(self.handle_error_response(status, response).await);
        }

        response.json().await.map_err(map_reqwest_error)
    }

    async fn handle_error_response(&self, status: StatusCode, response: Response) -> OracleError {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());

        warn!("Oracle API error ({}): {}", status, body);

        OracleError::from_status(status, body)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> OracleError {
    if err.is_timeout() {
        OracleError::Timeout
    } else {
        OracleError::Network(err.to_string())
    }
}

#[async_trait]
impl Oracle for OracleClient {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn infer(&self, prompt: &str) -> Result<String, OracleError> {
        // Acquire a rate limit slot before every attempt batch
        self.rate_limiter.until_ready().await;

        let request = MessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .retry_policy
            .execute(|| async { self.execute_request(&request).await })
            .await?;

        info!(
            "Oracle request succeeded: input_tokens={}, output_tokens={}",
            response.usage.input_tokens, response.usage.output_tokens
        );

        let text = response.into_text();
        if text.is_empty() {
            return Err(OracleError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Wire request for the messages endpoint.
#[derive(Debug, Clone, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Wire response from the messages endpoint.
#[derive(Debug, Clone, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Usage,
}

impl MessageResponse {
    /// Concatenate all text content blocks.
    fn into_text(self) -> String {
        self.content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}
