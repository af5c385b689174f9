/*!
 * Provider implementations for the chat-completion services.
 *
 * This module contains client implementations for various LLM providers:
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI API and OpenAI-compatible servers (LM Studio, vLLM)
 * - Anthropic: Anthropic API integration
 */

use async_trait::async_trait;
use log::{error, warn};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::time::Duration;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the inference backend.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Retry and pacing settings shared by the HTTP clients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub backoff_base_ms: u64,
    /// Optional rate limit in requests per minute
    pub rate_limit: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1000,
            rate_limit: None,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << exponent))
    }

    /// Minimum spacing between requests implied by the rate limit
    pub fn pacing(&self) -> Option<Duration> {
        self.rate_limit
            .filter(|limit| *limit > 0)
            .map(|limit| Duration::from_millis(60_000 / limit as u64))
    }
}

/// Build an HTTP client with the given request timeout
pub(crate) fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .unwrap_or_default()
}

/// Classify a non-success HTTP status
fn status_error(status: StatusCode, body: String) -> ProviderError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(body),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message: body,
        },
    }
}

/// Whether an error is worth another attempt
fn is_retryable(err: &ProviderError) -> bool {
    match err {
        ProviderError::ConnectionError(_) | ProviderError::RequestFailed(_) | ProviderError::RateLimitExceeded(_) => true,
        ProviderError::ApiError { status_code, .. } => *status_code >= 500,
        ProviderError::ParseError(_) | ProviderError::AuthenticationError(_) => false,
    }
}

/// POST a JSON body and decode the JSON answer, retrying transient failures
pub(crate) async fn post_json_with_retry<B, T>(
    client: &Client,
    url: &str,
    headers: &[(&str, &str)],
    body: &B,
    policy: &RetryPolicy,
    service: &str,
) -> Result<T, ProviderError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let text = post_text_with_retry(client, url, headers, body, policy, service).await?;
    serde_json::from_str::<T>(&text).map_err(|e| {
        error!("Failed to parse {} response: {}", service, e);
        ProviderError::ParseError(format!("{} response: {}", service, e))
    })
}

/// POST a JSON body and return the raw answer text, retrying transient failures
pub(crate) async fn post_text_with_retry<B>(
    client: &Client,
    url: &str,
    headers: &[(&str, &str)],
    body: &B,
    policy: &RetryPolicy,
    service: &str,
) -> Result<String, ProviderError>
where
    B: Serialize + ?Sized,
{
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            if let Some(pacing) = policy.pacing() {
                tokio::time::sleep(pacing).await;
            }
        }

        let result = send_once(client, url, headers, body).await;
        let err = match result {
            Ok(text) => return Ok(text),
            Err(err) => err,
        };

        attempt += 1;
        if !is_retryable(&err) || attempt > policy.max_retries {
            error!("{} request failed: {}", service, err);
            return Err(err);
        }

        warn!(
            "{} request failed: {} - attempt {}/{}",
            service,
            err,
            attempt,
            policy.max_retries + 1
        );
        tokio::time::sleep(policy.backoff(attempt)).await;
    }
}

async fn send_once<B>(client: &Client, url: &str, headers: &[(&str, &str)], body: &B) -> Result<String, ProviderError>
where
    B: Serialize + ?Sized,
{
    let mut request = client.post(url).json(body);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let response = request.send().await.map_err(|e| {
        if e.is_connect() || e.is_timeout() {
            ProviderError::ConnectionError(e.to_string())
        } else {
            ProviderError::RequestFailed(e.to_string())
        }
    })?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ProviderError::RequestFailed(format!("Failed to read response body: {}", e)))?;

    if status.is_success() {
        Ok(text)
    } else {
        Err(status_error(status, text))
    }
}

pub mod ollama;
pub mod openai;
pub mod anthropic;
pub mod mock;
