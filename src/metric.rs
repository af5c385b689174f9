/*!
 * Quality-estimation scoring.
 *
 * `MetricBackend` scores (source, hypothesis) pairs with a reference-free
 * metric such as COMET-Kiwi. `HttpMetricScorer` talks to a scoring server
 * that accepts `{"data": [{"src", "mt"}], "batch_size"}` and answers with
 * `{"scores": [..]}`.
 */

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::VerifierConfig;
use crate::errors::ProviderError;
use crate::providers::{RetryPolicy, build_client, post_json_with_retry};

/// Reference-free translation quality scoring
#[async_trait]
pub trait MetricBackend: Send + Sync {
    /// Score each hypothesis against its source, in input order
    async fn score(&self, sources: &[String], hypotheses: &[String]) -> Result<Vec<f64>, ProviderError>;
}

/// One pair in a scoring request
#[derive(Debug, Serialize)]
pub struct MetricSample<'a> {
    pub src: &'a str,
    pub mt: &'a str,
}

/// Scoring request body
#[derive(Debug, Serialize)]
pub struct MetricRequest<'a> {
    pub data: Vec<MetricSample<'a>>,
    pub batch_size: usize,
}

/// Scoring response body
#[derive(Debug, Deserialize)]
pub struct MetricResponse {
    pub scores: Vec<f64>,
}

/// Metric backend over an HTTP scoring server
#[derive(Debug)]
pub struct HttpMetricScorer {
    client: Client,
    endpoint: String,
    batch_size: usize,
    retry: RetryPolicy,
}

impl HttpMetricScorer {
    /// Create a scorer for the given endpoint
    pub fn new(endpoint: impl Into<String>, batch_size: usize, timeout_secs: u64, retry: RetryPolicy) -> Self {
        Self {
            client: build_client(timeout_secs),
            endpoint: endpoint.into(),
            batch_size: batch_size.max(1),
            retry,
        }
    }

    /// Create a scorer from the verifier settings
    pub fn from_config(config: &VerifierConfig, retry: RetryPolicy) -> Self {
        Self::new(config.metric_endpoint.clone(), config.metric_batch_size, 300, retry)
    }

    /// Build the request body for a set of pairs
    pub fn request_body<'a>(&self, sources: &'a [String], hypotheses: &'a [String]) -> MetricRequest<'a> {
        MetricRequest {
            data: sources
                .iter()
                .zip(hypotheses)
                .map(|(src, mt)| MetricSample { src, mt })
                .collect(),
            batch_size: self.batch_size,
        }
    }
}

#[async_trait]
impl MetricBackend for HttpMetricScorer {
    async fn score(&self, sources: &[String], hypotheses: &[String]) -> Result<Vec<f64>, ProviderError> {
        if sources.len() != hypotheses.len() {
            return Err(ProviderError::RequestFailed(format!(
                "Metric input mismatch: {} sources, {} hypotheses",
                sources.len(),
                hypotheses.len()
            )));
        }
        if sources.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Scoring {} pairs at {}", sources.len(), self.endpoint);
        let body = self.request_body(sources, hypotheses);
        let response: MetricResponse =
            post_json_with_retry(&self.client, &self.endpoint, &[], &body, &self.retry, "Metric").await?;

        info!("Scored {} pairs", response.scores.len());
        Ok(response.scores)
    }
}
