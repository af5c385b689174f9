/*!
 * Error types for the mqm_ape application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Pipeline stage that consumes a per-annotation response list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Error identification responses, one per sample
    Evaluator,
    /// Post-edit responses, one per annotation
    PostEdit,
    /// Pairwise verdicts, one or two per annotation
    Verifier,
    /// Quality-estimation scores
    Metric,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Evaluator => "evaluator",
            Stage::PostEdit => "post-edit",
            Stage::Verifier => "verifier",
            Stage::Metric => "metric",
        };
        write!(f, "{}", name)
    }
}

/// Errors that abort an evaluation batch
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A response list does not line up with the annotations it belongs to
    #[error("Alignment error in {stage} stage: expected {expected} responses, got {actual}")]
    Alignment {
        /// Stage that detected the mismatch
        stage: Stage,
        /// Number of entries the annotations call for
        expected: usize,
        /// Number of entries actually supplied
        actual: usize,
    },

    /// Source and target inputs differ in length
    #[error("Input mismatch: {sources} source segments but {targets} target segments")]
    InputMismatch {
        sources: usize,
        targets: usize,
    },

    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the quality-estimation backend
    #[error("Metric backend error: {0}")]
    Metric(String),
}

impl PipelineError {
    /// Build an alignment error for the given stage
    pub fn alignment(stage: Stage, expected: usize, actual: usize) -> Self {
        Self::Alignment { stage, expected, actual }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the evaluation pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::Config(error.to_string())
    }
}
