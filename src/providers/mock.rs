/*!
 * Mock backends for testing.
 *
 * This module provides backends that simulate different behaviors without
 * any network access:
 * - `MockInference::working()` - Answers every stage with a well-formed response
 * - `MockInference::misaligned(n)` - Drops `n` responses from every batch
 * - `MockInference::failing()` - Always fails with an error
 * - `MockMetric::fixed(..)` - Scores originals and post-edits with fixed values
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::ProviderError;
use crate::evaluation::prompts::Prompt;
use crate::inference::{GenerationParams, InferenceBackend};
use crate::metric::MetricBackend;

/// Which stage a prompt belongs to, guessed from its text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Evaluator,
    PostEdit,
    Verifier,
}

impl PromptKind {
    /// Classify a prompt by its layout and wording
    pub fn of(prompt: &Prompt) -> Self {
        let last = prompt.last().map(|m| m.content.as_str()).unwrap_or_default();
        if prompt.first().is_some_and(|m| m.role == "system") {
            PromptKind::Evaluator
        } else if last.contains("Corrected Translation:") {
            PromptKind::PostEdit
        } else {
            PromptKind::Verifier
        }
    }
}

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always answers with the responder
    Working,
    /// Answers but drops the last `drop` responses of each batch
    Misaligned { drop: usize },
    /// Fails every Nth batch
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns empty responses
    Empty,
}

/// Mock inference backend with a pluggable responder
#[derive(Debug, Clone)]
pub struct MockInference {
    /// Behavior mode
    behavior: MockBehavior,
    /// Batch counter for intermittent failures
    request_count: Arc<AtomicUsize>,
    /// Produces the response to one prompt
    responder: fn(&Prompt) -> String,
    /// Every prompt received, in call order
    received: Arc<Mutex<Vec<Prompt>>>,
}

impl MockInference {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            responder: Self::default_responder,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working backend
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a backend that returns too few responses
    pub fn misaligned(drop: usize) -> Self {
        Self::new(MockBehavior::Misaligned { drop })
    }

    /// Create an intermittently failing backend
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing backend
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a backend that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Set a custom responder
    pub fn with_responder(mut self, responder: fn(&Prompt) -> String) -> Self {
        self.responder = responder;
        self
    }

    /// Prompts received so far
    pub fn received(&self) -> Vec<Prompt> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of `generate` calls so far
    pub fn batch_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// One major error, a clean post-edit, and a verifier that always prefers the post-edit
    pub fn default_responder(prompt: &Prompt) -> String {
        let last = prompt.last().map(|m| m.content.as_str()).unwrap_or_default();
        match PromptKind::of(prompt) {
            PromptKind::Evaluator => {
                "Critical:\nno-error\nMajor:\naccuracy/mistranslation - \"word\"\nMinor:\nno-error<|eot_id|>".to_string()
            }
            PromptKind::PostEdit => "Corrected Translation: \"fixed translation\"<|eot_id|>".to_string(),
            PromptKind::Verifier => {
                if last.contains("translation A: \"fixed translation\"") {
                    "A".to_string()
                } else {
                    "B".to_string()
                }
            }
        }
    }
}

#[async_trait]
impl InferenceBackend for MockInference {
    async fn generate(&self, prompts: &[Prompt], _params: &GenerationParams) -> Result<Vec<String>, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut received) = self.received.lock() {
            received.extend(prompts.iter().cloned());
        }

        match self.behavior {
            MockBehavior::Working => Ok(prompts.iter().map(self.responder).collect()),

            MockBehavior::Misaligned { drop } => {
                let keep = prompts.len().saturating_sub(drop);
                Ok(prompts.iter().take(keep).map(self.responder).collect())
            }

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (batch #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(prompts.iter().map(self.responder).collect())
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(vec![String::new(); prompts.len()]),
        }
    }
}

/// Mock metric backend scoring originals and post-edits with fixed values
#[derive(Debug, Clone)]
pub struct MockMetric {
    /// Score for a hypothesis that was not post-edited
    original_score: f64,
    /// Score for every post-edit
    edit_score: f64,
    /// Hypotheses treated as post-edits
    edit_marker: String,
    /// Whether to fail every call
    failing: bool,
}

impl MockMetric {
    /// Scores hypotheses containing `edit_marker` with `edit_score`, others with `original_score`
    pub fn fixed(original_score: f64, edit_score: f64, edit_marker: impl Into<String>) -> Self {
        Self {
            original_score,
            edit_score,
            edit_marker: edit_marker.into(),
            failing: false,
        }
    }

    /// Create a metric backend that always fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::fixed(0.0, 0.0, "")
        }
    }
}

#[async_trait]
impl MetricBackend for MockMetric {
    async fn score(&self, sources: &[String], hypotheses: &[String]) -> Result<Vec<f64>, ProviderError> {
        if self.failing {
            return Err(ProviderError::ConnectionError("Simulated metric server outage".to_string()));
        }
        if sources.len() != hypotheses.len() {
            return Err(ProviderError::RequestFailed("Mismatched metric inputs".to_string()));
        }

        Ok(hypotheses
            .iter()
            .map(|h| {
                if !self.edit_marker.is_empty() && h.contains(&self.edit_marker) {
                    self.edit_score
                } else {
                    self.original_score
                }
            })
            .collect())
    }
}
