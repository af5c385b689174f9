/*!
 * Batched text generation.
 *
 * `InferenceBackend` is the seam between the evaluation pipeline and the
 * model: a batch of prompts goes in, the same number of completions comes
 * out in the same order. `LlmInference` implements it over one of the
 * configured chat providers, dispatching prompts concurrently.
 */

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::app_config::{InferenceConfig, InferenceProvider, ModuleConfig, VerifierConfig};
use crate::errors::ProviderError;
use crate::evaluation::prompts::Prompt;
use crate::providers::Provider;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::ollama::{ChatRequest, Ollama};
use crate::providers::openai::{OpenAI, OpenAIRequest};

/// Decoding settings for one batch
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Maximum number of generated tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Stop sequences
    pub stop: Vec<String>,
}

impl GenerationParams {
    /// Params of a pipeline stage
    pub fn from_module(module: &ModuleConfig, stop: Option<String>) -> Self {
        Self {
            max_tokens: module.max_tokens,
            temperature: module.temperature,
            stop: stop.into_iter().collect(),
        }
    }

    /// Params of the LLM verifier
    pub fn from_verifier(verifier: &VerifierConfig, stop: Option<String>) -> Self {
        Self {
            max_tokens: verifier.max_tokens,
            temperature: verifier.temperature,
            stop: stop.into_iter().collect(),
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::from_module(&ModuleConfig::default(), None)
    }
}

/// Text generation over a batch of prompts
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Generate one completion per prompt, in prompt order
    async fn generate(&self, prompts: &[Prompt], params: &GenerationParams) -> Result<Vec<String>, ProviderError>;
}

/// Configured chat client
#[derive(Debug)]
enum ProviderClient {
    /// Ollama LLM service
    Ollama {
        /// Client instance
        client: Ollama,
    },

    /// OpenAI API or a compatible server
    OpenAI {
        /// Client instance
        client: OpenAI,
    },

    /// Anthropic API service
    Anthropic {
        /// Client instance
        client: Anthropic,
    },
}

/// Inference backend over a chat-completion provider
#[derive(Debug)]
pub struct LlmInference {
    /// Provider implementation
    provider: ProviderClient,
    /// Model name sent with every request
    model: String,
    /// Maximum number of in-flight requests
    max_concurrent_requests: usize,
    /// Whether to draw a progress bar
    show_progress: bool,
}

impl LlmInference {
    /// Create a backend for the active provider of the configuration
    pub fn from_config(config: &InferenceConfig) -> Result<Self, ProviderError> {
        let provider_config = config.get_active_provider_config().ok_or_else(|| {
            ProviderError::RequestFailed(format!("No configuration found for provider {}", config.provider))
        })?;

        let model = config.get_model();
        let retry = config.retry_policy();
        let timeout_secs = provider_config.timeout_secs;
        let endpoint = provider_config.endpoint.clone();

        let provider = match config.provider {
            InferenceProvider::Ollama => ProviderClient::Ollama {
                client: Ollama::new_with_config(endpoint, timeout_secs, retry),
            },
            InferenceProvider::OpenAI => ProviderClient::OpenAI {
                client: OpenAI::new_with_config(provider_config.api_key.clone(), endpoint, model.clone(), timeout_secs, retry),
            },
            InferenceProvider::LMStudio => {
                // LM Studio accepts any key
                let api_key = if provider_config.api_key.is_empty() {
                    "lm-studio".to_string()
                } else {
                    provider_config.api_key.clone()
                };
                ProviderClient::OpenAI {
                    client: OpenAI::new_with_config(api_key, endpoint, model.clone(), timeout_secs, retry),
                }
            }
            InferenceProvider::Anthropic => ProviderClient::Anthropic {
                client: Anthropic::new_with_config(provider_config.api_key.clone(), endpoint, model.clone(), timeout_secs, retry),
            },
        };

        Ok(Self {
            provider,
            model,
            max_concurrent_requests: config.optimal_concurrent_requests(),
            show_progress: true,
        })
    }

    /// Disable or enable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Model used for generation
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Test the connection to the provider
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        match &self.provider {
            ProviderClient::Ollama { client } => client.test_connection().await,
            ProviderClient::OpenAI { client } => client.test_connection().await,
            ProviderClient::Anthropic { client } => client.test_connection().await,
        }
    }

    /// Generate one completion
    async fn complete_one(&self, prompt: &Prompt, params: &GenerationParams) -> Result<String, ProviderError> {
        match &self.provider {
            ProviderClient::Ollama { client } => {
                let request = ChatRequest::new(self.model.clone(), prompt.clone())
                    .temperature(params.temperature)
                    .max_tokens(params.max_tokens)
                    .stop(params.stop.clone());
                let response = client.complete(request).await?;
                Ok(Ollama::extract_text(&response))
            }
            ProviderClient::OpenAI { client } => {
                let request = OpenAIRequest::new(self.model.clone(), prompt.clone())
                    .temperature(params.temperature)
                    .max_tokens(params.max_tokens)
                    .stop(params.stop.clone());
                let response = client.complete(request).await?;
                Ok(OpenAI::extract_text(&response))
            }
            ProviderClient::Anthropic { client } => {
                let request = AnthropicRequest::from_prompt(self.model.clone(), prompt, params.max_tokens)
                    .temperature(params.temperature)
                    .stop(params.stop.clone());
                let response = client.complete(request).await?;
                Ok(Anthropic::extract_text(&response))
            }
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::with_draw_target(Some(len as u64), ProgressDrawTarget::hidden());
        }

        let progress_bar = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} prompts ({percent}%) {msg} {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }
}

#[async_trait]
impl InferenceBackend for LlmInference {
    async fn generate(&self, prompts: &[Prompt], params: &GenerationParams) -> Result<Vec<String>, ProviderError> {
        if prompts.is_empty() {
            return Ok(Vec::new());
        }

        let start_time = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_requests));
        let progress_bar = self.progress_bar(prompts.len());
        progress_bar.set_message("Generating");

        let requests: Vec<_> = prompts
            .iter()
            .enumerate()
            .map(|(index, prompt)| {
                let semaphore = semaphore.clone();
                let progress_bar = progress_bar.clone();
                async move {
                    let result = match semaphore.acquire().await {
                        Ok(_permit) => self.complete_one(prompt, params).await,
                        Err(e) => Err(ProviderError::RequestFailed(format!("Request limiter closed: {}", e))),
                    };
                    progress_bar.inc(1);
                    (index, result)
                }
            })
            .collect();

        let mut results = stream::iter(requests)
            .buffer_unordered(self.max_concurrent_requests)
            .collect::<Vec<_>>()
            .await;

        progress_bar.finish_and_clear();

        // Completion order is arbitrary
        results.sort_by_key(|(index, _)| *index);
        let responses = results
            .into_iter()
            .map(|(_, result)| result)
            .collect::<Result<Vec<String>, ProviderError>>()?;

        info!(
            "Generated {} responses with {} in {:.1}s",
            responses.len(),
            self.model,
            start_time.elapsed().as_secs_f64()
        );
        debug!("Average response length: {} chars", responses.iter().map(String::len).sum::<usize>() / responses.len());

        Ok(responses)
    }
}
