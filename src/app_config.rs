use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use url::Url;

use crate::providers::RetryPolicy;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Inference provider settings
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Generation settings of the error-identification stage
    #[serde(default)]
    pub evaluator: ModuleConfig,

    /// Generation settings of the post-edit stage
    #[serde(default)]
    pub ape: ModuleConfig,

    /// Verification settings
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Inference provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InferenceProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: OpenAI or any OpenAI-compatible server (vLLM)
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl InferenceProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    /// Whether the provider refuses requests without an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI | Self::Anthropic)
    }
}

impl std::fmt::Display for InferenceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for InferenceProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "vllm" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Max concurrent requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Rate limit (requests per minute)
    #[serde(default)]
    pub rate_limit: Option<u32>,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: InferenceProvider) -> Self {
        let (model, endpoint, rate_limit) = match provider_type {
            InferenceProvider::Ollama => ("llama3.1:8b", "http://localhost:11434", None),
            InferenceProvider::OpenAI => ("gpt-4o-mini", "https://api.openai.com/v1", Some(60)),
            // Anthropic allows 50 requests per minute on the standard tier
            InferenceProvider::Anthropic => ("claude-3-5-haiku-latest", "https://api.anthropic.com", Some(45)),
            InferenceProvider::LMStudio => ("local-model", "http://localhost:1234/v1", None),
        };

        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: model.to_string(),
            api_key: String::new(),
            endpoint: endpoint.to_string(),
            concurrent_requests: default_concurrent_requests(),
            timeout_secs: default_timeout_secs(),
            rate_limit,
        }
    }
}

/// Inference configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InferenceConfig {
    /// Provider to use
    #[serde(default)]
    pub provider: InferenceProvider,

    /// Available providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Settings shared by all providers
    #[serde(default)]
    pub common: InferenceCommonConfig,
}

/// Settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InferenceCommonConfig {
    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// End-of-turn sentinel; responses are cut at its first occurrence
    #[serde(default = "default_stop_sequence")]
    pub stop_sequence: String,
}

impl Default for InferenceCommonConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            stop_sequence: default_stop_sequence(),
        }
    }
}

/// Generation settings of one model-backed stage
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModuleConfig {
    /// Maximum number of generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (0.0 to 2.0)
    #[serde(default)]
    pub temperature: f32,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: 0.0,
        }
    }
}

/// Verification settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VerifierConfig {
    /// Maximum number of generated tokens per comparison
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (0.0 to 2.0)
    #[serde(default)]
    pub temperature: f32,

    /// Ask every comparison a second time with the options swapped
    #[serde(default = "default_true")]
    pub use_twice_verify: bool,

    /// Use the quality-estimation metric instead of the LLM
    #[serde(default)]
    pub use_metric: bool,

    /// Scoring endpoint of the quality-estimation server
    #[serde(default = "default_metric_endpoint")]
    pub metric_endpoint: String,

    /// Minimum score gap for the metric to pick a winner
    #[serde(default = "default_metric_threshold")]
    pub metric_threshold: f64,

    /// Pairs per metric request
    #[serde(default = "default_metric_batch_size")]
    pub metric_batch_size: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            use_twice_verify: true,
            use_metric: false,
            metric_endpoint: default_metric_endpoint(),
            metric_threshold: default_metric_threshold(),
            metric_batch_size: default_metric_batch_size(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // doubled on each retry
}

fn default_stop_sequence() -> String {
    "<|eot_id|>".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_true() -> bool {
    true
}

fn default_metric_endpoint() -> String {
    "http://localhost:8080/score".to_string()
}

fn default_metric_threshold() -> f64 {
    0.03
}

fn default_metric_batch_size() -> usize {
    8
}

impl Config {
    /// Load the configuration, writing a default one when the file does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let file = File::open(path).with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            let config_json =
                serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;
            std::fs::write(path, config_json)
                .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
            Ok(config)
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let provider = self.inference.provider;
        let provider_config = self
            .inference
            .get_active_provider_config()
            .ok_or_else(|| anyhow!("No configuration found for provider {}", provider))?;

        if provider.requires_api_key() && provider_config.api_key.is_empty() {
            return Err(anyhow!("API key is required for {} provider", provider.display_name()));
        }

        if provider_config.concurrent_requests == 0 {
            return Err(anyhow!("concurrent_requests must be at least 1"));
        }

        if !provider_config.endpoint.is_empty() {
            Url::parse(&provider_config.endpoint)
                .with_context(|| format!("Invalid endpoint URL: {}", provider_config.endpoint))?;
        }

        for (name, max_tokens, temperature) in [
            ("evaluator", self.evaluator.max_tokens, self.evaluator.temperature),
            ("ape", self.ape.max_tokens, self.ape.temperature),
            ("verifier", self.verifier.max_tokens, self.verifier.temperature),
        ] {
            if max_tokens == 0 {
                return Err(anyhow!("{}.max_tokens must be at least 1", name));
            }
            if !(0.0..=2.0).contains(&temperature) {
                return Err(anyhow!("{}.temperature must be between 0.0 and 2.0, got {}", name, temperature));
            }
        }

        let threshold = self.verifier.metric_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(anyhow!("verifier.metric_threshold must be a non-negative number, got {}", threshold));
        }

        if self.verifier.use_metric {
            if self.verifier.metric_endpoint.trim().is_empty() {
                return Err(anyhow!("verifier.metric_endpoint is required when the metric verifier is used"));
            }
            Url::parse(&self.verifier.metric_endpoint)
                .with_context(|| format!("Invalid metric endpoint URL: {}", self.verifier.metric_endpoint))?;
            if self.verifier.metric_batch_size == 0 {
                return Err(anyhow!("verifier.metric_batch_size must be at least 1"));
            }
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            inference: InferenceConfig::default(),
            evaluator: ModuleConfig::default(),
            ape: ModuleConfig::default(),
            verifier: VerifierConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl InferenceConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &InferenceProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter().find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration
    pub fn get_active_provider_config_mut(&mut self) -> Option<&mut ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers.iter_mut().find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.model.is_empty() => provider_config.model.clone(),
            _ => ProviderConfig::new(self.provider).model,
        }
    }

    /// Get the concurrency limit for the active provider
    pub fn optimal_concurrent_requests(&self) -> usize {
        self.get_active_provider_config()
            .map(|p| p.concurrent_requests)
            .unwrap_or_else(default_concurrent_requests)
            .max(1)
    }

    /// Retry settings for the active provider
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.common.retry_count,
            backoff_base_ms: self.common.retry_backoff_ms,
            rate_limit: self.get_active_provider_config().and_then(|p| p.rate_limit),
        }
    }

    /// Stop sequence, `None` when disabled with an empty string
    pub fn stop_sequence(&self) -> Option<String> {
        if self.common.stop_sequence.is_empty() {
            None
        } else {
            Some(self.common.stop_sequence.clone())
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: InferenceProvider::default(),
            available_providers: vec![
                ProviderConfig::new(InferenceProvider::Ollama),
                ProviderConfig::new(InferenceProvider::OpenAI),
                ProviderConfig::new(InferenceProvider::Anthropic),
                ProviderConfig::new(InferenceProvider::LMStudio),
            ],
            common: InferenceCommonConfig::default(),
        }
    }
}
