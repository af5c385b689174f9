/*!
 * # MQM-APE
 *
 * A Rust library for interpretable machine-translation evaluation with LLMs.
 *
 * ## Features
 *
 * - MQM error annotation with a few-shot GEMBA-style evaluator prompt
 * - Automatic post-editing (APE) of every annotated error
 * - Verification of post-edits, either by the LLM with positional
 *   debiasing or by a quality-estimation metric
 * - MQM and MQM-APE scoring of each segment
 * - Inference through various providers:
 *   - Ollama (local LLM)
 *   - OpenAI API and OpenAI-compatible servers (LM Studio, vLLM)
 *   - Anthropic API
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `evaluation`: The evaluation core:
 *   - `evaluation::extractor`: Parsing of evaluator responses
 *   - `evaluation::post_edit`: Merging of post-edits
 *   - `evaluation::verdict`: Resolution of comparison responses
 *   - `evaluation::verification`: LLM and metric verification
 *   - `evaluation::scorer`: MQM and MQM-APE scoring
 *   - `evaluation::pipeline`: End-to-end pipeline
 * - `inference`: Batched generation over a provider
 * - `metric`: Quality-estimation scoring backend
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Client implementations for various LLM providers:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::openai`: OpenAI API client
 *   - `providers::anthropic`: Anthropic API client
 *   - `providers::mock`: Offline backends for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod evaluation;
pub mod file_utils;
pub mod inference;
pub mod language_utils;
pub mod metric;
pub mod providers;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, EvaluationRequest};
pub use errors::{AppError, PipelineError, ProviderError};
pub use evaluation::{EvaluationReport, MqmApePipeline, VerificationEngine};
pub use inference::{GenerationParams, InferenceBackend, LlmInference};
pub use metric::{HttpMetricScorer, MetricBackend};
