use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::evaluation::{EvaluationReport, MqmApePipeline, VerificationEngine};
use crate::file_utils::FileManager;
use crate::inference::{InferenceBackend, LlmInference};
use crate::language_utils;
use crate::metric::{HttpMetricScorer, MetricBackend};

// @module: Application controller for MQM-APE evaluation runs

/// Per-sample results with annotations and scores
pub const RESULTS_FILE: &str = "results.json";
/// One MQM-APE score per line
pub const SCORES_FILE: &str = "scores.txt";
/// Evaluator prompts and responses
pub const EVALUATOR_RESPONSES_FILE: &str = "llm_responses_evaluator.json";
/// Post-edit prompts and responses
pub const APE_RESPONSES_FILE: &str = "llm_responses_ape.json";
/// Verifier prompts and responses
pub const VERIFIER_RESPONSES_FILE: &str = "llm_responses_verifier.json";
/// Evaluator lines that could not be parsed
pub const OMITTED_MESSAGES_FILE: &str = "llm_evaluator_omitted_messages.txt";

/// Inputs of one evaluation run
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    /// Source segments, one per line
    pub source_path: PathBuf,
    /// Target segments, one per line
    pub target_path: PathBuf,
    /// Source language code or name
    pub source_language: String,
    /// Target language code or name
    pub target_language: String,
    /// Directory the artifacts are written to
    pub output_dir: PathBuf,
    /// Also write raw model exchanges and omitted lines
    pub save_llm_response: bool,
}

/// Main application controller for evaluation runs
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run with backends built from the configuration
    pub async fn run(&self, request: EvaluationRequest) -> Result<EvaluationReport> {
        let inference = LlmInference::from_config(&self.config.inference)?;
        info!(
            "🚀 MQM-APE: {} - {}",
            self.config.inference.provider.display_name(),
            inference.model()
        );

        // A failed check is not fatal; the first batch reports the real error
        if let Err(e) = inference.test_connection().await {
            warn!("Connection test to {} failed: {}", self.config.inference.provider.display_name(), e);
        }

        let metric: Option<Arc<dyn MetricBackend>> = if self.config.verifier.use_metric {
            Some(Arc::new(HttpMetricScorer::from_config(
                &self.config.verifier,
                self.config.inference.retry_policy(),
            )))
        } else {
            None
        };

        self.run_with_backends(request, Arc::new(inference), metric).await
    }

    /// Run with the given backends; `metric` is required when the metric verifier is configured
    pub async fn run_with_backends(
        &self,
        request: EvaluationRequest,
        inference: Arc<dyn InferenceBackend>,
        metric: Option<Arc<dyn MetricBackend>>,
    ) -> Result<EvaluationReport> {
        let start_time = std::time::Instant::now();

        let sources = FileManager::read_lines(&request.source_path)?;
        let targets = FileManager::read_lines(&request.target_path)?;
        if sources.len() != targets.len() {
            return Err(anyhow!(
                "Source file {:?} has {} lines but target file {:?} has {}",
                request.source_path,
                sources.len(),
                request.target_path,
                targets.len()
            ));
        }

        let source_language = language_utils::resolve_language_label(&request.source_language);
        let target_language = language_utils::resolve_language_label(&request.target_language);
        info!("Evaluating {} segments, {} → {}", sources.len(), source_language, target_language);

        let verification = match (self.config.verifier.use_metric, metric) {
            (true, Some(backend)) => VerificationEngine::metric(&self.config, backend),
            (true, None) => return Err(anyhow!("Metric verifier selected but no metric backend available")),
            (false, _) => VerificationEngine::llm(&self.config),
        };

        let pipeline = MqmApePipeline::from_config(&self.config, inference, verification);
        let report = pipeline
            .evaluate_segments(&sources, &targets, &source_language, &target_language)
            .await?;

        self.write_artifacts(&report, &request.output_dir, request.save_llm_response)?;
        info!(
            "Results written to {:?} in {:.1}s",
            request.output_dir,
            start_time.elapsed().as_secs_f64()
        );

        Ok(report)
    }

    /// Write every artifact of a finished run
    pub fn write_artifacts(&self, report: &EvaluationReport, output_dir: &Path, save_llm_response: bool) -> Result<()> {
        FileManager::ensure_dir(output_dir)?;

        FileManager::write_json(output_dir.join(RESULTS_FILE), &report.results)?;
        FileManager::write_lines(output_dir.join(SCORES_FILE), &report.scores)?;

        if save_llm_response {
            FileManager::write_json(output_dir.join(EVALUATOR_RESPONSES_FILE), &report.transcripts.evaluator)?;
            FileManager::write_json(output_dir.join(APE_RESPONSES_FILE), &report.transcripts.ape)?;
            if !self.config.verifier.use_metric {
                FileManager::write_json(output_dir.join(VERIFIER_RESPONSES_FILE), &report.transcripts.verifier)?;
            }
            FileManager::write_lines(output_dir.join(OMITTED_MESSAGES_FILE), &report.diagnostics)?;
            debug!("Saved model exchanges to {:?}", output_dir);
        }

        Ok(())
    }
}
