/*!
 * End-to-end MQM-APE evaluation.
 *
 * One batch flows through four stages:
 *
 * 1. the evaluator annotates every sample (one prompt per sample),
 * 2. the post-editor fixes every annotated error (one prompt per annotation),
 * 3. a verification engine judges every post-edit,
 * 4. the scorer turns each annotation set into MQM and MQM-APE scores.
 *
 * Every response list is checked against the annotations it belongs to;
 * any mismatch aborts the whole batch.
 */

use log::info;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::errors::{PipelineError, Stage};
use crate::inference::{GenerationParams, InferenceBackend};
use crate::metric::MetricBackend;

use super::alignment::{flattened_count, truncate_response};
use super::extractor::AnnotationExtractor;
use super::model::{AnnotationSet, SampleRecord, ScoredSample};
use super::post_edit::PostEditMerger;
use super::prompts::{Prompt, PromptBuilder};
use super::scorer::{Scorer, ScoringMode};
use super::verdict::VerdictResolver;
use super::verification::{DebiasedVerifier, MetricVerifier};

/// One prompt and the text generated for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    pub prompt: Prompt,
    pub generated_text: String,
}

/// Raw model exchanges of one run, per stage
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transcripts {
    pub evaluator: Vec<Exchange>,
    pub ape: Vec<Exchange>,
    /// Empty when the metric verifier is used
    pub verifier: Vec<Exchange>,
}

/// Everything a run produces
#[derive(Debug, Clone, Default)]
pub struct EvaluationReport {
    /// One scored sample per input pair, in input order
    pub results: Vec<ScoredSample>,
    /// `MQM_APE_score` of every sample, in input order
    pub scores: Vec<f64>,
    /// Model exchanges
    pub transcripts: Transcripts,
    /// Omitted evaluator lines
    pub diagnostics: Vec<String>,
}

/// How post-edits are verified
pub enum VerificationEngine {
    /// Pairwise comparison by the LLM
    Llm {
        verifier: DebiasedVerifier,
        params: GenerationParams,
    },
    /// Quality-estimation score comparison
    Metric {
        verifier: MetricVerifier,
        backend: Arc<dyn MetricBackend>,
    },
}

impl VerificationEngine {
    /// LLM verification from the configuration
    pub fn llm(config: &Config) -> Self {
        let stop = config.inference.stop_sequence();
        VerificationEngine::Llm {
            verifier: DebiasedVerifier::new(VerdictResolver::new(stop.clone()), config.verifier.use_twice_verify),
            params: GenerationParams::from_verifier(&config.verifier, stop),
        }
    }

    /// Metric verification from the configuration
    pub fn metric(config: &Config, backend: Arc<dyn MetricBackend>) -> Self {
        VerificationEngine::Metric {
            verifier: MetricVerifier::new(config.verifier.metric_threshold),
            backend,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            VerificationEngine::Llm { .. } => "LLM",
            VerificationEngine::Metric { .. } => "metric",
        }
    }
}

/// The MQM-APE evaluation pipeline
pub struct MqmApePipeline {
    inference: Arc<dyn InferenceBackend>,
    evaluator_params: GenerationParams,
    ape_params: GenerationParams,
    stop_sequence: Option<String>,
    verification: VerificationEngine,
}

impl MqmApePipeline {
    /// Create a pipeline with default generation settings and no stop sequence
    pub fn new(inference: Arc<dyn InferenceBackend>, verification: VerificationEngine) -> Self {
        Self {
            inference,
            evaluator_params: GenerationParams::default(),
            ape_params: GenerationParams::default(),
            stop_sequence: None,
            verification,
        }
    }

    /// Create a pipeline with the settings of the configuration
    pub fn from_config(config: &Config, inference: Arc<dyn InferenceBackend>, verification: VerificationEngine) -> Self {
        let stop = config.inference.stop_sequence();
        Self {
            inference,
            evaluator_params: GenerationParams::from_module(&config.evaluator, stop.clone()),
            ape_params: GenerationParams::from_module(&config.ape, stop.clone()),
            stop_sequence: stop,
            verification,
        }
    }

    /// Set the end-of-turn sentinel responses are cut at
    pub fn with_stop_sequence(mut self, stop_sequence: Option<String>) -> Self {
        self.stop_sequence = stop_sequence;
        self
    }

    /// Evaluate parallel source and target segments
    pub async fn evaluate_segments(
        &self,
        sources: &[String],
        targets: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<EvaluationReport, PipelineError> {
        if sources.len() != targets.len() {
            return Err(PipelineError::InputMismatch {
                sources: sources.len(),
                targets: targets.len(),
            });
        }

        let samples = sources
            .iter()
            .zip(targets)
            .map(|(src, tgt)| SampleRecord::new(source_lang, src, target_lang, tgt))
            .collect();

        self.evaluate(samples).await
    }

    /// Run every stage over a batch of samples
    pub async fn evaluate(&self, mut samples: Vec<SampleRecord>) -> Result<EvaluationReport, PipelineError> {
        let mut report = EvaluationReport::default();
        if samples.is_empty() {
            return Ok(report);
        }

        let start_time = Instant::now();

        // Error identification
        let prompts: Vec<Prompt> = samples.iter().map(PromptBuilder::evaluator).collect();
        let responses = self.generate(&prompts, &self.evaluator_params, Stage::Evaluator).await?;
        let mut sets = Vec::with_capacity(samples.len());
        for response in &responses {
            let extraction = AnnotationExtractor::extract(self.truncate(response));
            sets.push(extraction.annotations);
            report.diagnostics.extend(extraction.diagnostics);
        }
        info!(
            "Evaluator found {} errors in {} samples ({} lines omitted)",
            flattened_count(&sets),
            samples.len(),
            report.diagnostics.len()
        );
        report.transcripts.evaluator = transcript(prompts, responses);

        // Post-editing
        let prompts = post_edit_prompts(&samples, &sets);
        let responses = self.generate(&prompts, &self.ape_params, Stage::PostEdit).await?;
        PostEditMerger::new(self.stop_sequence.clone()).merge(&mut sets, &responses)?;
        report.transcripts.ape = transcript(prompts, responses);

        // Verification
        info!("Verifying {} post-edits with the {} verifier", flattened_count(&sets), self.verification.name());
        match &self.verification {
            VerificationEngine::Llm { verifier, params } => {
                let prompts: Vec<Prompt> = verifier
                    .comparisons(&samples, &sets)
                    .iter()
                    .map(PromptBuilder::verifier)
                    .collect();
                let responses = self.generate(&prompts, params, Stage::Verifier).await?;
                verifier.apply(&mut sets, &responses)?;
                report.transcripts.verifier = transcript(prompts, responses);
            }
            VerificationEngine::Metric { verifier, backend } => {
                let requests = verifier.requests(&samples, &sets);
                let original_scores = score_pairs(backend.as_ref(), &requests.originals).await?;
                let edit_scores = score_pairs(backend.as_ref(), &requests.post_edits).await?;
                verifier.apply(&mut samples, &mut sets, &original_scores, &edit_scores)?;
            }
        }

        // Scoring
        let ape_scorer = Scorer::new(ScoringMode::MqmApe);
        let mqm_scorer = Scorer::new(ScoringMode::Mqm);
        for (record, set) in samples.into_iter().zip(sets) {
            let mqm_ape_score = ape_scorer.score(&set);
            report.scores.push(mqm_ape_score);
            report.results.push(ScoredSample {
                record,
                mqm_score: mqm_scorer.score(&set),
                error_dict: set,
                mqm_ape_score,
            });
        }

        let mean = report.scores.iter().sum::<f64>() / report.scores.len() as f64;
        info!(
            "Evaluated {} samples in {:.1}s, mean MQM-APE score {:.3}",
            report.results.len(),
            start_time.elapsed().as_secs_f64(),
            mean
        );

        Ok(report)
    }

    /// Generate a batch and check it lines up with the prompts
    async fn generate(&self, prompts: &[Prompt], params: &GenerationParams, stage: Stage) -> Result<Vec<String>, PipelineError> {
        if prompts.is_empty() {
            return Ok(Vec::new());
        }

        let responses = self.inference.generate(prompts, params).await?;
        if responses.len() != prompts.len() {
            return Err(PipelineError::alignment(stage, prompts.len(), responses.len()));
        }
        Ok(responses)
    }

    fn truncate<'a>(&self, response: &'a str) -> &'a str {
        match &self.stop_sequence {
            Some(stop) => truncate_response(response, &[stop.as_str()]),
            None => response,
        }
    }
}

/// Post-edit prompts in flatten order
fn post_edit_prompts(samples: &[SampleRecord], sets: &[AnnotationSet]) -> Vec<Prompt> {
    samples
        .iter()
        .zip(sets)
        .flat_map(|(sample, set)| set.iter_flat().map(move |(_, annotation)| PromptBuilder::post_edit(sample, annotation)))
        .collect()
}

async fn score_pairs(backend: &dyn MetricBackend, pairs: &[(String, String)]) -> Result<Vec<f64>, PipelineError> {
    if pairs.is_empty() {
        return Ok(Vec::new());
    }

    let (sources, hypotheses): (Vec<String>, Vec<String>) = pairs.iter().cloned().unzip();
    backend
        .score(&sources, &hypotheses)
        .await
        .map_err(|e| PipelineError::Metric(e.to_string()))
}

fn transcript(prompts: Vec<Prompt>, responses: Vec<String>) -> Vec<Exchange> {
    prompts
        .into_iter()
        .zip(responses)
        .map(|(prompt, generated_text)| Exchange { prompt, generated_text })
        .collect()
}
