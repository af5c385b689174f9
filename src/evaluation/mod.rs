/*!
 * MQM-APE evaluation.
 *
 * This module contains the evaluation core:
 * - `model`: Samples, annotations and scored results
 * - `extractor`: Parsing of evaluator responses into annotations
 * - `post_edit`: Merging of post-edited translations
 * - `verdict`: Resolution of pairwise comparison responses
 * - `verification`: LLM and metric verification engines
 * - `scorer`: MQM and MQM-APE scoring
 * - `alignment`: Pairing of flat response lists with annotations
 * - `prompts`: Prompt templates for every stage
 * - `pipeline`: The end-to-end pipeline
 */

pub mod alignment;
pub mod extractor;
pub mod model;
pub mod pipeline;
pub mod post_edit;
pub mod prompts;
pub mod scorer;
pub mod verdict;
pub mod verification;

pub use extractor::{AnnotationExtractor, Extraction};
pub use model::{AnnotationSet, ErrorAnnotation, SampleRecord, ScoredSample, Severity};
pub use pipeline::{EvaluationReport, Exchange, MqmApePipeline, Transcripts, VerificationEngine};
pub use scorer::{Scorer, ScoringMode};
pub use verdict::{Verdict, VerdictResolver};
pub use verification::{DebiasedVerifier, MetricVerifier, Validity};
