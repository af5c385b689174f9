/*!
 * Verification of post-edits.
 *
 * Two interchangeable engines decide whether each post-edit actually
 * improves the translation:
 *
 * - `DebiasedVerifier` asks the model to compare the original and the
 *   post-edit, optionally a second time with the options swapped, and only
 *   accepts a winner both orders agree on.
 * - `MetricVerifier` compares quality-estimation scores against a threshold.
 *
 * Both produce a `Validity` per annotation and write it back in flatten order.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Stage};

use super::alignment::{flattened_count, pair_with_annotations};
use super::model::{AnnotationSet, SampleRecord};
use super::verdict::{Verdict, VerdictResolver};

/// Outcome of verifying one post-edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Validity {
    /// The original translation is better
    Rejected,
    /// No clear winner
    Tie,
    /// The post-edit is better
    Accepted,
}

impl Validity {
    /// Numeric weight stored as `pe_valid_score`
    pub fn score(&self) -> f64 {
        match self {
            Validity::Rejected => 0.0,
            Validity::Tie => 0.5,
            Validity::Accepted => 1.0,
        }
    }
}

/// Order of the two options shown to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOrder {
    /// Existing translation is A, post-edit is B
    Original,
    /// Post-edit is A, existing translation is B
    Swapped,
}

/// One pairwise comparison to send to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRequest {
    pub source_lang: String,
    pub source_seg: String,
    pub target_lang: String,
    pub translation_a: String,
    pub translation_b: String,
    pub order: ComparisonOrder,
}

/// Reduce a single verdict (existing = A, post-edit = B)
pub fn reduce_single_pass(verdict: Verdict) -> Validity {
    match verdict {
        Verdict::A => Validity::Rejected,
        Verdict::B => Validity::Accepted,
    }
}

/// Reduce verdicts from both orders; only agreement yields a winner
pub fn reduce_two_pass(original: Verdict, swapped: Verdict) -> Validity {
    match (original, swapped) {
        (Verdict::A, Verdict::B) => Validity::Rejected,
        (Verdict::B, Verdict::A) => Validity::Accepted,
        _ => Validity::Tie,
    }
}

/// LLM-judged verification with optional positional debiasing
#[derive(Debug, Clone)]
pub struct DebiasedVerifier {
    resolver: VerdictResolver,
    use_twice_verify: bool,
}

impl DebiasedVerifier {
    /// Create a verifier; `use_twice_verify` enables the swapped second pass
    pub fn new(resolver: VerdictResolver, use_twice_verify: bool) -> Self {
        Self { resolver, use_twice_verify }
    }

    /// Number of comparisons issued per annotation
    pub fn passes(&self) -> usize {
        if self.use_twice_verify { 2 } else { 1 }
    }

    /// Build comparisons in flatten order, swapped pass right after its original
    pub fn comparisons(&self, samples: &[SampleRecord], sets: &[AnnotationSet]) -> Vec<ComparisonRequest> {
        let mut requests = Vec::with_capacity(flattened_count(sets) * self.passes());

        for (sample, set) in samples.iter().zip(sets) {
            for (_, annotation) in set.iter_flat() {
                let post_edit = annotation.post_edit.clone().unwrap_or_default();
                requests.push(ComparisonRequest {
                    source_lang: sample.source_lang.clone(),
                    source_seg: sample.source_seg.clone(),
                    target_lang: sample.target_lang.clone(),
                    translation_a: sample.target_seg.clone(),
                    translation_b: post_edit.clone(),
                    order: ComparisonOrder::Original,
                });

                if self.use_twice_verify {
                    requests.push(ComparisonRequest {
                        source_lang: sample.source_lang.clone(),
                        source_seg: sample.source_seg.clone(),
                        target_lang: sample.target_lang.clone(),
                        translation_a: post_edit,
                        translation_b: sample.target_seg.clone(),
                        order: ComparisonOrder::Swapped,
                    });
                }
            }
        }

        requests
    }

    /// Resolve responses and store `pe_valid_score` on every annotation
    pub fn apply(&self, sets: &mut [AnnotationSet], responses: &[String]) -> Result<(), PipelineError> {
        let expected = flattened_count(sets) * self.passes();
        if responses.len() != expected {
            return Err(PipelineError::alignment(Stage::Verifier, expected, responses.len()));
        }

        let verdicts: Vec<Verdict> = responses.iter().map(|r| self.resolver.resolve(r)).collect();
        let validities: Vec<Validity> = if self.use_twice_verify {
            verdicts
                .chunks_exact(2)
                .map(|pair| reduce_two_pass(pair[0], pair[1]))
                .collect()
        } else {
            verdicts.into_iter().map(reduce_single_pass).collect()
        };

        let aligned = pair_with_annotations(sets, validities, Stage::Verifier)?;
        let accepted = aligned.iter().filter(|e| e.value == Validity::Accepted).count();
        debug!("Verifier accepted {} of {} post-edits", accepted, aligned.len());

        for entry in aligned {
            sets[entry.sample].bucket_mut(entry.severity)[entry.position].pe_valid_score = Some(entry.value.score());
        }

        Ok(())
    }
}

/// Source/hypothesis pairs to score with a quality-estimation metric
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricRequests {
    /// One (source, original translation) pair per sample
    pub originals: Vec<(String, String)>,
    /// One (source, post-edit) pair per annotation, in flatten order
    pub post_edits: Vec<(String, String)>,
}

/// Metric-judged verification
#[derive(Debug, Clone)]
pub struct MetricVerifier {
    threshold: f64,
}

impl MetricVerifier {
    /// Create a verifier; `threshold` is the minimum score gap for a winner
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Get the decision threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Compare an original score with a post-edit score
    pub fn compare(&self, original_score: f64, edit_score: f64) -> Validity {
        let delta = edit_score - original_score;
        if delta > self.threshold {
            Validity::Accepted
        } else if -delta > self.threshold {
            Validity::Rejected
        } else {
            Validity::Tie
        }
    }

    /// Collect everything that needs scoring
    pub fn requests(&self, samples: &[SampleRecord], sets: &[AnnotationSet]) -> MetricRequests {
        let mut requests = MetricRequests::default();
        for (sample, set) in samples.iter().zip(sets) {
            requests.originals.push((sample.source_seg.clone(), sample.target_seg.clone()));
            for (_, annotation) in set.iter_flat() {
                requests.post_edits.push((
                    sample.source_seg.clone(),
                    annotation.post_edit.clone().unwrap_or_default(),
                ));
            }
        }
        requests
    }

    /// Store sample scores, post-edit scores and validities
    pub fn apply(
        &self,
        samples: &mut [SampleRecord],
        sets: &mut [AnnotationSet],
        original_scores: &[f64],
        edit_scores: &[f64],
    ) -> Result<(), PipelineError> {
        if original_scores.len() != samples.len() {
            return Err(PipelineError::alignment(Stage::Metric, samples.len(), original_scores.len()));
        }

        let aligned = pair_with_annotations(sets, edit_scores.to_vec(), Stage::Metric)?;

        for (sample, score) in samples.iter_mut().zip(original_scores) {
            sample.metric_score = Some(*score);
        }

        for entry in aligned {
            let original_score = original_scores[entry.sample];
            let validity = self.compare(original_score, entry.value);
            let annotation = &mut sets[entry.sample].bucket_mut(entry.severity)[entry.position];
            annotation.postedit_metric_score = Some(entry.value);
            annotation.pe_valid_score = Some(validity.score());
        }

        Ok(())
    }
}
