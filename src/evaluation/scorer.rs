/*!
 * MQM scoring of annotation sets.
 */

use serde::{Deserialize, Serialize};

use super::model::{AnnotationSet, Severity};

/// Lowest score a sample can get
pub const MIN_SCORE: f64 = -25.0;

/// How annotations are weighted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringMode {
    /// Every annotation counts fully
    #[serde(rename = "MQM")]
    Mqm,
    /// Every annotation counts by its `pe_valid_score`
    #[serde(rename = "MQM-APE")]
    MqmApe,
}

/// Penalty scorer
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    mode: ScoringMode,
}

impl Scorer {
    /// Create a scorer for the given mode
    pub fn new(mode: ScoringMode) -> Self {
        Self { mode }
    }

    /// Score one annotation set; 0 is best, `MIN_SCORE` is worst
    pub fn score(&self, set: &AnnotationSet) -> f64 {
        let penalty: f64 = Severity::ALL
            .iter()
            .map(|severity| severity.weight() * self.bucket_weight(set, *severity))
            .sum();

        (0.0 - penalty).max(MIN_SCORE)
    }

    /// Score every set, keeping order
    pub fn score_list(&self, sets: &[AnnotationSet]) -> Vec<f64> {
        sets.iter().map(|set| self.score(set)).collect()
    }

    fn bucket_weight(&self, set: &AnnotationSet, severity: Severity) -> f64 {
        let bucket = set.bucket(severity);
        match self.mode {
            ScoringMode::Mqm => bucket.len() as f64,
            // An unverified annotation contributes nothing
            ScoringMode::MqmApe => bucket.iter().filter_map(|a| a.pe_valid_score).sum(),
        }
    }
}
