/*!
 * Data model for error annotations and evaluated samples.
 *
 * An `AnnotationSet` holds the errors found in one sentence pair, bucketed
 * by severity. Every stage after extraction relies on the flatten order
 * (critical, then major, then minor, each in extraction order), so the
 * buckets are plain vectors that are only ever appended to or updated in
 * place.
 */

use serde::{Deserialize, Serialize};

/// Severity bucket of an error annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

impl Severity {
    /// All severities in flatten order
    pub const ALL: [Severity; 3] = [Severity::Critical, Severity::Major, Severity::Minor];

    /// Penalty weight applied per error (or per unit of validity)
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Critical => 25.0,
            Severity::Major => 5.0,
            Severity::Minor => 1.0,
        }
    }

    // @returns: Lowercase severity identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Major => "major",
            Severity::Minor => "minor",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single translation error reported by the evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorAnnotation {
    /// Taxonomy label, e.g. "accuracy/mistranslation"
    pub category: String,

    /// Offending substring exactly as quoted by the model
    pub span: String,

    /// Translation post-edited to address this error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_edit: Option<String>,

    /// Whether the post-edit improved the translation: 0, 0.5 or 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_valid_score: Option<f64>,

    /// Quality-estimation score of the post-edit (metric verifier only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postedit_metric_score: Option<f64>,
}

impl ErrorAnnotation {
    /// Create a fresh annotation with only category and span set
    pub fn new(category: impl Into<String>, span: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            span: span.into(),
            post_edit: None,
            pe_valid_score: None,
            postedit_metric_score: None,
        }
    }

    /// Attach a post-edit (builder style, mostly for tests)
    pub fn with_post_edit(mut self, post_edit: impl Into<String>) -> Self {
        self.post_edit = Some(post_edit.into());
        self
    }

    /// Attach a validity score (builder style, mostly for tests)
    pub fn with_validity(mut self, score: f64) -> Self {
        self.pe_valid_score = Some(score);
        self
    }
}

/// Severity-bucketed annotations of one sentence pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSet {
    #[serde(default)]
    pub critical: Vec<ErrorAnnotation>,
    #[serde(default)]
    pub major: Vec<ErrorAnnotation>,
    #[serde(default)]
    pub minor: Vec<ErrorAnnotation>,
}

impl AnnotationSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bucket for a severity
    pub fn bucket(&self, severity: Severity) -> &[ErrorAnnotation] {
        match severity {
            Severity::Critical => &self.critical,
            Severity::Major => &self.major,
            Severity::Minor => &self.minor,
        }
    }

    /// Get the bucket for a severity, mutably
    pub fn bucket_mut(&mut self, severity: Severity) -> &mut Vec<ErrorAnnotation> {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::Major => &mut self.major,
            Severity::Minor => &mut self.minor,
        }
    }

    /// Append an annotation to the given bucket
    pub fn push(&mut self, severity: Severity, annotation: ErrorAnnotation) {
        self.bucket_mut(severity).push(annotation);
    }

    /// Iterate over all annotations in flatten order
    pub fn iter_flat(&self) -> impl Iterator<Item = (Severity, &ErrorAnnotation)> {
        Severity::ALL
            .into_iter()
            .flat_map(move |severity| self.bucket(severity).iter().map(move |a| (severity, a)))
    }

    /// Total number of annotations across buckets
    pub fn len(&self) -> usize {
        self.critical.len() + self.major.len() + self.minor.len()
    }

    /// Whether every bucket is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One evaluated sentence pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub source_lang: String,
    pub source_seg: String,
    pub target_lang: String,
    pub target_seg: String,

    /// Quality-estimation score of the original translation (metric verifier only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_score: Option<f64>,
}

impl SampleRecord {
    /// Create a record; segments are trimmed
    pub fn new(source_lang: &str, source_seg: &str, target_lang: &str, target_seg: &str) -> Self {
        Self {
            source_lang: source_lang.to_string(),
            source_seg: source_seg.trim().to_string(),
            target_lang: target_lang.to_string(),
            target_seg: target_seg.trim().to_string(),
            metric_score: None,
        }
    }
}

/// Final per-sample result written to `results.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSample {
    #[serde(flatten)]
    pub record: SampleRecord,

    /// Annotations with post-edits and validity scores
    pub error_dict: AnnotationSet,

    /// Validity-weighted score
    #[serde(rename = "MQM_APE_score")]
    pub mqm_ape_score: f64,

    /// Plain error-count score of the same annotations
    #[serde(rename = "MQM_score")]
    pub mqm_score: f64,
}
