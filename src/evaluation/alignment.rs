/*!
 * Positional alignment between annotations and per-annotation responses.
 *
 * Post-edits, verdicts and metric scores come back from the backends as
 * flat lists. They are paired with their annotations once, up front, so
 * that no stage keeps a shared cursor while mutating annotation sets.
 */

use crate::errors::{PipelineError, Stage};

use super::model::{AnnotationSet, Severity};

/// A value paired with the annotation it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedEntry<T> {
    /// Index of the sample the annotation belongs to
    pub sample: usize,
    /// Bucket of the annotation
    pub severity: Severity,
    /// Position inside the bucket
    pub position: usize,
    /// The paired value
    pub value: T,
}

/// Number of annotations across all sets
pub fn flattened_count(sets: &[AnnotationSet]) -> usize {
    sets.iter().map(AnnotationSet::len).sum()
}

/// Annotation coordinates in flatten order across samples
pub fn flatten_positions(sets: &[AnnotationSet]) -> Vec<(usize, Severity, usize)> {
    let mut positions = Vec::with_capacity(flattened_count(sets));
    for (sample, set) in sets.iter().enumerate() {
        for severity in Severity::ALL {
            for position in 0..set.bucket(severity).len() {
                positions.push((sample, severity, position));
            }
        }
    }
    positions
}

/// Pair each value with its annotation, or fail when the counts differ
pub fn pair_with_annotations<T>(
    sets: &[AnnotationSet],
    values: Vec<T>,
    stage: Stage,
) -> Result<Vec<AlignedEntry<T>>, PipelineError> {
    let positions = flatten_positions(sets);
    if positions.len() != values.len() {
        return Err(PipelineError::alignment(stage, positions.len(), values.len()));
    }

    Ok(positions
        .into_iter()
        .zip(values)
        .map(|((sample, severity, position), value)| AlignedEntry {
            sample,
            severity,
            position,
            value,
        })
        .collect())
}

/// Cut a response at the first occurrence of any sentinel
pub fn truncate_response<'a>(response: &'a str, sentinels: &[&str]) -> &'a str {
    let mut truncated = response;
    for sentinel in sentinels.iter().filter(|s| !s.is_empty()) {
        if let Some(pos) = truncated.find(sentinel) {
            truncated = &truncated[..pos];
        }
    }
    truncated
}
