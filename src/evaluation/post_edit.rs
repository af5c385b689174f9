/*!
 * Merging of post-edit responses into error annotations.
 */

use log::debug;

use crate::errors::{PipelineError, Stage};

use super::alignment::{pair_with_annotations, truncate_response};
use super::model::AnnotationSet;

/// Marker the post-edit prompt asks the model to put before its answer
pub const CORRECTED_MARKER: &str = "corrected translation";

/// Label separator used by some models in front of the marker ("<text> -- Corrected Translation")
const LABEL_SEPARATOR: &str = "--";

/// Attaches post-edited translations to annotations
#[derive(Debug, Clone, Default)]
pub struct PostEditMerger {
    /// End-of-turn sentinel to cut responses at
    stop_sequence: Option<String>,
}

impl PostEditMerger {
    /// Create a merger, optionally truncating responses at a sentinel
    pub fn new(stop_sequence: Option<String>) -> Self {
        Self { stop_sequence }
    }

    /// Fill `post_edit` on every annotation, consuming `responses` in flatten order
    pub fn merge(&self, sets: &mut [AnnotationSet], responses: &[String]) -> Result<(), PipelineError> {
        let translations: Vec<String> = responses
            .iter()
            .map(|response| self.response_to_translation(response))
            .collect();

        let aligned = pair_with_annotations(sets, translations, Stage::PostEdit)?;
        debug!("Merging {} post-edits", aligned.len());

        for entry in aligned {
            sets[entry.sample].bucket_mut(entry.severity)[entry.position].post_edit = Some(entry.value);
        }

        Ok(())
    }

    /// Pull the corrected translation out of one response
    pub fn response_to_translation(&self, response: &str) -> String {
        let sentinels: Vec<&str> = self.stop_sequence.iter().map(String::as_str).collect();
        let response = truncate_response(response, &sentinels);

        let candidate = match find_ascii_case_insensitive(response, CORRECTED_MARKER) {
            Some(position) => {
                let after_marker = &response[position + CORRECTED_MARKER.len()..];
                // Skip the separator right after the marker, usually ':'
                let after_separator = after_marker
                    .chars()
                    .next()
                    .map_or(after_marker, |c| &after_marker[c.len_utf8()..]);

                let result = after_separator.trim();
                if result.is_empty() {
                    let before = &response[..position];
                    before.split(LABEL_SEPARATOR).next().unwrap_or_default().trim()
                } else {
                    result
                }
            }
            None => response.trim(),
        };

        let first_line = candidate.split('\n').next().unwrap_or_default();
        first_line.trim_matches('"').to_string()
    }
}

/// Byte offset of `needle` in `haystack`, ignoring ASCII case
fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    // ASCII lowercasing keeps byte offsets identical
    haystack.to_ascii_lowercase().find(&needle.to_ascii_lowercase())
}
