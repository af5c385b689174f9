/*!
 * Common test utilities for the mqm_ape test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use mqm_ape::app_config::Config;
use mqm_ape::evaluation::{AnnotationSet, ErrorAnnotation, Severity};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Writes a parallel Chinese-English segment pair of files
pub fn create_segment_files(dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let src = create_test_file(dir, "src.txt", "你好世界\n今天天气很好\n再见\n")?;
    let tgt = create_test_file(dir, "tgt.txt", "Hello word\nThe weather is nice today\nGoodbye\n")?;
    Ok((src, tgt))
}

/// A configuration that validates without network access or API keys
pub fn offline_config() -> Config {
    Config::default()
}

/// Annotation with an explicit validity score
pub fn scored_annotation(category: &str, pe_valid_score: Option<f64>) -> ErrorAnnotation {
    ErrorAnnotation {
        pe_valid_score,
        ..ErrorAnnotation::new(category, "span")
    }
}

/// Set holding the given number of annotations per severity, all with the same validity
pub fn annotation_set(critical: usize, major: usize, minor: usize, validity: Option<f64>) -> AnnotationSet {
    let mut set = AnnotationSet::new();
    for (severity, count) in [(Severity::Critical, critical), (Severity::Major, major), (Severity::Minor, minor)] {
        for _ in 0..count {
            set.push(severity, scored_annotation("accuracy/mistranslation", validity));
        }
    }
    set
}
