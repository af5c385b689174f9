/*!
 * Tests for evaluator response parsing and post-edit merging
 */

use mqm_ape::evaluation::alignment::{flatten_positions, truncate_response};
use mqm_ape::evaluation::extractor::{AnnotationExtractor, LineAction, LineOutcome};
use mqm_ape::evaluation::post_edit::PostEditMerger;
use mqm_ape::evaluation::{AnnotationSet, ErrorAnnotation, Severity};
use mqm_ape::errors::{PipelineError, Stage};

#[test]
fn test_extract_withLinesBeforeAnyHeader_shouldDefaultToMinor() {
    let extraction = AnnotationExtractor::extract("style/awkward - \"rather odd\"");
    assert_eq!(extraction.annotations.minor.len(), 1);
    assert_eq!(extraction.annotations.minor[0].category, "style/awkward");
    assert_eq!(extraction.annotations.minor[0].span, "rather odd");
}

#[test]
fn test_extract_withVerboseHeaders_shouldSwitchSeverity() {
    let response = "Critical errors:\naccuracy/addition - \"extra\"\nMajor errors:\nno error\nMinor errors:\nfluency/punctuation - \",\"";
    let extraction = AnnotationExtractor::extract(response);

    assert_eq!(extraction.annotations.critical.len(), 1);
    assert!(extraction.annotations.major.is_empty());
    assert_eq!(extraction.annotations.minor[0].span, ",");
    assert!(extraction.diagnostics.is_empty());
}

#[test]
fn test_extract_withCurlyQuotes_shouldCaptureSpan() {
    let extraction = AnnotationExtractor::extract("Major:\nterminology/inappropriate for context - “bank”");
    assert_eq!(extraction.annotations.major[0].span, "bank");
}

#[test]
fn test_extract_withSeparatorInsideSpan_shouldSplitAtFirstSeparator() {
    let extraction = AnnotationExtractor::extract("Minor:\nstyle/awkward - \"well - sort of\"");
    let annotation = &extraction.annotations.minor[0];
    assert_eq!(annotation.category, "style/awkward");
    assert_eq!(annotation.span, "well - sort of");
}

#[test]
fn test_extract_withUnparseableLines_shouldRecordDiagnostics() {
    let response = "Major:\naccuracy/mistranslation \"no separator\"\nfluency/grammar - unquoted\n";
    let extraction = AnnotationExtractor::extract(response);

    assert!(extraction.annotations.is_empty());
    assert_eq!(
        extraction.diagnostics,
        vec![
            "This line will omit: accuracy/mistranslation \"no separator\"".to_string(),
            "This line will omit: fluency/grammar - unquoted".to_string(),
        ]
    );
}

#[test]
fn test_classifyLine_withNoErrorMention_shouldSkipEvenWithQuotes() {
    let outcome = AnnotationExtractor::classify_line("No error - \"everything fine\"");
    assert_eq!(outcome, LineOutcome::Rule(LineAction::Skip));
}

#[test]
fn test_classifyLine_withHeaderWordInsideLine_shouldPreferHeaderRule() {
    let outcome = AnnotationExtractor::classify_line("accuracy - \"a minor: issue\"");
    assert_eq!(outcome, LineOutcome::Rule(LineAction::SetSeverity(Severity::Minor)));
}

#[test]
fn test_flattenPositions_shouldSkipEmptySamples() {
    let mut first = AnnotationSet::new();
    first.push(Severity::Minor, ErrorAnnotation::new("a", "1"));
    let mut third = AnnotationSet::new();
    third.push(Severity::Critical, ErrorAnnotation::new("b", "2"));
    third.push(Severity::Minor, ErrorAnnotation::new("c", "3"));

    let positions = flatten_positions(&[first, AnnotationSet::new(), third]);
    assert_eq!(
        positions,
        vec![(0, Severity::Minor, 0), (2, Severity::Critical, 0), (2, Severity::Minor, 0)]
    );
}

#[test]
fn test_truncateResponse_shouldCutAtEarliestSentinel() {
    assert_eq!(truncate_response("B<|eot_id|>A", &["<|eot_id|>"]), "B");
    assert_eq!(truncate_response("no sentinel", &["<|eot_id|>"]), "no sentinel");
}

#[test]
fn test_postEditMerger_withVariants_shouldExtractTranslation() {
    let merger = PostEditMerger::new(Some("<|eot_id|>".to_string()));

    assert_eq!(
        merger.response_to_translation("Corrected Translation: Hello world<|eot_id|>ignored"),
        "Hello world"
    );
    assert_eq!(merger.response_to_translation("CORRECTED TRANSLATION:Hallo Welt"), "Hallo Welt");
    assert_eq!(merger.response_to_translation("  Just the sentence.  "), "Just the sentence.");
    assert_eq!(merger.response_to_translation("Hello world -- Corrected Translation"), "Hello world");
}

#[test]
fn test_postEditMerger_withTooManyResponses_shouldFailAlignment() {
    let mut sets = vec![AnnotationSet::new()];
    sets[0].push(Severity::Major, ErrorAnnotation::new("accuracy", "x"));

    let responses = vec!["one".to_string(), "two".to_string()];
    let err = PostEditMerger::default().merge(&mut sets, &responses).unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Alignment { stage: Stage::PostEdit, expected: 1, actual: 2 }
    ));
}
