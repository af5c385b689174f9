/*!
 * Tests for verdict resolution and both verification engines
 */

use mqm_ape::evaluation::verification::{ComparisonOrder, reduce_single_pass, reduce_two_pass};
use mqm_ape::evaluation::{
    AnnotationSet, DebiasedVerifier, ErrorAnnotation, MetricVerifier, SampleRecord, Severity, Validity, Verdict,
    VerdictResolver,
};
use mqm_ape::errors::{PipelineError, Stage};

fn sample() -> SampleRecord {
    SampleRecord::new("German", "Das Konto ist gesperrt.", "English", "The count is locked.")
}

fn two_annotation_set() -> AnnotationSet {
    let mut set = AnnotationSet::new();
    set.push(Severity::Minor, ErrorAnnotation::new("style/awkward", "is").with_post_edit("The account is frozen."));
    set.push(Severity::Major, ErrorAnnotation::new("accuracy/mistranslation", "count").with_post_edit("The account is locked."));
    set
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_verdictResolver_withChattyAnswers_shouldResolve() {
    let resolver = VerdictResolver::default();
    assert_eq!(resolver.resolve("Translation A is more accurate."), Verdict::A);
    assert_eq!(resolver.resolve("\n\nAnswer: B\n"), Verdict::B);
    assert_eq!(resolver.resolve("The better one is \"B\"."), Verdict::B);
    assert_eq!(resolver.resolve("Option A"), Verdict::A);
}

#[test]
fn test_verdictResolver_withStopSequence_shouldIgnoreTrailingText() {
    let resolver = VerdictResolver::new(Some("<|eot_id|>".to_string()));
    assert_eq!(resolver.resolve("B<|eot_id|>Translation A is better"), Verdict::B);
}

#[test]
fn test_reduceTwoPass_shouldOnlyAcceptAgreement() {
    assert_eq!(reduce_two_pass(Verdict::B, Verdict::A), Validity::Accepted);
    assert_eq!(reduce_two_pass(Verdict::A, Verdict::B), Validity::Rejected);
    assert_eq!(reduce_two_pass(Verdict::A, Verdict::A), Validity::Tie);
    assert_eq!(reduce_two_pass(Verdict::B, Verdict::B), Validity::Tie);
}

#[test]
fn test_reduceSinglePass_shouldMapOptionToValidity() {
    assert_eq!(reduce_single_pass(Verdict::B), Validity::Accepted);
    assert_eq!(reduce_single_pass(Verdict::A), Validity::Rejected);
    assert_eq!(Validity::Tie.score(), 0.5);
}

#[test]
fn test_debiasedVerifier_comparisons_shouldFollowFlattenOrderWithSwappedPairs() {
    let verifier = DebiasedVerifier::new(VerdictResolver::default(), true);
    let requests = verifier.comparisons(&[sample()], &[two_annotation_set()]);

    assert_eq!(requests.len(), 4);
    // Major bucket comes before minor
    assert_eq!(requests[0].translation_b, "The account is locked.");
    assert_eq!(requests[0].order, ComparisonOrder::Original);
    assert_eq!(requests[1].translation_a, "The account is locked.");
    assert_eq!(requests[1].translation_b, "The count is locked.");
    assert_eq!(requests[1].order, ComparisonOrder::Swapped);
    assert_eq!(requests[2].translation_b, "The account is frozen.");
}

#[test]
fn test_debiasedVerifier_apply_shouldStoreValidityPerAnnotation() {
    let verifier = DebiasedVerifier::new(VerdictResolver::default(), true);
    let mut sets = vec![two_annotation_set()];

    // Major: B then A agrees on the post-edit; minor: A then A is a positional tie
    verifier.apply(&mut sets, &strings(&["B", "A", "A", "A"])).unwrap();

    assert_eq!(sets[0].major[0].pe_valid_score, Some(1.0));
    assert_eq!(sets[0].minor[0].pe_valid_score, Some(0.5));
}

#[test]
fn test_debiasedVerifier_singlePass_shouldExpectOneResponsePerAnnotation() {
    let verifier = DebiasedVerifier::new(VerdictResolver::default(), false);
    let mut sets = vec![two_annotation_set()];

    let err = verifier.apply(&mut sets, &strings(&["B", "A", "A"])).unwrap_err();
    assert!(matches!(err, PipelineError::Alignment { stage: Stage::Verifier, expected: 2, actual: 3 }));

    verifier.apply(&mut sets, &strings(&["A", "B"])).unwrap();
    assert_eq!(sets[0].major[0].pe_valid_score, Some(0.0));
    assert_eq!(sets[0].minor[0].pe_valid_score, Some(1.0));
}

#[test]
fn test_metricVerifier_compare_shouldRequireGapAboveThreshold() {
    let verifier = MetricVerifier::new(0.03);
    assert_eq!(verifier.compare(0.50, 0.60), Validity::Accepted);
    assert_eq!(verifier.compare(0.60, 0.50), Validity::Rejected);
    assert_eq!(verifier.compare(0.50, 0.52), Validity::Tie);
    assert_eq!(verifier.compare(0.50, 0.50), Validity::Tie);
}

#[test]
fn test_metricVerifier_withZeroThreshold_shouldOnlyTieOnEqualScores() {
    let verifier = MetricVerifier::new(0.0);
    assert_eq!(verifier.compare(0.5, 0.5), Validity::Tie);
    assert_eq!(verifier.compare(0.5, 0.5001), Validity::Accepted);
}

#[test]
fn test_metricVerifier_apply_shouldRecordScoresAndValidity() {
    let verifier = MetricVerifier::new(0.03);
    let mut samples = vec![sample()];
    let mut sets = vec![two_annotation_set()];

    let requests = verifier.requests(&samples, &sets);
    assert_eq!(requests.originals.len(), 1);
    assert_eq!(requests.post_edits[0].1, "The account is locked.");

    verifier.apply(&mut samples, &mut sets, &[0.40], &[0.80, 0.39]).unwrap();

    assert_eq!(samples[0].metric_score, Some(0.40));
    assert_eq!(sets[0].major[0].postedit_metric_score, Some(0.80));
    assert_eq!(sets[0].major[0].pe_valid_score, Some(1.0));
    assert_eq!(sets[0].minor[0].pe_valid_score, Some(0.5));
}

#[test]
fn test_metricVerifier_apply_withMissingSampleScore_shouldFailAlignment() {
    let verifier = MetricVerifier::new(0.03);
    let mut samples = vec![sample()];
    let mut sets = vec![two_annotation_set()];

    let err = verifier.apply(&mut samples, &mut sets, &[], &[0.8, 0.4]).unwrap_err();
    assert!(matches!(err, PipelineError::Alignment { stage: Stage::Metric, expected: 1, actual: 0 }));
    assert_eq!(samples[0].metric_score, None);
}
