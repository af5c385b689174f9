/*!
 * Tests for MQM and MQM-APE scoring
 */

use mqm_ape::evaluation::scorer::MIN_SCORE;
use mqm_ape::evaluation::{AnnotationSet, Scorer, ScoringMode};

use crate::common::annotation_set;

#[test]
fn test_mqmScorer_withNoErrors_shouldReturnZero() {
    let score = Scorer::new(ScoringMode::Mqm).score(&AnnotationSet::new());
    assert_eq!(score, 0.0);
    assert!(score.is_sign_positive());
}

#[test]
fn test_mqmScorer_shouldWeightBySeverity() {
    let scorer = Scorer::new(ScoringMode::Mqm);
    assert_eq!(scorer.score(&annotation_set(0, 0, 1, None)), -1.0);
    assert_eq!(scorer.score(&annotation_set(0, 1, 2, None)), -7.0);
    assert_eq!(scorer.score(&annotation_set(0, 4, 3, None)), -23.0);
}

#[test]
fn test_mqmScorer_withManyErrors_shouldClampToMinimum() {
    let scorer = Scorer::new(ScoringMode::Mqm);
    assert_eq!(scorer.score(&annotation_set(1, 0, 0, None)), MIN_SCORE);
    assert_eq!(scorer.score(&annotation_set(10, 0, 0, None)), MIN_SCORE);
    assert_eq!(scorer.score(&annotation_set(0, 5, 1, None)), -25.0);
}

#[test]
fn test_mqmApeScorer_shouldWeightByValidity() {
    let scorer = Scorer::new(ScoringMode::MqmApe);
    assert_eq!(scorer.score(&annotation_set(1, 0, 0, Some(0.5))), -12.5);
    assert_eq!(scorer.score(&annotation_set(0, 2, 0, Some(1.0))), -10.0);
    assert_eq!(scorer.score(&annotation_set(0, 0, 3, Some(0.0))), 0.0);
}

#[test]
fn test_mqmApeScorer_withUnverifiedAnnotations_shouldIgnoreThem() {
    let score = Scorer::new(ScoringMode::MqmApe).score(&annotation_set(1, 1, 1, None));
    assert_eq!(score, 0.0);
    assert!(score.is_sign_positive());
}

#[test]
fn test_scoreList_shouldKeepInputOrder() {
    let sets = vec![annotation_set(0, 0, 1, None), AnnotationSet::new(), annotation_set(0, 1, 0, None)];
    let scores = Scorer::new(ScoringMode::Mqm).score_list(&sets);
    assert_eq!(scores, vec![-1.0, 0.0, -5.0]);
}
