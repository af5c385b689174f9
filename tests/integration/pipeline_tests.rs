/*!
 * End-to-end pipeline tests over mock backends
 */

use std::sync::Arc;

use mqm_ape::app_config::Config;
use mqm_ape::errors::{PipelineError, ProviderError, Stage};
use mqm_ape::evaluation::prompts::Prompt;
use mqm_ape::evaluation::{MqmApePipeline, VerificationEngine};
use mqm_ape::providers::mock::{MockInference, MockMetric, PromptKind};

fn segments() -> (Vec<String>, Vec<String>) {
    (
        vec!["你好世界".to_string(), "今天天气很好".to_string()],
        vec!["Hello word".to_string(), "The weather is nice today".to_string()],
    )
}

fn pipeline(config: &Config, backend: &MockInference) -> MqmApePipeline {
    MqmApePipeline::from_config(config, Arc::new(backend.clone()), VerificationEngine::llm(config))
}

fn last_content(prompt: &Prompt) -> &str {
    prompt.last().map(|m| m.content.as_str()).unwrap_or_default()
}

/// Critical and minor error, post-edit echoes a fix, verifier always answers "A"
fn positional_responder(prompt: &Prompt) -> String {
    match PromptKind::of(prompt) {
        PromptKind::Evaluator => {
            "Critical:\naccuracy/addition - \"c\"\nMajor:\nno-error\nMinor:\nstyle/awkward - \"m\"<|eot_id|>".to_string()
        }
        PromptKind::PostEdit => "Corrected Translation: edited<|eot_id|>".to_string(),
        PromptKind::Verifier => "A".to_string(),
    }
}

#[tokio::test]
async fn test_pipeline_withPositionallyBiasedVerifier_shouldScoreTies() {
    let backend = MockInference::working().with_responder(positional_responder);
    let (src, tgt) = segments();

    let report = pipeline(&Config::default(), &backend)
        .evaluate_segments(&src, &tgt, "Chinese", "English")
        .await
        .unwrap();

    // Both annotations tie: 25 * 0.5 + 1 * 0.5
    assert_eq!(report.scores, vec![-13.0, -13.0]);
    assert_eq!(report.results[0].mqm_score, -25.0);
    assert_eq!(report.results[0].error_dict.critical[0].pe_valid_score, Some(0.5));
    assert_eq!(backend.batch_count(), 3);
}

#[tokio::test]
async fn test_pipeline_withSinglePassVerifier_shouldTrustFirstAnswer() {
    let mut config = Config::default();
    config.verifier.use_twice_verify = false;
    let backend = MockInference::working().with_responder(positional_responder);
    let (src, tgt) = segments();

    let report = pipeline(&config, &backend)
        .evaluate_segments(&src, &tgt, "Chinese", "English")
        .await
        .unwrap();

    // "A" keeps the original translation, so nothing counts
    assert_eq!(report.scores, vec![0.0, 0.0]);
    assert_eq!(report.transcripts.verifier.len(), 4);
    assert_eq!(report.results[1].error_dict.minor[0].pe_valid_score, Some(0.0));
}

#[tokio::test]
async fn test_pipeline_postEditPrompts_shouldFollowFlattenOrder() {
    let backend = MockInference::working().with_responder(positional_responder);
    let (src, tgt) = segments();

    pipeline(&Config::default(), &backend)
        .evaluate_segments(&src, &tgt, "Chinese", "English")
        .await
        .unwrap();

    let post_edits: Vec<Prompt> = backend
        .received()
        .into_iter()
        .filter(|p| PromptKind::of(p) == PromptKind::PostEdit)
        .collect();

    assert_eq!(post_edits.len(), 4);
    assert!(last_content(&post_edits[0]).contains("\"accuracy/addition - c\""));
    assert!(last_content(&post_edits[0]).contains("Hello word"));
    assert!(last_content(&post_edits[1]).contains("\"style/awkward - m\""));
    assert!(last_content(&post_edits[2]).contains("The weather is nice today"));
}

#[tokio::test]
async fn test_pipeline_withTextAfterStopSequence_shouldIgnoreIt() {
    let backend = MockInference::working().with_responder(|prompt| match PromptKind::of(prompt) {
        PromptKind::Evaluator => "Major:\nno-error<|eot_id|>Critical:\naccuracy/addition - \"ghost\"".to_string(),
        _ => "B".to_string(),
    });
    let (src, tgt) = segments();

    let report = pipeline(&Config::default(), &backend)
        .evaluate_segments(&src, &tgt, "Chinese", "English")
        .await
        .unwrap();

    assert_eq!(report.scores, vec![0.0, 0.0]);
    assert!(report.results.iter().all(|r| r.error_dict.is_empty()));
    assert_eq!(backend.batch_count(), 1);
}

#[tokio::test]
async fn test_pipeline_withEmptyResponses_shouldScoreZeroWithoutDiagnostics() {
    let backend = MockInference::empty();
    let (src, tgt) = segments();

    let report = pipeline(&Config::default(), &backend)
        .evaluate_segments(&src, &tgt, "Chinese", "English")
        .await
        .unwrap();

    assert_eq!(report.scores, vec![0.0, 0.0]);
    assert!(report.diagnostics.is_empty());
    assert_eq!(backend.batch_count(), 1);
}

#[tokio::test]
async fn test_pipeline_withFailingBackend_shouldPropagateProviderError() {
    let (src, tgt) = segments();
    let err = pipeline(&Config::default(), &MockInference::failing())
        .evaluate_segments(&src, &tgt, "Chinese", "English")
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Provider(ProviderError::ApiError { status_code: 500, .. })));
}

#[tokio::test]
async fn test_pipeline_withFailureDuringPostEdit_shouldAbortBatch() {
    // Second batch is the post-edit stage
    let backend = MockInference::intermittent(2);
    let (src, tgt) = segments();

    let err = pipeline(&Config::default(), &backend)
        .evaluate_segments(&src, &tgt, "Chinese", "English")
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Provider(ProviderError::ApiError { status_code: 503, .. })));
    assert_eq!(backend.batch_count(), 2);
}

#[tokio::test]
async fn test_pipeline_withShortBatch_shouldFailAlignment() {
    // Drops one response per batch; the evaluator batch already comes up short
    let backend = MockInference::misaligned(1);
    let (src, tgt) = segments();

    let err = pipeline(&Config::default(), &backend)
        .evaluate_segments(&src[..1], &tgt[..1], "Chinese", "English")
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Alignment { stage: Stage::Evaluator, expected: 1, actual: 0 }));
}

#[tokio::test]
async fn test_pipeline_withMetricRejectingEdits_shouldZeroApeScore() {
    let config = Config::default();
    let engine = VerificationEngine::metric(&config, Arc::new(MockMetric::fixed(0.9, 0.2, "fixed")));
    let pipeline = MqmApePipeline::from_config(&config, Arc::new(MockInference::working()), engine);
    let (src, tgt) = segments();

    let report = pipeline.evaluate_segments(&src, &tgt, "Chinese", "English").await.unwrap();

    assert_eq!(report.scores, vec![0.0, 0.0]);
    assert_eq!(report.results[0].mqm_score, -5.0);
    assert_eq!(report.results[0].error_dict.major[0].pe_valid_score, Some(0.0));
}

#[tokio::test]
async fn test_pipeline_results_shouldSerializeFlatRecord() {
    let (src, tgt) = segments();
    let report = pipeline(&Config::default(), &MockInference::working())
        .evaluate_segments(&src, &tgt, "Chinese", "English")
        .await
        .unwrap();

    let value = serde_json::to_value(&report.results[0]).unwrap();
    assert_eq!(value["source_seg"], "你好世界");
    assert_eq!(value["target_lang"], "English");
    assert_eq!(value["MQM_APE_score"], -5.0);
    assert_eq!(value["error_dict"]["major"][0]["category"], "accuracy/mistranslation");
    assert_eq!(value["error_dict"]["major"][0]["post_edit"], "fixed translation");
}
