/*!
 * Tests for error types and conversions
 */

use mqm_ape::errors::{AppError, PipelineError, ProviderError, Stage};

#[test]
fn test_providerError_requestFailed_shouldDisplayCorrectly() {
    let error = ProviderError::RequestFailed("Connection timeout".to_string());
    let display = format!("{}", error);
    assert!(display.contains("API request failed"));
    assert!(display.contains("Connection timeout"));
}

#[test]
fn test_providerError_apiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 503,
        message: "Model is loading".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("503"));
    assert!(display.contains("Model is loading"));
}

#[test]
fn test_pipelineError_alignment_shouldNameStageAndCounts() {
    let error = PipelineError::alignment(Stage::PostEdit, 4, 3);
    let display = format!("{}", error);
    assert!(display.contains("post-edit"));
    assert!(display.contains("expected 4"));
    assert!(display.contains("got 3"));
}

#[test]
fn test_pipelineError_inputMismatch_shouldDisplayBothLengths() {
    let error = PipelineError::InputMismatch { sources: 10, targets: 9 };
    let display = format!("{}", error);
    assert!(display.contains("10 source segments"));
    assert!(display.contains("9 target segments"));
}

#[test]
fn test_pipelineError_fromProviderError_shouldWrapCorrectly() {
    let error: PipelineError = ProviderError::RateLimitExceeded("slow down".to_string()).into();
    assert!(matches!(error, PipelineError::Provider(ProviderError::RateLimitExceeded(_))));
    assert!(format!("{}", error).contains("slow down"));
}

#[test]
fn test_appError_fromPipelineError_shouldWrapCorrectly() {
    let error: AppError = PipelineError::Metric("server down".to_string()).into();
    let display = format!("{}", error);
    assert!(display.starts_with("Pipeline error"));
    assert!(display.contains("server down"));
}

#[test]
fn test_appError_fromIoError_shouldBecomeFileError() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "src.txt missing");
    let error: AppError = io.into();
    assert!(matches!(error, AppError::File(ref msg) if msg.contains("src.txt missing")));
}

#[test]
fn test_appError_fromSerdeError_shouldBecomeConfigError() {
    let parse = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
    let error: AppError = parse.into();
    assert!(matches!(error, AppError::Config(_)));
}
