/*!
 * Tests for application configuration functionality
 */

use mqm_ape::app_config::{Config, InferenceProvider, LogLevel, ProviderConfig};

use crate::common::create_temp_dir;

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaultConfig() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config.inference.provider, InferenceProvider::Ollama);

    let reloaded = Config::load_or_create(&path).unwrap();
    assert_eq!(reloaded.inference.get_model(), config.inference.get_model());
    assert_eq!(reloaded.verifier.metric_threshold, 0.03);
}

#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(&path, "{ \"inference\": ").unwrap();

    let err = Config::load_or_create(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
}

#[test]
fn test_loadOrCreate_withOverrides_shouldKeepUserValues() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(
        &path,
        r#"{
            "evaluator": { "max_tokens": 1024, "temperature": 0.2 },
            "verifier": { "use_metric": true, "metric_threshold": 0.05 },
            "log_level": "debug"
        }"#,
    )
    .unwrap();

    let config = Config::load_or_create(&path).unwrap();
    assert_eq!(config.evaluator.max_tokens, 1024);
    assert_eq!(config.evaluator.temperature, 0.2);
    assert!(config.verifier.use_metric);
    assert_eq!(config.verifier.metric_threshold, 0.05);
    assert_eq!(config.log_level.to_level_filter(), log::LevelFilter::Debug);
    assert!(config.validate().is_ok());
}

#[test]
fn test_providerConfig_new_shouldUseProviderDefaults() {
    let ollama = ProviderConfig::new(InferenceProvider::Ollama);
    assert!(ollama.endpoint.contains("11434"));
    assert!(ollama.rate_limit.is_none());

    let lmstudio = ProviderConfig::new(InferenceProvider::LMStudio);
    assert!(lmstudio.endpoint.ends_with("/v1"));
    assert_eq!(lmstudio.provider_type, "lmstudio");
}

#[test]
fn test_inferenceProvider_serde_shouldUseLowercaseNames() {
    let json = serde_json::to_string(&InferenceProvider::LMStudio).unwrap();
    assert_eq!(json, "\"lmstudio\"");
    let parsed: InferenceProvider = serde_json::from_str("\"anthropic\"").unwrap();
    assert_eq!(parsed, InferenceProvider::Anthropic);
    assert!(InferenceProvider::Anthropic.requires_api_key());
    assert!(!InferenceProvider::Ollama.requires_api_key());
}

#[test]
fn test_getModel_withEmptyModel_shouldFallBackToProviderDefault() {
    let mut config = Config::default();
    if let Some(provider) = config.inference.get_active_provider_config_mut() {
        provider.model = String::new();
    }
    assert_eq!(config.inference.get_model(), ProviderConfig::new(InferenceProvider::Ollama).model);
}

#[test]
fn test_stopSequence_withEmptyString_shouldBeDisabled() {
    let mut config = Config::default();
    config.inference.common.stop_sequence = String::new();
    assert_eq!(config.inference.stop_sequence(), None);
}

#[test]
fn test_logLevel_default_shouldBeInfo() {
    assert_eq!(LogLevel::default(), LogLevel::Info);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
