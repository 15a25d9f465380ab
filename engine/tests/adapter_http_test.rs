//! Integration tests for the HTTP capability adapters
//!
//! These tests verify the wire contracts and the error mapping of the
//! adapters against a local mock server. No real backend services are
//! required.

use leafscan_engine::adapters::{
    AdapterError, ChatExplainer, Classifier, Explainer, HttpClassifier, HttpSynthesizer,
    Synthesizer,
};
use leafscan_engine::config::{ClassifierConfig, ExplainerConfig, SynthesizerConfig};
use sdk::types::{ExplanationSource, Plant};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn classifier_config(server: &MockServer) -> ClassifierConfig {
    ClassifierConfig {
        base_url: server.uri(),
        timeout_secs: 1,
    }
}

fn synthesizer_config(server: &MockServer) -> SynthesizerConfig {
    SynthesizerConfig {
        base_url: server.uri(),
        timeout_secs: 1,
    }
}

fn explainer_config(server: &MockServer, api_key_env: &str) -> ExplainerConfig {
    ExplainerConfig {
        base_url: server.uri(),
        model: "test-model".to_string(),
        api_key_env: api_key_env.to_string(),
        timeout_secs: 1,
    }
}

#[tokio::test]
async fn test_classifier_parses_valid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .and(body_partial_json(json!({"plant": "potato"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "label": "Early Blight",
            "confidence": 0.87,
        })))
        .mount(&server)
        .await;

    let classifier = HttpClassifier::new(&classifier_config(&server)).unwrap();
    let result = classifier.classify(b"imagebytes", Plant::Potato).await.unwrap();

    assert_eq!(result.label, "Early Blight");
    assert!((result.confidence - 0.87).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_classifier_rejects_out_of_range_confidence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "label": "Early Blight",
            "confidence": 1.7,
        })))
        .mount(&server)
        .await;

    let classifier = HttpClassifier::new(&classifier_config(&server)).unwrap();
    let err = classifier
        .classify(b"imagebytes", Plant::Potato)
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_classifier_maps_garbage_body_to_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let classifier = HttpClassifier::new(&classifier_config(&server)).unwrap();
    let err = classifier
        .classify(b"imagebytes", Plant::Potato)
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_classifier_maps_5xx_to_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let classifier = HttpClassifier::new(&classifier_config(&server)).unwrap();
    let err = classifier
        .classify(b"imagebytes", Plant::Potato)
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Unreachable(_)));
}

#[tokio::test]
async fn test_classifier_maps_slow_response_to_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"label": "Healthy", "confidence": 0.99}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let classifier = HttpClassifier::new(&classifier_config(&server)).unwrap();
    let err = classifier
        .classify(b"imagebytes", Plant::Potato)
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Timeout));
}

#[tokio::test]
async fn test_classifier_maps_connection_refused_to_unreachable() {
    // No server listening on this port.
    let config = ClassifierConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout_secs: 1,
    };
    let classifier = HttpClassifier::new(&config).unwrap();
    let err = classifier
        .classify(b"imagebytes", Plant::Potato)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AdapterError::Unreachable(_) | AdapterError::Timeout
    ));
}

#[tokio::test]
async fn test_synthesizer_parses_valid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/synthesize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audio_url": "/audio/42.mp3",
            "duration_secs": 7.1,
        })))
        .mount(&server)
        .await;

    let synthesizer = HttpSynthesizer::new(&synthesizer_config(&server)).unwrap();
    let audio = synthesizer.synthesize("Your potato leaf looks healthy").await.unwrap();

    assert_eq!(audio.url, "/audio/42.mp3");
    assert_eq!(audio.format, "mp3");
    assert_eq!(audio.duration_secs, Some(7.1));
}

#[tokio::test]
async fn test_synthesizer_rejects_empty_audio_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/synthesize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"audio_url": ""})))
        .mount(&server)
        .await;

    let synthesizer = HttpSynthesizer::new(&synthesizer_config(&server)).unwrap();
    let err = synthesizer.synthesize("text").await.unwrap_err();
    assert!(matches!(err, AdapterError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_explainer_recovers_fenced_json() {
    let server = MockServer::start().await;
    std::env::set_var("LEAFSCAN_TEST_KEY_FENCED", "test-key");

    let content = "```json\n{\"disease_overview\": \"a blight\", \"symptoms\": \"spots\", \
                   \"cause\": \"fungus\", \"recommended_treatment\": \"fungicide\", \
                   \"prevention_tips\": \"rotate\"}\n```";
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
        })))
        .mount(&server)
        .await;

    let explainer =
        ChatExplainer::new(explainer_config(&server, "LEAFSCAN_TEST_KEY_FENCED")).unwrap();
    let explanation = explainer.explain(Plant::Potato, "Early Blight").await.unwrap();

    assert_eq!(explanation.source, ExplanationSource::Generated);
    assert_eq!(explanation.overview, "a blight");
    assert_eq!(explanation.treatment, "fungicide");
}

#[tokio::test]
async fn test_explainer_rejects_out_of_schema_json() {
    let server = MockServer::start().await;
    std::env::set_var("LEAFSCAN_TEST_KEY_SCHEMA", "test-key");

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"unexpected\": true}"}}],
        })))
        .mount(&server)
        .await;

    let explainer =
        ChatExplainer::new(explainer_config(&server, "LEAFSCAN_TEST_KEY_SCHEMA")).unwrap();
    let err = explainer
        .explain(Plant::Potato, "Early Blight")
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_explainer_without_api_key_is_unreachable() {
    let server = MockServer::start().await;
    // Deliberately never set.
    let explainer =
        ChatExplainer::new(explainer_config(&server, "LEAFSCAN_TEST_KEY_UNSET")).unwrap();
    let err = explainer
        .explain(Plant::Potato, "Early Blight")
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Unreachable(_)));
}
