#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Model-client integration tests: the OpenAI-compatible backend against a
//! local `wiremock` server, the demo backend, and config loading.

use pathwise_agent::backends::openai::OpenAiBackend;
use pathwise_agent::{
    CompletionRequest, LlmBackend, LlmClient, LlmProvider, ModelConfig, RetryPolicy,
};
use pathwise_core::PathwiseError;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn config_for(server: &MockServer) -> ModelConfig {
    ModelConfig {
        provider: LlmProvider::OpenAi,
        model_id: "gpt-4o-mini".into(),
        api_key: "test-key".into(),
        api_base_url: Some(server.uri()),
        temperature: 0.5,
        max_tokens: 256,
        fallback_models: Vec::new(),
        retry_policy: None,
    }
}

#[tokio::test]
async fn test_openai_backend_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_string_contains("\"response_format\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"ok\": true}")))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new(config_for(&server));
    let request = CompletionRequest::new("system", "user").json();
    let text = backend.complete(&request).await.unwrap();
    assert_eq!(text, "{\"ok\": true}");
}

#[tokio::test]
async fn test_openai_backend_switches_token_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("\"max_completion_tokens\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("done")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            "Unsupported parameter: 'max_tokens' is not supported with this model. \
             Use 'max_completion_tokens' instead.",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new(config_for(&server));
    let text = backend
        .complete(&CompletionRequest::new("system", "user"))
        .await
        .unwrap();
    assert_eq!(text, "done");
}

#[tokio::test]
async fn test_openai_backend_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new(config_for(&server));
    let err = backend
        .complete(&CompletionRequest::new("system", "user"))
        .await
        .unwrap_err();
    match err {
        PathwiseError::Http(msg) => {
            assert!(msg.contains("401"), "got: {msg}");
            assert!(msg.contains("invalid api key"), "got: {msg}");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_fails_over_to_second_model() {
    let primary = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&primary)
        .await;
    let secondary = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("from fallback")))
        .expect(1)
        .mount(&secondary)
        .await;

    let mut config = config_for(&primary);
    config.fallback_models = vec![config_for(&secondary)];
    config.retry_policy = Some(RetryPolicy {
        max_retries: 1,
        backoff_base_ms: 0,
        backoff_max_ms: 0,
    });

    let client = LlmClient::new(config);
    let text = client.complete("system", "user", false).await.unwrap();
    assert_eq!(text, "from fallback");
}

#[tokio::test]
async fn test_demo_provider_through_client() {
    let client = LlmClient::new(ModelConfig::demo());
    let text = client
        .complete(
            "You are an intelligent learning assistant.",
            "Current knowledge point:\n- Title: Recursion\n",
            false,
        )
        .await
        .unwrap();
    assert!(text.contains("Recursion"));
}

#[test]
fn test_model_config_defaults_from_toml() {
    let config: ModelConfig = toml::from_str("provider = \"openrouter\"").unwrap();
    assert_eq!(config.provider, LlmProvider::OpenRouter);
    assert_eq!(config.model_id, "gpt-4o-mini");
    assert!(config.api_key.is_empty());
    assert_eq!(config.temperature, 0.5);
    assert_eq!(config.max_tokens, 8000);
    assert!(config.fallback_models.is_empty());
    assert!(config.retry_policy.is_none());
    assert_eq!(config.base_url(), "https://openrouter.ai/api");
}

#[test]
fn test_model_config_with_fallbacks_from_toml() {
    let config: ModelConfig = toml::from_str(
        r#"
provider = "openai"
model_id = "gpt-4o"
api_base_url = "http://localhost:8080/"

[retry_policy]
max_retries = 2
backoff_base_ms = 100
backoff_max_ms = 1000

[[fallback_models]]
provider = "groq"
model_id = "llama-3.1-8b-instant"
"#,
    )
    .unwrap();
    assert_eq!(config.base_url(), "http://localhost:8080");
    assert_eq!(config.retry_policy.unwrap().max_retries, 2);
    assert_eq!(config.fallback_models.len(), 1);
    assert_eq!(config.fallback_models[0].provider, LlmProvider::Groq);
    assert_eq!(
        config.fallback_models[0].base_url(),
        "https://api.groq.com/openai"
    );
}
