//! Integration tests for OpenAI provider
//!
//! Tests behavioral contracts without testing implementation details:
//! - API request/response handling
//! - Error scenarios (rate limits, auth failures, missing models)
//! - Retry logic for retryable failures
//! - Token usage tracking

use a2a_agents::llm::provider::{ChatMessage, CompletionRequest, FinishReason, LlmError, LlmProvider};
use a2a_agents::llm::providers::openai::{OpenAiConfig, OpenAiProvider};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> OpenAiConfig {
    OpenAiConfig {
        api_key: "test-api-key".to_string(),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
    }
}

fn test_request(model: &str) -> CompletionRequest {
    CompletionRequest::new(
        model,
        vec![
            ChatMessage::system("You are a trends analyst."),
            ChatMessage::user("What's trending?"),
        ],
    )
    .with_max_tokens(100)
    .with_temperature(0.7)
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1677652288,
        "model": "gpt-4",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 15,
            "total_tokens": 25
        }
    })
}

#[tokio::test]
async fn test_openai_provider_returns_successful_completion_with_valid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("Hello! How can I assist you today?")),
        )
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider.complete(test_request("gpt-4")).await.unwrap();

    assert_eq!(
        response.content,
        Some("Hello! How can I assist you today?".to_string())
    );
    assert_eq!(response.model, "gpt-4");
    assert_eq!(response.usage.prompt_tokens, 10);
    assert_eq!(response.usage.completion_tokens, 15);
    assert_eq!(response.usage.total_tokens, 25);
    assert!(matches!(response.finish_reason, FinishReason::Stop));
}

#[tokio::test]
async fn test_openai_provider_sends_model_messages_and_sampling_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 100,
            "messages": [
                {"role": "system", "content": "You are a trends analyst."},
                {"role": "user", "content": "What's trending?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(test_request("gpt-4o-mini")).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_openai_provider_returns_auth_error_when_api_responds_with_401() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(test_request("gpt-4")).await;

    match result.unwrap_err() {
        LlmError::AuthenticationFailed(msg) => assert!(msg.contains("Incorrect API key")),
        other => panic!("Expected AuthenticationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_provider_returns_model_not_found_on_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model gpt-9 does not exist"))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(test_request("gpt-9")).await;

    assert!(matches!(result, Err(LlmError::ModelNotFound(_))));
}

#[tokio::test]
async fn test_openai_provider_retries_rate_limits_then_gives_up() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string(
            r#"{"error": {"message": "Rate limit exceeded", "type": "rate_limit_error"}}"#,
        ))
        .expect(4)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(test_request("gpt-4")).await;

    match result.unwrap_err() {
        LlmError::RateLimitExceeded(msg) => assert!(msg.contains("Rate limit exceeded")),
        other => panic!("Expected RateLimitExceeded, got {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_provider_recovers_after_transient_rate_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("recovered")))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider.complete(test_request("gpt-4")).await.unwrap();

    assert_eq!(response.content.as_deref(), Some("recovered"));
}

#[tokio::test]
async fn test_openai_provider_does_not_retry_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(test_request("gpt-4")).await;

    match result.unwrap_err() {
        LlmError::ApiError(msg) => assert!(msg.contains("500")),
        other => panic!("Expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_provider_rejects_response_without_choices() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4",
            "choices": []
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(test_request("gpt-4")).await;

    assert!(matches!(result, Err(LlmError::ApiError(_))));
}

#[tokio::test]
async fn test_openai_provider_reports_invalid_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider.complete(test_request("gpt-4")).await;

    assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_openai_provider_maps_length_finish_reason() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4",
            "choices": [
                {"message": {"role": "assistant", "content": "truncated"}, "finish_reason": "length"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider.complete(test_request("gpt-4")).await.unwrap();

    assert!(matches!(response.finish_reason, FinishReason::Length));
    assert_eq!(response.usage.total_tokens, 0);
}

#[tokio::test]
async fn test_health_check_succeeds_when_models_endpoint_answers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("Authorization", "Bearer test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    assert!(provider.health_check().await.is_ok());
}

#[tokio::test]
async fn test_health_check_fails_on_rejected_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    assert!(matches!(
        provider.health_check().await,
        Err(LlmError::AuthenticationFailed(_))
    ));
}

#[test]
fn test_provider_requires_api_key() {
    let config = OpenAiConfig {
        api_key: "   ".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        OpenAiProvider::new(config),
        Err(LlmError::NotConfigured(_))
    ));
}
