//! OpenAI provider implementation
//!
//! This module provides OpenAI chat-completions integration for the LLM
//! provider system.

use crate::config::LlmSection;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider,
    MessageRole, TokenUsage,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI provider configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl OpenAiConfig {
    /// Build from the `[llm]` config section and an already-resolved key
    pub fn from_section(section: &LlmSection, api_key: String) -> Self {
        Self {
            api_key,
            base_url: section
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(section.timeout_secs),
        }
    }
}

/// OpenAI provider implementation
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::NotConfigured(
                "OpenAI API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Convert completion request to OpenAI format (pure function)
    fn convert_to_openai_request(request: &CompletionRequest) -> OpenAiCompletionRequest {
        OpenAiCompletionRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(Self::convert_message).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    /// Parse OpenAI completion response (pure function)
    fn parse_completion_response(
        openai_response: OpenAiCompletionResponse,
        request_metadata: std::collections::HashMap<String, String>,
    ) -> Result<CompletionResponse, LlmError> {
        let Some(choice) = openai_response.choices.into_iter().next() else {
            return Err(LlmError::ApiError(
                "No choices returned from OpenAI".to_string(),
            ));
        };

        let usage = openai_response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content,
            model: openai_response.model,
            usage,
            finish_reason: Self::convert_finish_reason(choice.finish_reason.as_deref()),
            metadata: request_metadata,
        })
    }

    /// Convert OpenAI finish reason to internal format (pure function)
    fn convert_finish_reason(reason: Option<&str>) -> FinishReason {
        match reason {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Error,
        }
    }

    fn convert_message(message: &ChatMessage) -> OpenAiMessage {
        OpenAiMessage {
            role: match message.role {
                MessageRole::System => "system".to_string(),
                MessageRole::User => "user".to_string(),
                MessageRole::Assistant => "assistant".to_string(),
            },
            content: Some(message.content.clone()),
        }
    }

    /// Map a non-success HTTP status to a provider error (pure function)
    fn error_for_status(status: StatusCode, body: &str) -> LlmError {
        match status {
            StatusCode::UNAUTHORIZED => {
                LlmError::AuthenticationFailed(format!("OpenAI rejected the API key: {body}"))
            }
            StatusCode::NOT_FOUND => LlmError::ModelNotFound(body.to_string()),
            StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded(body.to_string()),
            _ => LlmError::ApiError(format!("OpenAI API error: {status} - {body}")),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn available_models(&self) -> Vec<String> {
        vec![
            "gpt-4".to_string(),
            "gpt-4-turbo".to_string(),
            "gpt-3.5-turbo".to_string(),
            "gpt-4o".to_string(),
            "gpt-4o-mini".to_string(),
        ]
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let openai_request = Self::convert_to_openai_request(&request);
        debug!(
            model = %openai_request.model,
            messages = openai_request.messages.len(),
            "OpenAI request"
        );

        self.complete_with_retry(openai_request, request.metadata)
            .await
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LlmError::AuthenticationFailed(
                "OpenAI API authentication failed".to_string(),
            ))
        }
    }
}

impl OpenAiProvider {
    /// Retry orchestrator: rate limits and network errors only
    async fn complete_with_retry(
        &self,
        openai_request: OpenAiCompletionRequest,
        metadata: std::collections::HashMap<String, String>,
    ) -> Result<CompletionResponse, LlmError> {
        let backoff_delays = [100u64, 200, 300];
        let mut last_error = None;

        for (attempt, &delay_ms) in std::iter::once(&0u64)
            .chain(backoff_delays.iter())
            .enumerate()
        {
            if attempt > 0 {
                debug!(
                    "OpenAI retry attempt {} after {}ms delay",
                    attempt, delay_ms
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            match self.make_api_request(&openai_request).await {
                Ok(openai_response) => {
                    if attempt > 0 {
                        debug!("OpenAI request succeeded after {} retries", attempt);
                    }
                    let response = Self::parse_completion_response(openai_response, metadata)?;
                    debug!(
                        total_tokens = response.usage.total_tokens,
                        finish_reason = ?response.finish_reason,
                        "OpenAI response"
                    );
                    return Ok(response);
                }
                Err(e) if e.is_retryable() => {
                    warn!("OpenAI request attempt {} failed: {}", attempt + 1, e);
                    last_error = Some(e);
                }
                Err(e) => {
                    error!("Non-retryable OpenAI error, aborting: {}", e);
                    return Err(e);
                }
            }
        }

        error!("OpenAI request failed after all retries");
        Err(last_error
            .unwrap_or_else(|| LlmError::NetworkError("All retry attempts failed".to_string())))
    }

    /// Make single API request (impure I/O)
    async fn make_api_request(
        &self,
        openai_request: &OpenAiCompletionRequest,
    ) -> Result<OpenAiCompletionResponse, LlmError> {
        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(openai_request)
            .send()
            .await
            .map_err(|e| {
                warn!(
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "OpenAI network error: {}",
                    e
                );
                LlmError::NetworkError(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::error_for_status(status, &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct OpenAiCompletionRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiCompletionResponse {
    #[serde(default)]
    model: String,
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
