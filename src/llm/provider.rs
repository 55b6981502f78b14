//! LLM provider abstraction and trait definitions
//!
//! Agents talk to language models only through [`LlmProvider`], so tests can
//! swap in a scripted provider and the OpenAI backend stays replaceable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A single message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Message roles in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// LLM completion request parameters
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub metadata: HashMap<String, String>,
}

impl CompletionRequest {
    pub fn new<S: Into<String>>(model: S, messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: model.into(),
            max_tokens: None,
            temperature: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

/// LLM completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: Option<String>,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: FinishReason,
    pub metadata: HashMap<String, String>,
}

impl CompletionResponse {
    /// Text content, or an error if the model returned none
    pub fn into_text(self) -> Result<String, LlmError> {
        self.content
            .ok_or_else(|| LlmError::InvalidResponse("completion had no content".to_string()))
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason why completion finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Error,
}

/// LLM provider trait for dependency injection and testing
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai")
    fn name(&self) -> &str;

    /// Get list of available models for this provider
    fn available_models(&self) -> Vec<String>;

    /// Generate a completion from the given request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Check if the provider is configured and ready
    async fn health_check(&self) -> Result<(), LlmError>;
}

/// LLM provider errors
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Model not found: {0}")]
    ModelNotFound(String),
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("API error: {0}")]
    ApiError(String),
}

impl LlmError {
    /// Whether a retry has a chance of succeeding
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::RateLimitExceeded(_) | LlmError::NetworkError(_))
    }
}
