//! Error types for the A2A agent servers
//!
//! Internal errors are mapped to JSON-RPC error objects before they leave the
//! process, with secrets redacted from the message text.

use crate::a2a::jsonrpc::{error_codes, JsonRpcError};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Main error type for agent operations
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("Task cannot be canceled: {task_id}")]
    TaskNotCancelable { task_id: String },

    #[error("LLM provider error: {message}")]
    LlmError { message: String },

    #[error("Remote agent error at {url}: {message}")]
    RemoteAgent { url: String, message: String },

    #[error("Webhook error: {message}")]
    Webhook { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AgentError {
    /// Convert AgentError to a JSON-RPC error object for the wire
    pub fn to_jsonrpc_error(&self) -> JsonRpcError {
        let code = match self {
            AgentError::InvalidRequest { .. } => error_codes::INVALID_REQUEST,
            AgentError::TaskNotFound { .. } => error_codes::TASK_NOT_FOUND,
            AgentError::TaskNotCancelable { .. } => error_codes::TASK_NOT_CANCELABLE,
            AgentError::LlmError { .. }
            | AgentError::RemoteAgent { .. }
            | AgentError::Webhook { .. }
            | AgentError::InternalError { .. }
            | AgentError::ConfigError(_)
            | AgentError::Serialization(_) => error_codes::INTERNAL_ERROR,
        };

        JsonRpcError {
            code,
            message: sanitize_error_message(&self.to_string()),
            data: None,
        }
    }

    /// Create invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create task not found error
    pub fn task_not_found<S: Into<String>>(task_id: S) -> Self {
        Self::TaskNotFound {
            task_id: task_id.into(),
        }
    }

    pub fn task_not_cancelable<S: Into<String>>(task_id: S) -> Self {
        Self::TaskNotCancelable {
            task_id: task_id.into(),
        }
    }

    /// Create LLM error
    pub fn llm_error<S: Into<String>>(message: S) -> Self {
        Self::LlmError {
            message: message.into(),
        }
    }

    /// Create remote agent error
    pub fn remote_agent<U: Into<String>, S: Into<String>>(url: U, message: S) -> Self {
        Self::RemoteAgent {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn webhook<S: Into<String>>(message: S) -> Self {
        Self::Webhook {
            message: message.into(),
        }
    }

    /// Create internal error
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

impl From<crate::llm::LlmError> for AgentError {
    fn from(err: crate::llm::LlmError) -> Self {
        Self::llm_error(err.to_string())
    }
}

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").expect("secret pattern is valid")
});

static SECRET_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
        .expect("secret path pattern is valid")
});

const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Sanitize error messages before they are returned to callers or webhooks
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = SECRET_PATTERN
        .replace_all(message, "${1}=***")
        .to_string();

    sanitized = SECRET_PATH_PATTERN
        .replace_all(&sanitized, "/***REDACTED***/")
        .to_string();

    // Total length must stay <= 500 bytes, cut on a char boundary
    if sanitized.len() > MAX_ERROR_MESSAGE_LEN {
        let truncate_suffix = "...[truncated]";
        let mut cut = MAX_ERROR_MESSAGE_LEN - truncate_suffix.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized = format!("{}{}", &sanitized[..cut], truncate_suffix);
    }

    sanitized
}

/// Result type for Agent operations
pub type AgentResult<T> = Result<T, AgentError>;
