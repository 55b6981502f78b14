//! Mock implementations for testing
//!
//! Provides a scripted [`LlmProvider`] and helpers that run an
//! [`AgentExecutor`] against an in-process event queue.

use crate::a2a::executor::{AgentExecutor, EventQueue, MessageSendConfiguration, RequestContext};
use crate::a2a::types::{Event, Message, TaskState};
use crate::error::AgentResult;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, TokenUsage,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Mock LLM provider for testing
#[derive(Debug)]
pub struct MockLlmProvider {
    pub responses: Vec<String>,
    pub current_response: Arc<Mutex<usize>>,
    pub should_fail: bool,
    /// Every request seen, in order
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            current_response: Arc::new(Mutex::new(0)),
            should_fail: false,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn single_response(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    pub async fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn available_models(&self) -> Vec<String> {
        vec!["mock-model".to_string()]
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let metadata = request.metadata.clone();
        self.requests.lock().await.push(request);

        if self.should_fail {
            return Err(LlmError::RequestFailed("Mock LLM failure".to_string()));
        }

        let mut current = self.current_response.lock().await;
        let response_idx = *current % self.responses.len().max(1);
        *current += 1;

        let content = if self.responses.is_empty() {
            "Mock response".to_string()
        } else {
            self.responses[response_idx].clone()
        };

        Ok(CompletionResponse {
            content: Some(content),
            model: "mock-model".to_string(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            finish_reason: FinishReason::Stop,
            metadata,
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        if self.should_fail {
            Err(LlmError::RequestFailed(
                "Mock health check failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// Events captured from one executor run
#[derive(Debug)]
pub struct RecordedRun {
    pub result: AgentResult<()>,
    pub events: Vec<Event>,
}

impl RecordedRun {
    /// States of every status update, in order
    pub fn states(&self) -> Vec<TaskState> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::StatusUpdate(update) => Some(update.status.state),
                _ => None,
            })
            .collect()
    }

    /// Text of every agent message, whether standalone or attached to a status
    pub fn messages(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Message(message) => Some(message.text_content()),
                Event::StatusUpdate(update) => {
                    update.status.message.as_ref().map(Message::text_content)
                }
                _ => None,
            })
            .collect()
    }

    pub fn artifact_names(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::ArtifactUpdate(update) => update.artifact.name.clone(),
                _ => None,
            })
            .collect()
    }

    pub fn last_is_final(&self) -> bool {
        self.events.last().map(Event::is_final).unwrap_or(false)
    }
}

/// Drain everything currently buffered in a receiver
pub fn drain_events(receiver: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

/// Context for a fresh user message with optional send configuration
pub fn request_context(text: &str, configuration: Option<MessageSendConfiguration>) -> RequestContext {
    RequestContext::new(
        "task-test".to_string(),
        "ctx-test".to_string(),
        Message::user_text(text),
    )
    .with_configuration(configuration)
}

/// Run an executor to completion and collect the events it emitted
pub async fn run_executor<E: AgentExecutor + ?Sized>(
    executor: &E,
    ctx: &RequestContext,
) -> RecordedRun {
    let (queue, mut receiver) = EventQueue::new();
    let result = executor.execute(ctx, &queue).await;
    RecordedRun {
        result,
        events: drain_events(&mut receiver),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ChatMessage;

    #[tokio::test]
    async fn test_mock_cycles_responses_and_records_requests() {
        let provider = MockLlmProvider::new(vec!["a".to_string(), "b".to_string()]);

        for expected in ["a", "b", "a"] {
            let response = provider
                .complete(CompletionRequest::new("m", vec![ChatMessage::user("q")]))
                .await
                .unwrap();
            assert_eq!(response.content.as_deref(), Some(expected));
        }

        assert_eq!(provider.recorded_requests().await.len(), 3);
    }

    #[tokio::test]
    async fn test_mock_failure_still_records() {
        let provider = MockLlmProvider::with_failure();
        let result = provider
            .complete(CompletionRequest::new("m", vec![ChatMessage::user("q")]))
            .await;

        assert!(result.is_err());
        assert_eq!(provider.recorded_requests().await.len(), 1);
        assert!(provider.health_check().await.is_err());
    }
}
