//! Execution contract between the HTTP server and agent logic
//!
//! The server builds a [`RequestContext`] per `message/send` call and hands the
//! executor an [`EventQueue`]. Executors never write responses directly; they
//! push events and the server folds them into the stored task.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::agent_card::AgentCard;
use super::types::{
    new_agent_text_message, Artifact, Event, Message, Part, Task, TaskArtifactUpdateEvent,
    TaskState, TaskStatus, TaskStatusUpdateEvent,
};
use crate::error::{AgentError, AgentResult};

/// Where and how to deliver asynchronous status callbacks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PushNotificationConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Client-supplied options on `message/send`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageSendConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accepted_output_modes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_notification_config: Option<PushNotificationConfig>,
}

/// Everything an executor knows about the request it is serving
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub task_id: String,
    pub context_id: String,
    pub message: Message,
    pub configuration: Option<MessageSendConfiguration>,
    pub current_task: Option<Task>,
}

impl RequestContext {
    pub fn new(task_id: String, context_id: String, message: Message) -> Self {
        Self {
            task_id,
            context_id,
            message,
            configuration: None,
            current_task: None,
        }
    }

    pub fn with_configuration(mut self, configuration: Option<MessageSendConfiguration>) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn with_current_task(mut self, task: Option<Task>) -> Self {
        self.current_task = task;
        self
    }

    /// Raw user input: all text parts joined by newlines
    pub fn get_user_input(&self) -> String {
        self.message.text_content()
    }
}

/// Producer side of an executor's event stream
#[derive(Debug, Clone)]
pub struct EventQueue {
    sender: mpsc::UnboundedSender<Event>,
}

impl EventQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Push an event; fails only if the consumer has gone away
    pub fn enqueue<E: Into<Event>>(&self, event: E) -> AgentResult<()> {
        self.sender
            .send(event.into())
            .map_err(|_| AgentError::internal_error("event queue closed"))
    }
}

/// Convenience wrapper that stamps task and context ids onto events
#[derive(Debug, Clone)]
pub struct TaskUpdater {
    queue: EventQueue,
    task_id: String,
    context_id: String,
}

impl TaskUpdater {
    pub fn new(queue: EventQueue, task_id: &str, context_id: &str) -> Self {
        Self {
            queue,
            task_id: task_id.to_string(),
            context_id: context_id.to_string(),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Agent text message bound to this task
    pub fn new_agent_message<S: Into<String>>(&self, text: S) -> Message {
        new_agent_text_message(text, Some(&self.context_id), Some(&self.task_id))
    }

    pub fn update_status(
        &self,
        state: TaskState,
        message: Option<Message>,
        is_final: bool,
    ) -> AgentResult<()> {
        let mut status = TaskStatus::new(state);
        status.message = message;
        self.queue.enqueue(TaskStatusUpdateEvent::new(
            &self.task_id,
            &self.context_id,
            status,
            is_final,
        ))
    }

    pub fn add_artifact(&self, parts: Vec<Part>, name: &str) -> AgentResult<()> {
        let artifact = Artifact::new(parts).with_name(name);
        self.queue.enqueue(TaskArtifactUpdateEvent::new(
            &self.task_id,
            &self.context_id,
            artifact,
        ))
    }

    /// Push a prepared artifact, keeping its id
    pub fn push_artifact(
        &self,
        artifact: Artifact,
        last_chunk: Option<bool>,
        is_final: bool,
    ) -> AgentResult<()> {
        let mut update = TaskArtifactUpdateEvent::new(&self.task_id, &self.context_id, artifact)
            .with_final(is_final);
        update.last_chunk = last_chunk;
        self.queue.enqueue(update)
    }

    /// Push an agent text message bound to this task
    pub fn send_message<S: Into<String>>(&self, text: S) -> AgentResult<()> {
        self.queue.enqueue(self.new_agent_message(text))
    }

    pub fn complete(&self) -> AgentResult<()> {
        self.update_status(TaskState::Completed, None, true)
    }

    pub fn failed(&self, message: Option<Message>) -> AgentResult<()> {
        self.update_status(TaskState::Failed, message, true)
    }
}

/// Logic behind one agent endpoint
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Card advertised at `/.well-known/agent.json`
    fn card(&self) -> AgentCard;

    /// Handle one `message/send` request by pushing events onto `queue`
    async fn execute(&self, ctx: &RequestContext, queue: &EventQueue) -> AgentResult<()>;

    /// Cancel a running task. None of the demo agents support it.
    async fn cancel(&self, ctx: &RequestContext, _queue: &EventQueue) -> AgentResult<()> {
        Err(AgentError::task_not_cancelable(&ctx.task_id))
    }
}
