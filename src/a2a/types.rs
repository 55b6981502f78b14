//! A2A message, task and event types
//!
//! These mirror the JSON shapes exchanged between agents (camelCase field
//! names, `kind` discriminators) closely enough for interoperability, without
//! trying to cover the full protocol surface.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Sender of a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One piece of message or artifact content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
    Data { data: Value },
}

impl Part {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn data(data: Value) -> Self {
        Part::Data { data }
    }

    /// Text content, if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::Data { .. } => None,
        }
    }
}

fn message_kind() -> String {
    "message".to_string()
}

fn task_kind() -> String {
    "task".to_string()
}

fn status_update_kind() -> String {
    "status-update".to_string()
}

fn artifact_update_kind() -> String {
    "artifact-update".to_string()
}

/// A single conversational turn
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(default = "message_kind")]
    pub kind: String,
}

impl Message {
    /// User message with a single text part
    pub fn user_text<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
            message_id: Uuid::new_v4().simple().to_string(),
            task_id: None,
            context_id: None,
            kind: message_kind(),
        }
    }

    /// All text parts joined by newlines
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Build an agent-authored text message bound to a task
pub fn new_agent_text_message<S: Into<String>>(
    text: S,
    context_id: Option<&str>,
    task_id: Option<&str>,
) -> Message {
    Message {
        role: Role::Agent,
        parts: vec![Part::text(text)],
        message_id: Uuid::new_v4().to_string(),
        task_id: task_id.map(str::to_string),
        context_id: context_id.map(str::to_string),
        kind: message_kind(),
    }
}

/// Task lifecycle states
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Canceled,
    Failed,
    Rejected,
    Unknown,
}

impl TaskState {
    /// No further updates are expected once a task reaches one of these
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Canceled | TaskState::Failed | TaskState::Rejected
        )
    }
}

/// ISO 8601 UTC timestamp with a trailing `Z`
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl TaskStatus {
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            message: None,
            timestamp: Some(utc_timestamp()),
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }
}

/// Output produced by an agent for a task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub artifact_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub parts: Vec<Part>,
}

impl Artifact {
    pub fn new(parts: Vec<Part>) -> Self {
        Self {
            artifact_id: Uuid::new_v4().to_string(),
            name: None,
            parts,
        }
    }

    pub fn with_id<S: Into<String>>(mut self, artifact_id: S) -> Self {
        self.artifact_id = artifact_id.into();
        self
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub context_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub history: Vec<Message>,
    #[serde(default = "task_kind")]
    pub kind: String,
}

impl Task {
    /// New submitted task seeded with the incoming message
    pub fn new_submitted(id: String, context_id: String, message: Message) -> Self {
        Self {
            id,
            context_id,
            status: TaskStatus::new(TaskState::Submitted),
            artifacts: Vec::new(),
            history: vec![message],
            kind: task_kind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdateEvent {
    pub task_id: String,
    pub context_id: String,
    pub status: TaskStatus,
    #[serde(rename = "final")]
    pub is_final: bool,
    #[serde(default = "status_update_kind")]
    pub kind: String,
}

impl TaskStatusUpdateEvent {
    pub fn new(task_id: &str, context_id: &str, status: TaskStatus, is_final: bool) -> Self {
        Self {
            task_id: task_id.to_string(),
            context_id: context_id.to_string(),
            status,
            is_final,
            kind: status_update_kind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskArtifactUpdateEvent {
    pub task_id: String,
    pub context_id: String,
    pub artifact: Artifact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_chunk: Option<bool>,
    /// Whether the producer considers this the last event of the task
    #[serde(skip)]
    pub is_final: bool,
    #[serde(default = "artifact_update_kind")]
    pub kind: String,
}

impl TaskArtifactUpdateEvent {
    pub fn new(task_id: &str, context_id: &str, artifact: Artifact) -> Self {
        Self {
            task_id: task_id.to_string(),
            context_id: context_id.to_string(),
            artifact,
            append: None,
            last_chunk: None,
            is_final: false,
            kind: artifact_update_kind(),
        }
    }

    pub fn with_last_chunk(mut self, last_chunk: bool) -> Self {
        self.last_chunk = Some(last_chunk);
        self
    }

    pub fn with_final(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }
}

/// Anything an executor can push onto its event queue
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Message(Message),
    Task(Task),
    StatusUpdate(TaskStatusUpdateEvent),
    ArtifactUpdate(TaskArtifactUpdateEvent),
}

impl Event {
    /// True when this event closes the stream for its task
    pub fn is_final(&self) -> bool {
        match self {
            Event::StatusUpdate(update) => update.is_final,
            Event::ArtifactUpdate(update) => update.is_final,
            Event::Message(_) | Event::Task(_) => false,
        }
    }
}

impl From<Message> for Event {
    fn from(message: Message) -> Self {
        Event::Message(message)
    }
}

impl From<Task> for Event {
    fn from(task: Task) -> Self {
        Event::Task(task)
    }
}

impl From<TaskStatusUpdateEvent> for Event {
    fn from(update: TaskStatusUpdateEvent) -> Self {
        Event::StatusUpdate(update)
    }
}

impl From<TaskArtifactUpdateEvent> for Event {
    fn from(update: TaskArtifactUpdateEvent) -> Self {
        Event::ArtifactUpdate(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_part_kind_tagging() {
        let text = serde_json::to_value(Part::text("hello")).unwrap();
        assert_eq!(text, json!({"kind": "text", "text": "hello"}));

        let data = serde_json::to_value(Part::data(json!({"type": "task"}))).unwrap();
        assert_eq!(data, json!({"kind": "data", "data": {"type": "task"}}));
    }

    #[test]
    fn test_message_parses_wire_shape() {
        let raw = json!({
            "role": "user",
            "parts": [{"kind": "text", "text": "Plan a trip"}],
            "messageId": "abc123"
        });

        let message: Message = serde_json::from_value(raw).unwrap();
        assert_eq!(message.role, Role::User);
        assert_eq!(message.message_id, "abc123");
        assert_eq!(message.kind, "message");
        assert_eq!(message.text_content(), "Plan a trip");
        assert!(message.task_id.is_none());
    }

    #[test]
    fn test_task_state_wire_names() {
        assert_eq!(
            serde_json::to_value(TaskState::InputRequired).unwrap(),
            json!("input-required")
        );
        assert_eq!(
            serde_json::from_value::<TaskState>(json!("completed")).unwrap(),
            TaskState::Completed
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(TaskState::Canceled.is_terminal());
        assert!(TaskState::Rejected.is_terminal());
        assert!(!TaskState::Working.is_terminal());
        assert!(!TaskState::InputRequired.is_terminal());
        assert!(!TaskState::Submitted.is_terminal());
    }

    #[test]
    fn test_status_update_serializes_final_keyword() {
        let update = TaskStatusUpdateEvent::new(
            "t-1",
            "c-1",
            TaskStatus::new(TaskState::Completed),
            true,
        );

        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["final"], json!(true));
        assert_eq!(value["taskId"], json!("t-1"));
        assert_eq!(value["kind"], json!("status-update"));
        assert!(Event::from(update).is_final());
    }

    #[test]
    fn test_artifact_update_final_is_not_serialized() {
        let update = TaskArtifactUpdateEvent::new("t-1", "c-1", Artifact::new(vec![]))
            .with_last_chunk(true)
            .with_final(true);

        let value = serde_json::to_value(&update).unwrap();
        assert!(value.get("final").is_none());
        assert_eq!(value["lastChunk"], json!(true));
        assert!(Event::from(update).is_final());
    }

    #[test]
    fn test_agent_text_message_binding() {
        let message = new_agent_text_message("done", Some("ctx"), Some("task"));
        assert_eq!(message.role, Role::Agent);
        assert_eq!(message.context_id.as_deref(), Some("ctx"));
        assert_eq!(message.task_id.as_deref(), Some("task"));
        assert_eq!(message.text_content(), "done");
    }

    #[test]
    fn test_utc_timestamp_has_z_suffix() {
        assert!(utc_timestamp().ends_with('Z'));
    }
}
