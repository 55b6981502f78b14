//! In-memory task store
//!
//! Holds every task an agent has seen for the life of the process. Executor
//! events are folded into the stored task as they arrive.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::types::{Event, Task, TaskState, TaskStatus};

/// Thread-safe map of task id to task
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<HashMap<String, Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn save(&self, task: Task) {
        self.tasks.write().await.insert(task.id.clone(), task);
    }

    pub async fn get(&self, task_id: &str) -> Option<Task> {
        self.tasks.read().await.get(task_id).cloned()
    }

    pub async fn delete(&self, task_id: &str) -> Option<Task> {
        self.tasks.write().await.remove(task_id)
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Fold one executor event into the task it belongs to.
    ///
    /// Events for tasks that are not yet stored create a working placeholder
    /// under `task_id`/`context_id`.
    pub async fn apply(&self, task_id: &str, context_id: &str, event: &Event) {
        let mut tasks = self.tasks.write().await;

        if let Event::Task(task) = event {
            tasks.insert(task.id.clone(), task.clone());
            return;
        }

        let target_id = match event {
            Event::StatusUpdate(update) => update.task_id.as_str(),
            Event::ArtifactUpdate(update) => update.task_id.as_str(),
            Event::Message(message) => message.task_id.as_deref().unwrap_or(task_id),
            Event::Task(_) => task_id,
        };

        let task = tasks.entry(target_id.to_string()).or_insert_with(|| Task {
            id: target_id.to_string(),
            context_id: context_id.to_string(),
            status: TaskStatus::new(TaskState::Working),
            artifacts: Vec::new(),
            history: Vec::new(),
            kind: "task".to_string(),
        });

        match event {
            Event::StatusUpdate(update) => {
                if let Some(previous) = task.status.message.take() {
                    task.history.push(previous);
                }
                debug!(
                    task_id = %task.id,
                    from = ?task.status.state,
                    to = ?update.status.state,
                    "Task state transition"
                );
                task.status = update.status.clone();
            }
            Event::ArtifactUpdate(update) => {
                let existing = task
                    .artifacts
                    .iter_mut()
                    .find(|a| a.artifact_id == update.artifact.artifact_id);

                match (existing, update.append.unwrap_or(false)) {
                    (Some(artifact), true) => {
                        artifact.parts.extend(update.artifact.parts.iter().cloned());
                    }
                    (Some(artifact), false) => {
                        *artifact = update.artifact.clone();
                    }
                    (None, _) => task.artifacts.push(update.artifact.clone()),
                }
            }
            Event::Message(message) => task.history.push(message.clone()),
            Event::Task(_) => {}
        }
    }
}
