//! Helpers for reading incoming requests and shaping task payloads

use serde_json::{json, Value};
use uuid::Uuid;

use crate::a2a::executor::MessageSendConfiguration;
use crate::a2a::types::{utc_timestamp, Message, Part};
use crate::templates::Job;

const CURRENT_REQUEST_MARKER: &str = "Current request:";

/// Client metadata lines dropped before the request is interpreted
const METADATA_MARKERS: &[&str] = &["Urgency:", "Context:", "CanvasDocumentId:"];

fn first_text(message: &Message) -> Option<&str> {
    message
        .parts
        .iter()
        .filter_map(Part::as_text)
        .find(|text| !text.is_empty())
}

fn after_last_marker(text: &str) -> Option<&str> {
    text.rfind(CURRENT_REQUEST_MARKER)
        .map(|idx| text[idx + CURRENT_REQUEST_MARKER.len()..].trim())
}

/// The user's request with client metadata stripped.
///
/// Uses the first non-empty text part. Lines carrying metadata markers are
/// removed and a `Current request:` line is reduced to the text after its
/// last marker.
pub fn extract_user_message(message: &Message) -> String {
    let Some(text) = first_text(message) else {
        return String::new();
    };

    text.split('\n')
        .filter(|line| !METADATA_MARKERS.iter().any(|m| line.contains(m)))
        .map(|line| after_last_marker(line).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Canvas variant: everything after the last `Current request:` in the first
/// text part, or the whole text when there is no marker
pub fn extract_current_request(message: &Message) -> String {
    match first_text(message) {
        Some(text) => after_last_marker(text).unwrap_or(text).to_string(),
        None => String::new(),
    }
}

/// True for a JSON object whose `type` is `execute_jobs`
pub fn is_job_execution_request(text: &str) -> bool {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|value| value.get("type").and_then(Value::as_str).map(|t| t == "execute_jobs"))
        .unwrap_or(false)
}

/// Requests are blocking unless the client explicitly says otherwise
pub fn is_blocking(configuration: Option<&MessageSendConfiguration>) -> bool {
    configuration.and_then(|c| c.blocking).unwrap_or(true)
}

/// `tasks` array of an execute_jobs request; empty when it cannot be read
pub fn jobs_from_request(text: &str) -> Vec<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|mut value| match value.get_mut("tasks").map(Value::take) {
            Some(Value::Array(tasks)) => Some(tasks),
            _ => None,
        })
        .unwrap_or_default()
}

pub fn tasks_created_text(count: usize) -> String {
    format!(
        "I've analyzed your request and created {count} structured tasks for execution. Each task has been assigned to a specialized agent and is ready for processing."
    )
}

/// Data part describing one generated task, as the web application expects it
pub fn task_data_part(
    task_id: String,
    job: &Job,
    index: usize,
    user_message: &str,
    context_id: &str,
) -> Part {
    let title = job
        .title
        .clone()
        .unwrap_or_else(|| format!("Task {}", index + 1));
    let description = job
        .description
        .clone()
        .unwrap_or_else(|| format!("Generated task {} for: {user_message}", index + 1));

    Part::data(json!({
        "type": "task",
        "task": {
            "id": task_id,
            "title": title,
            "description": description,
            "status": "submitted",
            "assignedAgent": job.assigned_agent,
            "contextId": context_id,
            "priority": "medium",
            "createdAt": utc_timestamp(),
            "webhookToken": Uuid::new_v4().to_string(),
            "order": index,
            "metadata": {
                "source": "a2a_agent",
                "userRequest": user_message,
                "generatedAt": utc_timestamp(),
            }
        }
    }))
}

/// Task data parts for a whole breakdown, each with a fresh uuid id
pub fn task_data_parts(jobs: &[Job], user_message: &str, context_id: &str) -> Vec<Part> {
    jobs.iter()
        .enumerate()
        .map(|(i, job)| {
            task_data_part(
                Uuid::new_v4().to_string(),
                job,
                i,
                user_message,
                context_id,
            )
        })
        .collect()
}
