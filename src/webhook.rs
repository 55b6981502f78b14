//! Status callbacks to the web application that submitted a job run
//!
//! Delivery is single-shot: one POST per notification, success only on
//! `204 No Content`, failures logged and reported as `false`.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::a2a::executor::MessageSendConfiguration;
use crate::a2a::types::TaskState;
use crate::agent_call_span;
use crate::config::WebhookSection;
use crate::observability::metrics::metrics;

/// Where to deliver notifications for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub url: String,
    pub token: String,
}

impl WebhookConfig {
    /// Read `pushNotificationConfig`; a missing or empty url or token means
    /// no webhook
    pub fn from_configuration(configuration: Option<&MessageSendConfiguration>) -> Option<Self> {
        let push = configuration?.push_notification_config.as_ref()?;
        let url = push.url.as_deref().filter(|u| !u.trim().is_empty())?;
        let token = push.token.as_deref().filter(|t| !t.trim().is_empty())?;
        Some(Self {
            url: url.to_string(),
            token: token.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotificationStatus {
    pub state: TaskState,
    pub message: String,
}

/// One status callback about a task or one of its jobs
#[derive(Debug, Clone, PartialEq)]
pub struct TaskNotification {
    pub id: String,
    pub context_id: Option<String>,
    pub status: NotificationStatus,
    pub artifacts: Vec<Value>,
}

impl TaskNotification {
    pub fn new<I: Into<String>, M: Into<String>>(
        id: I,
        context_id: Option<&str>,
        state: TaskState,
        message: M,
    ) -> Self {
        Self {
            id: id.into(),
            context_id: context_id.map(str::to_string),
            status: NotificationStatus {
                state,
                message: message.into(),
            },
            artifacts: Vec::new(),
        }
    }

    pub fn with_artifact(mut self, artifact: Value) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// Body posted to the webhook receiver
    pub fn payload(&self) -> Value {
        json!({
            "id": self.id,
            "contextId": self.context_id.as_deref().unwrap_or("default"),
            "kind": "task",
            "status": self.status,
            "artifacts": self.artifacts,
        })
    }
}

/// Data artifact carrying one job's result
pub fn job_result_artifact(job_id: &str, result: &str) -> Value {
    json!({
        "artifactId": Uuid::new_v4().to_string(),
        "parts": [{
            "kind": "data",
            "data": {
                "jobId": job_id,
                "result": result,
                "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            }
        }]
    })
}

/// Fire-and-forget webhook sender
#[derive(Debug, Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
}

impl WebhookClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    pub fn from_config(section: &WebhookSection) -> Result<Self, reqwest::Error> {
        Self::new(Duration::from_secs(section.timeout_secs))
    }

    /// Deliver one notification. True only when the receiver answers 204.
    pub async fn notify(&self, config: &WebhookConfig, notification: &TaskNotification) -> bool {
        let span = agent_call_span!(url = %config.url, task_id = %notification.id);
        async move {
            debug!(state = ?notification.status.state, "Sending webhook notification");

            let result = self
                .http
                .post(&config.url)
                .bearer_auth(&config.token)
                .json(&notification.payload())
                .send()
                .await;

            let delivered = match result {
                Ok(response) if response.status() == reqwest::StatusCode::NO_CONTENT => {
                    info!(status = 204, "Webhook delivered");
                    true
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    warn!(status = status.as_u16(), body = %body, "Webhook rejected");
                    false
                }
                Err(e) => {
                    warn!(error = %e, "Webhook delivery failed");
                    false
                }
            };

            metrics().webhook_sent(delivered);
            delivered
        }
        .instrument(span)
        .await
    }
}
