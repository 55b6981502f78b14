//! Outbound A2A client used by the orchestrator and the CLI
//!
//! Agent cards are fetched once per base URL and cached for the life of the
//! client. [`A2aClient::call_agent`] folds every failure into a readable
//! string so a failed sub-task never aborts a whole job run.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use super::agent_card::AgentCard;
use super::executor::MessageSendConfiguration;
use super::jsonrpc::{JsonRpcRequest, MessageSendParams, METHOD_MESSAGE_SEND};
use super::types::Message;
use crate::agent_call_span;
use crate::config::ClientSection;
use crate::observability::metrics::metrics;

/// Failures talking to a remote agent
#[derive(Debug, Error)]
pub enum RemoteAgentError {
    #[error("agent card request returned status {0}")]
    CardStatus(u16),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("{0}")]
    Request(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for RemoteAgentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            RemoteAgentError::Connect(e.to_string())
        } else if e.is_timeout() {
            RemoteAgentError::Timeout(e.to_string())
        } else if e.is_decode() {
            RemoteAgentError::InvalidResponse(e.to_string())
        } else {
            RemoteAgentError::Request(e.to_string())
        }
    }
}

/// HTTP client for other A2A agents
pub struct A2aClient {
    http: reqwest::Client,
    card_cache: RwLock<HashMap<String, AgentCard>>,
}

impl A2aClient {
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self, RemoteAgentError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| RemoteAgentError::Request(e.to_string()))?;

        Ok(Self {
            http,
            card_cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn from_config(section: &ClientSection) -> Result<Self, RemoteAgentError> {
        Self::new(
            Duration::from_secs(section.timeout_secs),
            Duration::from_secs(section.connect_timeout_secs),
        )
    }

    fn base(url: &str) -> &str {
        url.trim_end_matches('/')
    }

    /// Fetch `GET {url}/.well-known/agent.json`, using the cache when possible
    pub async fn fetch_agent_card(&self, url: &str) -> Result<AgentCard, RemoteAgentError> {
        let base = Self::base(url);
        if let Some(card) = self.card_cache.read().await.get(base) {
            debug!(url = %base, "Agent card cache hit");
            return Ok(card.clone());
        }

        let response = self
            .http
            .get(format!("{base}/.well-known/agent.json"))
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(RemoteAgentError::CardStatus(status.as_u16()));
        }

        let card: AgentCard = response.json().await?;
        info!(url = %base, agent = %card.name, "Fetched agent card");
        self.card_cache
            .write()
            .await
            .insert(base.to_string(), card.clone());
        Ok(card)
    }

    pub async fn cached_card(&self, url: &str) -> Option<AgentCard> {
        self.card_cache.read().await.get(Self::base(url)).cloned()
    }

    /// Post a `message/send` with a single user text part and return the raw
    /// JSON-RPC response
    pub async fn send_message(
        &self,
        url: &str,
        text: &str,
        configuration: Option<MessageSendConfiguration>,
    ) -> Result<Value, RemoteAgentError> {
        let params = MessageSendParams {
            message: Message::user_text(text),
            configuration,
            metadata: None,
        };
        let request = JsonRpcRequest::new(
            json!(Uuid::new_v4().to_string()),
            METHOD_MESSAGE_SEND,
            params,
        )
        .map_err(|e| RemoteAgentError::Request(e.to_string()))?;

        let response = self
            .http
            .post(format!("{}/", Self::base(url)))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteAgentError::Request(format!(
                "HTTP {status} from {url}"
            )));
        }

        Ok(response.json().await?)
    }

    /// Call an agent and return its answer text. Never fails: errors come
    /// back as `"Error: ..."` strings.
    pub async fn call_agent(&self, url: &str, text: &str) -> String {
        let span = agent_call_span!(url = %url);
        async move {
            info!(
                preview = %text.chars().take(100).collect::<String>(),
                "Calling remote agent"
            );

            if let Err(e) = self.fetch_agent_card(url).await {
                warn!(error = %e, "Agent card fetch failed");
                metrics().remote_agent_called(false);
                return card_error_text(url, &e);
            }

            match self.send_message(url, text, None).await {
                Ok(response) => {
                    metrics().remote_agent_called(true);
                    first_artifact_text(&response).unwrap_or_else(|| {
                        serde_json::to_string_pretty(&response)
                            .unwrap_or_else(|_| response.to_string())
                    })
                }
                Err(e) => {
                    warn!(error = %e, "Remote agent call failed");
                    metrics().remote_agent_called(false);
                    format!("Error: Unexpected error sending message to agent at {url}: {e}")
                }
            }
        }
        .instrument(span)
        .await
    }
}

fn card_error_text(url: &str, error: &RemoteAgentError) -> String {
    match error {
        RemoteAgentError::CardStatus(code) => {
            format!("Error: Failed to fetch agent card from {url}. Status: {code}")
        }
        RemoteAgentError::Connect(_) => format!(
            "Error: Cannot connect to agent at {url}. Please ensure the agent server is running."
        ),
        RemoteAgentError::Timeout(_) => format!(
            "Error: Timeout connecting to agent at {url}. Please check if the agent server is responsive."
        ),
        other => format!("Error: Unexpected error connecting to agent at {url}: {other}"),
    }
}

/// First text part across `result.artifacts[*].parts[*]`
pub fn first_artifact_text(response: &Value) -> Option<String> {
    response
        .get("result")?
        .get("artifacts")?
        .as_array()?
        .iter()
        .filter_map(|artifact| artifact.get("parts").and_then(Value::as_array))
        .flatten()
        .find_map(|part| part.get("text").and_then(Value::as_str))
        .map(str::to_string)
}
