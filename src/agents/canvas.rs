//! Canvas agent: answers planning requests with a `createCanvas` tool call
//! carrying a canned task breakdown

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use super::request::extract_current_request;
use crate::a2a::agent_card::{AgentCard, AgentSkill};
use crate::a2a::executor::{AgentExecutor, EventQueue, RequestContext, TaskUpdater};
use crate::a2a::types::{utc_timestamp, Artifact, Part, TaskState};
use crate::config::AppConfig;
use crate::error::AgentResult;
use crate::templates::{canvas_title, is_canvas_request, CanvasTaskGenerator};

const CANVAS_FUNCTION: &str = "createCanvas";

pub const DEFAULT_REPLY: &str = "Hello! I can help you create task canvases. Try asking me to 'create a canvas for building a web application'.";

pub struct CanvasAgentExecutor {
    url: String,
    toolcall_delay: Duration,
    generator: CanvasTaskGenerator,
}

impl CanvasAgentExecutor {
    pub fn new(url: impl Into<String>, toolcall_delay: Duration) -> Self {
        Self {
            url: url.into(),
            toolcall_delay,
            generator: CanvasTaskGenerator::new(),
        }
    }

    pub fn from_config(config: &AppConfig, url: impl Into<String>) -> Self {
        Self::new(
            url,
            Duration::from_millis(config.jobs.canvas_toolcall_delay_ms),
        )
    }

    async fn run(&self, message: &str, updater: &TaskUpdater) -> AgentResult<()> {
        updater.update_status(TaskState::Working, None, false)?;

        if is_canvas_request(message) {
            info!("Canvas request detected, calling {}", CANVAS_FUNCTION);
            self.create_canvas(message, updater).await?;
        } else {
            info!("Non-canvas request, sending default reply");
            updater.send_message(DEFAULT_REPLY)?;
        }

        updater.complete()
    }

    async fn create_canvas(&self, message: &str, updater: &TaskUpdater) -> AgentResult<()> {
        let tasks = self.generator.generate(message);
        let toolcall_id = Uuid::new_v4().to_string();

        let initiated = json!({
            "type": "toolcall_initiated",
            "toolcall": {
                "id": toolcall_id,
                "function": CANVAS_FUNCTION,
                "arguments": {
                    "title": canvas_title(message),
                    "tasks": tasks,
                },
                "status": "initiated",
            },
            "context_id": updater.context_id(),
            "timestamp": utc_timestamp(),
        });
        updater.push_artifact(
            Artifact::new(vec![Part::data(initiated)]).with_id(format!("toolcall-{toolcall_id}")),
            Some(false),
            false,
        )?;

        tokio::time::sleep(self.toolcall_delay).await;

        let completed = json!({
            "type": "toolcall_completed",
            "toolcall": {
                "id": toolcall_id,
                "function": CANVAS_FUNCTION,
                "status": "completed",
                "result": format!("Canvas created with {} tasks", tasks.len()),
            },
            "context_id": updater.context_id(),
            "timestamp": utc_timestamp(),
        });
        updater.push_artifact(
            Artifact::new(vec![Part::data(completed)])
                .with_id(format!("toolcall-result-{toolcall_id}")),
            Some(true),
            false,
        )?;

        info!(tasks = tasks.len(), "Canvas tool call completed");
        Ok(())
    }
}

#[async_trait]
impl AgentExecutor for CanvasAgentExecutor {
    fn card(&self) -> AgentCard {
        AgentCard::new(
            "Canvas Agent",
            "Specialized agent for creating interactive task canvases and coordinating multi-agent workflows",
            &self.url,
        )
        .with_version("0.1.0")
        .with_input_modes(&["text"])
        .with_output_modes(&["text"])
        .with_skill(
            AgentSkill::new(
                "canvas_management",
                "Canvas Management",
                "Creates and manages interactive task canvases with agent coordination",
            )
            .with_tags(&["canvas", "project-management", "task-coordination"])
            .with_examples(&[
                "Create a canvas for building a web scraping system",
                "Break down complex projects into manageable tasks",
                "Coordinate multiple agents for task execution",
            ]),
        )
    }

    async fn execute(&self, ctx: &RequestContext, queue: &EventQueue) -> AgentResult<()> {
        let message = extract_current_request(&ctx.message);
        info!(message = %message, "Canvas agent processing request");

        let updater = TaskUpdater::new(queue.clone(), &ctx.task_id, &ctx.context_id);
        if let Err(e) = self.run(&message, &updater).await {
            error!(error = %e, "Canvas agent failed");
            updater.failed(None)?;
        }
        Ok(())
    }
}
