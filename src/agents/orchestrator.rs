//! Orchestrator: turns requests into task breakdowns and runs approved jobs
//! on remote A2A agents
//!
//! A request is either a plain-text goal, which is decomposed into tasks
//! (LLM first, rule-based fallback), or an `{"type":"execute_jobs"}` JSON
//! document whose tasks are routed to remote agents one by one while the web
//! application is kept informed by webhook.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::emit_task_breakdown;
use super::llm_agent::ModelSettings;
use super::request::{
    extract_user_message, is_blocking, is_job_execution_request, jobs_from_request,
    task_data_parts,
};
use crate::a2a::agent_card::{AgentCard, AgentSkill};
use crate::a2a::client::A2aClient;
use crate::a2a::executor::{AgentExecutor, EventQueue, RequestContext, TaskUpdater};
use crate::a2a::types::TaskState;
use crate::config::AppConfig;
use crate::error::{AgentError, AgentResult};
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::observability::metrics::metrics;
use crate::routing::{unavailable_text, AgentRouter, RouteDecision};
use crate::templates::{Job, JobGenerator};
use crate::webhook::{job_result_artifact, TaskNotification, WebhookClient, WebhookConfig};

const SYSTEM_INSTRUCTION: &str = "You are an intelligent task decomposition agent that can analyze user requests and create structured, actionable tasks.

Available specialized A2A agents for task execution:
- trending: For finding trending topics and current events
- analyzer: For analyzing specific topics or trends
- host: For comprehensive analysis with quantitative data
- market_analysis: For comprehensive financial market analysis and detailed reports

Your role is to:
1. Understand user requests and break them down into specific, actionable tasks
2. Create detailed task descriptions and assign appropriate agents
3. Generate realistic project structures based on the type of request
4. Provide clear titles, descriptions, and agent assignments for each task

For task generation, analyze the user's request and create 2-5 concrete, executable tasks with:
- Clear titles and detailed descriptions
- Appropriate specialized agent assignments
- Logical ordering and dependencies
- Realistic effort estimates and capabilities

For job execution, coordinate with the assigned agents to complete the work.";

const AGENT_TYPES: &str = "Project Analyst, Frontend Specialist, Backend Engineer, Database Architect, QA Engineer, Travel Planning Specialist, Data Scientist, ML Engineer, E-commerce Developer, Payment Security Specialist, Scraping Specialist, Data Engineer, API Architect, Mobile Developer, DevOps Engineer, Full-Stack Developer";

/// User turn asking the LLM for a JSON array of 2-5 tasks
pub fn decomposition_prompt(message: &str) -> String {
    format!(
        r#"You are a professional task decomposition agent. Break down the following user request into 2-5 specific, actionable tasks.

User Request: "{message}"

For each task, provide:
1. A clear, concise title
2. A detailed description of what needs to be done
3. The most appropriate agent type from: {AGENT_TYPES}

Return the response as a JSON array of task objects with this structure:
[
    {{
        "title": "Task Title",
        "description": "Detailed description of the task",
        "assignedAgent": {{
            "name": "Agent Name",
            "description": "Agent expertise description",
            "capabilities": ["skill1", "skill2", "skill3"],
            "pricingUsdt": 2.5,
            "rating": 4.8,
            "completedTasks": 150
        }}
    }}
]"#
    )
}

/// Parse the JSON array embedded in an LLM reply, from the first `[` to the
/// last `]`. Elements that are not objects are skipped.
pub fn parse_llm_jobs(content: &str) -> AgentResult<Vec<Job>> {
    let start = content.find('[');
    let end = content.rfind(']');
    let items: Vec<Value> = match (start, end) {
        (Some(start), Some(end)) if start < end => serde_json::from_str(&content[start..=end])?,
        _ => return Err(AgentError::llm_error("No JSON array found in response")),
    };
    let jobs = items
        .into_iter()
        .filter(Value::is_object)
        .map(serde_json::from_value)
        .collect::<Result<Vec<Job>, _>>()?;
    if jobs.is_empty() {
        return Err(AgentError::llm_error("No tasks found in response"));
    }
    Ok(jobs)
}

/// `0x` followed by 40 random hex digits
fn random_wallet_address() -> String {
    let hex = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    format!("0x{}", &hex[..40])
}

pub struct OrchestratorExecutor {
    url: String,
    provider: Option<Arc<dyn LlmProvider>>,
    settings: ModelSettings,
    fallback: JobGenerator,
    agent_counter: AtomicU64,
    router: AgentRouter,
    client: Arc<A2aClient>,
    webhook: WebhookClient,
}

impl OrchestratorExecutor {
    pub fn new(
        url: impl Into<String>,
        provider: Option<Arc<dyn LlmProvider>>,
        settings: ModelSettings,
        router: AgentRouter,
        client: Arc<A2aClient>,
        webhook: WebhookClient,
    ) -> Self {
        Self {
            url: url.into(),
            provider,
            settings,
            fallback: JobGenerator::new(false),
            agent_counter: AtomicU64::new(0),
            router,
            client,
            webhook,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        url: impl Into<String>,
        provider: Option<Arc<dyn LlmProvider>>,
    ) -> AgentResult<Self> {
        let client = A2aClient::from_config(&config.client)
            .map_err(|e| AgentError::internal_error(e.to_string()))?;
        Ok(Self::new(
            url,
            provider,
            ModelSettings::from(&config.llm),
            AgentRouter::new(config.remote_agents.clone()),
            Arc::new(client),
            WebhookClient::from_config(&config.webhook)
                .map_err(|e| AgentError::internal_error(e.to_string()))?,
        ))
    }

    fn next_agent_id(&self) -> String {
        format!(
            "agent-{}",
            self.agent_counter.fetch_add(1, Ordering::Relaxed) + 1
        )
    }

    /// Fill the fields an LLM tends to leave out
    fn complete_llm_jobs(&self, jobs: &mut [Job]) {
        for job in jobs {
            job.id.get_or_insert_with(|| Uuid::new_v4().to_string());
            job.status.get_or_insert_with(|| "submitted".to_string());
            if let Some(agent) = job.assigned_agent.as_mut() {
                if agent.id.is_none() {
                    agent.id = Some(self.next_agent_id());
                }
                agent.wallet_address.get_or_insert_with(random_wallet_address);
            }
        }
    }

    async fn generate_jobs_with_llm(
        &self,
        provider: &dyn LlmProvider,
        message: &str,
    ) -> AgentResult<Vec<Job>> {
        let request = CompletionRequest::new(
            self.settings.model.clone(),
            vec![
                ChatMessage::system(SYSTEM_INSTRUCTION),
                ChatMessage::user(decomposition_prompt(message)),
            ],
        )
        .with_temperature(self.settings.temperature)
        .with_max_tokens(self.settings.max_tokens)
        .with_metadata("agent", "orchestrator");

        let result = provider.complete(request).await.and_then(|r| r.into_text());
        metrics().llm_request(result.is_ok());
        let content = result?;
        debug!(chars = content.len(), "LLM decomposition received");

        let mut jobs = parse_llm_jobs(&content)?;
        self.complete_llm_jobs(&mut jobs);
        Ok(jobs)
    }

    /// LLM decomposition when a provider is configured, rule-based otherwise
    /// or on any LLM failure
    pub async fn generate_jobs(&self, message: &str) -> Vec<Job> {
        if let Some(provider) = &self.provider {
            match self.generate_jobs_with_llm(provider.as_ref(), message).await {
                Ok(jobs) => {
                    info!(jobs = jobs.len(), "Generated tasks with LLM");
                    return jobs;
                }
                Err(e) => warn!(error = %e, "LLM task generation failed, using rule-based fallback"),
            }
        } else {
            debug!("No LLM provider configured, using rule-based generation");
        }
        self.fallback.generate(message)
    }

    async fn generate_tasks(
        &self,
        message: &str,
        blocking: bool,
        updater: &TaskUpdater,
    ) -> AgentResult<()> {
        let jobs = self.generate_jobs(message).await;
        let parts = task_data_parts(&jobs, message, updater.context_id());
        info!(tasks = parts.len(), blocking, "Sending task breakdown");
        emit_task_breakdown(updater, parts, blocking)
    }

    /// Run one job description on the agent the router picks
    pub async fn execute_task_with_agent(&self, description: &str) -> String {
        match self.router.route(description) {
            RouteDecision::Remote { url, .. } => self.client.call_agent(&url, description).await,
            RouteDecision::Unavailable { agent } => unavailable_text(agent, description),
        }
    }

    async fn execute_jobs(&self, ctx: &RequestContext, message: &str) {
        let Some(webhook) = WebhookConfig::from_configuration(ctx.configuration.as_ref()) else {
            warn!("No complete webhook configuration, skipping job execution");
            return;
        };

        let task_id = ctx.task_id.as_str();
        let context_id = Some(ctx.context_id.as_str());
        self.webhook
            .notify(
                &webhook,
                &TaskNotification::new(
                    task_id,
                    context_id,
                    TaskState::Working,
                    "Starting job execution with A2A agents",
                ),
            )
            .await;

        let tasks = jobs_from_request(message);
        for (i, task) in tasks.iter().enumerate() {
            let job_id = format!("{task_id}-job-{i}");
            let title = task
                .get("title")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Task {}", i + 1));
            let description = task
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default();

            self.webhook
                .notify(
                    &webhook,
                    &TaskNotification::new(
                        &job_id,
                        context_id,
                        TaskState::Working,
                        format!("Executing: {title}"),
                    ),
                )
                .await;

            let result = self.execute_task_with_agent(description).await;

            let notification = TaskNotification::new(
                &job_id,
                context_id,
                TaskState::Completed,
                format!("Completed: {title}"),
            )
            .with_artifact(job_result_artifact(&job_id, &result));
            self.webhook.notify(&webhook, &notification).await;
        }

        self.webhook
            .notify(
                &webhook,
                &TaskNotification::new(
                    task_id,
                    context_id,
                    TaskState::Completed,
                    format!("Successfully executed {} jobs with A2A agents", tasks.len()),
                ),
            )
            .await;
        info!(jobs = tasks.len(), "Job execution finished");
    }

    async fn run(&self, ctx: &RequestContext, updater: &TaskUpdater) -> AgentResult<()> {
        let message = extract_user_message(&ctx.message);
        let blocking = is_blocking(ctx.configuration.as_ref());
        info!(blocking, "Orchestrator processing request");

        if is_job_execution_request(&message) {
            info!("Detected job execution request");
            self.execute_jobs(ctx, &message).await;
            updater.complete()
        } else {
            info!("Detected task generation request");
            self.generate_tasks(&message, blocking, updater).await
        }
    }
}

#[async_trait]
impl AgentExecutor for OrchestratorExecutor {
    fn card(&self) -> AgentCard {
        AgentCard::new(
            "A2A Orchestrator Agent",
            "Orchestrator agent for intelligent task decomposition, project structuring, and job execution using OpenAI and specialized A2A agents",
            &self.url,
        )
        .with_skill(
            AgentSkill::new(
                "orchestrator",
                "Orchestrator",
                "Orchestrate intelligent task decomposition and execution using OpenAI and specialized A2A agents",
            )
            .with_tags(&["orchestration", "task-management", "ai", "agents", "decomposition"])
            .with_examples(&[
                "Coordinate a multi-step project with several specialized agents",
                "Orchestrate the execution of a complex workflow using multiple A2A agents",
                "Manage and assign jobs to the best-suited agent for each task",
                "Oversee the progress of a project and ensure timely completion",
                "Integrate OpenAI-powered planning with agent-based execution",
            ]),
        )
    }

    async fn execute(&self, ctx: &RequestContext, queue: &EventQueue) -> AgentResult<()> {
        let updater = TaskUpdater::new(queue.clone(), &ctx.task_id, &ctx.context_id);
        if let Err(e) = self.run(ctx, &updater).await {
            error!(error = %e, "Orchestrator failed");
            updater.failed(None)?;
        }
        Ok(())
    }
}
