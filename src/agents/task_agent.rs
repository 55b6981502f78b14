//! Task agent: rule-based task decomposition plus a simulated job runner
//! that reports progress by webhook

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::emit_task_breakdown;
use super::request::{extract_user_message, is_blocking, is_job_execution_request, task_data_part};
use crate::a2a::agent_card::{AgentCard, AgentSkill};
use crate::a2a::executor::{AgentExecutor, EventQueue, RequestContext, TaskUpdater};
use crate::a2a::types::{Part, TaskState};
use crate::config::AppConfig;
use crate::error::{AgentError, AgentResult};
use crate::templates::JobGenerator;
use crate::webhook::{job_result_artifact, TaskNotification, WebhookClient, WebhookConfig};

/// Request the simulated runner expands into its sample jobs
const SAMPLE_JOBS_REQUEST: &str = "Execute sample jobs";

const DECOMPOSITION_GUIDE: &str = "\
You are a professional task decomposition agent. Your role is to break down user requests into specific, actionable tasks.

TASK GENERATION GUIDELINES:
1. Create 2-5 concrete, executable tasks
2. Each task should have a clear title and detailed description
3. Assign appropriate specialized agents to each task
4. Tasks should be logically ordered and interdependent when necessary
5. Include realistic effort estimates and agent capabilities

AGENT TYPES AVAILABLE:
- Travel Planner: Itinerary creation, destination research, booking assistance
- Recipe Developer: Meal planning, recipe creation, dietary adjustments
- Event Coordinator: Event planning, vendor coordination, timeline management
- Personal Shopper: Product research, price comparison, purchase recommendations
- Fitness Coach: Workout planning, fitness goal setting, progress tracking
- Financial Advisor: Budget planning, investment advice, expense tracking
- Home Organizer: Space optimization, decluttering strategies, storage solutions
- Learning Mentor: Study planning, resource gathering, skill development guidance

Now process this user request:";

/// User message prefixed with the decomposition guide
pub fn enhance_with_system_prompt(message: &str) -> String {
    format!("{DECOMPOSITION_GUIDE}\n\nUser Request: {message}")
}

pub struct TaskAgentExecutor {
    url: String,
    generator: JobGenerator,
    webhook: WebhookClient,
    job_delay: Duration,
}

impl TaskAgentExecutor {
    pub fn new(url: impl Into<String>, webhook: WebhookClient, job_delay: Duration) -> Self {
        Self {
            url: url.into(),
            generator: JobGenerator::new(true),
            webhook,
            job_delay,
        }
    }

    pub fn from_config(config: &AppConfig, url: impl Into<String>) -> AgentResult<Self> {
        let webhook = WebhookClient::from_config(&config.webhook)
            .map_err(|e| AgentError::internal_error(e.to_string()))?;
        Ok(Self::new(
            url,
            webhook,
            Duration::from_millis(config.jobs.simulated_job_delay_ms),
        ))
    }

    fn generate_tasks(
        &self,
        message: &str,
        blocking: bool,
        updater: &TaskUpdater,
    ) -> AgentResult<()> {
        let enhanced = enhance_with_system_prompt(message);
        debug!(chars = enhanced.len(), "Enhanced decomposition prompt");

        let jobs = self.generator.generate(message);
        let parts: Vec<Part> = jobs
            .iter()
            .enumerate()
            .map(|(i, job)| {
                let id = job
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("task-{}", Uuid::new_v4()));
                task_data_part(id, job, i, message, updater.context_id())
            })
            .collect();

        info!(tasks = parts.len(), blocking, "Generated task breakdown");
        emit_task_breakdown(updater, parts, blocking)
    }

    async fn execute_jobs(&self, ctx: &RequestContext) {
        let Some(webhook) = WebhookConfig::from_configuration(ctx.configuration.as_ref()) else {
            warn!("No webhook configuration found for job execution");
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
                    "Starting job execution",
                ),
            )
            .await;

        let jobs = self.generator.generate(SAMPLE_JOBS_REQUEST);
        for (i, job) in jobs.iter().enumerate() {
            let job_id = format!("{task_id}-job-{i}");
            let title = job.title.as_deref().unwrap_or_default();

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

            tokio::time::sleep(self.job_delay).await;

            let notification = TaskNotification::new(
                &job_id,
                context_id,
                TaskState::Completed,
                format!("Completed: {title}"),
            )
            .with_artifact(job_result_artifact(
                &job_id,
                &format!("Successfully completed {title}"),
            ));
            self.webhook.notify(&webhook, &notification).await;
        }

        self.webhook
            .notify(
                &webhook,
                &TaskNotification::new(
                    task_id,
                    context_id,
                    TaskState::Completed,
                    format!("Successfully executed {} jobs", jobs.len()),
                ),
            )
            .await;
        info!(jobs = jobs.len(), "Simulated job execution finished");
    }

    async fn run(&self, ctx: &RequestContext, updater: &TaskUpdater) -> AgentResult<()> {
        let message = extract_user_message(&ctx.message);
        let blocking = is_blocking(ctx.configuration.as_ref());
        info!(message = %message, blocking, "Task agent processing request");

        if is_job_execution_request(&message) {
            info!("Detected job execution request");
            self.execute_jobs(ctx).await;
            updater.complete()
        } else {
            self.generate_tasks(&message, blocking, updater)
        }
    }
}

#[async_trait]
impl AgentExecutor for TaskAgentExecutor {
    fn card(&self) -> AgentCard {
        AgentCard::new(
            "A2A Customized Task Agent",
            "Task decomposition agent that breaks requests into jobs with pre-assigned agents and reports execution progress",
            &self.url,
        )
        .with_skill(
            AgentSkill::new(
                "create_task",
                "Create Task with Job Decomposition",
                "Creates a task and decomposes it into executable jobs with pre-assigned agents",
            )
            .with_tags(&["task", "decomposition", "planning"])
            .with_examples(&["Create a task for building a web app", "Plan a data analysis project"]),
        )
        .with_skill(
            AgentSkill::new(
                "execute_jobs",
                "Execute Task Jobs",
                "Executes jobs within a task and provides real-time progress updates",
            )
            .with_tags(&["execution", "jobs", "progress"])
            .with_examples(&["Execute jobs for task-123", "Run the planned tasks"]),
        )
    }

    async fn execute(&self, ctx: &RequestContext, queue: &EventQueue) -> AgentResult<()> {
        let updater = TaskUpdater::new(queue.clone(), &ctx.task_id, &ctx.context_id);
        if let Err(e) = self.run(ctx, &updater).await {
            error!(error = %e, "Task agent failed");
            updater.failed(None)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2a::executor::MessageSendConfiguration;
    use crate::a2a::types::Event;
    use crate::testing::{request_context, run_executor};

    fn executor() -> TaskAgentExecutor {
        TaskAgentExecutor::new(
            "http://localhost:9999",
            WebhookClient::new(Duration::from_secs(10)).unwrap(),
            Duration::ZERO,
        )
    }

    fn non_blocking() -> Option<MessageSendConfiguration> {
        Some(MessageSendConfiguration {
            blocking: Some(false),
            ..Default::default()
        })
    }

    fn task_ids(events: &[Event]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::ArtifactUpdate(update) => Some(&update.artifact.parts),
                _ => None,
            })
            .flatten()
            .filter_map(|p| match p {
                Part::Data { data } => data["task"]["id"].as_str().map(str::to_string),
                Part::Text { .. } => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_blocking_emits_single_final_artifact() {
        let run = run_executor(&executor(), &request_context("Plan a trip to Japan", None)).await;

        assert!(run.result.is_ok());
        assert_eq!(run.events.len(), 1);
        assert!(run.last_is_final());
        assert_eq!(task_ids(&run.events), vec!["job-1", "job-2", "job-3", "job-4"]);
    }

    #[tokio::test]
    async fn test_non_blocking_emits_artifact_message_and_completion() {
        let run = run_executor(&executor(), &request_context("Write a novel", non_blocking())).await;

        assert_eq!(run.events.len(), 3);
        assert_eq!(run.states(), vec![TaskState::Completed]);
        assert_eq!(
            run.messages(),
            vec![
                "I've analyzed your request and created 3 structured tasks for execution. Each task has been assigned to a specialized agent and is ready for processing."
                    .to_string()
            ]
        );
        assert!(run.last_is_final());
    }

    #[tokio::test]
    async fn test_job_execution_without_webhook_still_completes() {
        let run = run_executor(
            &executor(),
            &request_context(r#"{"type": "execute_jobs", "tasks": []}"#, None),
        )
        .await;

        assert_eq!(run.states(), vec![TaskState::Completed]);
    }

    #[test]
    fn test_enhanced_prompt() {
        let enhanced = enhance_with_system_prompt("Plan a party");
        assert!(enhanced.starts_with("You are a professional task decomposition agent."));
        assert!(enhanced.ends_with("Now process this user request:\n\nUser Request: Plan a party"));
    }

    #[test]
    fn test_card_skills() {
        let card = executor().card();
        let skills: Vec<_> = card.skills.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(skills, vec!["create_task", "execute_jobs"]);
    }
}
