//! LLM-backed specialist agents
//!
//! Trending, Analyzer, Host and Market share one executor; a
//! [`LlmAgentProfile`] supplies the prompt, progress messages, artifact name
//! and card for each.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::a2a::agent_card::{AgentCard, AgentSkill};
use crate::a2a::executor::{AgentExecutor, EventQueue, RequestContext, TaskUpdater};
use crate::a2a::types::{Part, Task, TaskState};
use crate::config::LlmSection;
use crate::error::AgentResult;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmError, LlmProvider};
use crate::observability::metrics::metrics;

const TRENDING_PROMPT: &str = r#"You are a social media trends analyst. Your job is to search the web for current trending topics,
particularly from social platforms.

When asked about trends:
1. Search for "trending topics today" or similar queries
2. Extract the top 3 trending topics
3. Return them in a JSON format

Focus on current, real-time trends from the last 24 hours.

You MUST return your response in the following JSON format:
{
    "trends": [
        {"topic": "Topic name", "description": "Brief description (1-2 sentences)", "reason": "Why it's trending"},
        {"topic": "Topic name", "description": "Brief description (1-2 sentences)", "reason": "Why it's trending"},
        {"topic": "Topic name", "description": "Brief description (1-2 sentences)", "reason": "Why it's trending"}
    ]
}

Only return the JSON object, no additional text."#;

const ANALYZER_PROMPT: &str = "You are a data analyst specializing in trend analysis. When given a trending topic,
perform deep research to find quantitative data and insights.

For each trend you analyze:
1. Search for statistics, numbers, and metrics related to the trend
2. Look for:
   - Engagement metrics (views, shares, mentions)
   - Growth rates and timeline
   - Geographic distribution
   - Related hashtags or keywords
3. Provide concrete numbers and data points

Keep it somehow concise

Always prioritize quantitative information over qualitative descriptions.";

const HOST_PROMPT: &str = "You are an expert AI Orchestrator.
Your primary responsibility is to intelligently interpret user requests, plan the necessary sequence of actions if multiple steps are involved, and delegate them to the most appropriate specialized remote agents.
You do not perform the tasks yourself but manage their assignment, sequence, and can monitor their status.

Core Workflow & Decision Making:

1.  Understand User Intent & Complexity:
    - Carefully analyze the user's request to determine the core task(s) they want to achieve. Pay close attention to keywords and the overall goal.
    - Identify if the request requires a single agent or a sequence of actions from multiple agents.

2.  Agent Discovery & Selection:
    - You have access to sub_agents with specific capabilities.
    - Based on the user's intent:
        - For single-step requests, select the single most appropriate agent.
        - For multi-step requests, identify all necessary agents and determine the logical order of their execution.

3.  Task Planning & Sequencing (for Multi-Step Requests):
    - Before delegating, outline the sequence of agent tasks.
    - Identify dependencies: Does Agent B need information from Agent A's completed task?
    - Execute tasks sequentially if there are dependencies.

4.  Task Delegation & Management:
    - For the first step, provide the message extracted from the user's input.
    - For subsequent steps, include outputs from previous agents as needed.

Communication with User:
    - Clearly inform which agent handles each task and report results.
    - Ask for clarification if necessary information is missing.";

const MARKET_PROMPT: &str = "You are a financial market analyst. Given a company, ticker, sector or market question, write a structured markdown report covering:
1. Current market context and recent price action
2. Key fundamentals and valuation considerations
3. Technical picture, naming the indicators you rely on
4. Main risks and catalysts
5. A short overall assessment

Be explicit about uncertainty and state when information may be out of date.";

/// Card skill for a profile
#[derive(Debug, Clone)]
pub struct SkillProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub tags: &'static [&'static str],
    pub examples: &'static [&'static str],
}

/// Everything that distinguishes one LLM agent from another
#[derive(Debug, Clone)]
pub struct LlmAgentProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub system_prompt: &'static str,
    /// Progress messages emitted as `working` updates before the LLM call
    pub working_messages: &'static [&'static str],
    pub artifact_name: &'static str,
    pub output_modes: &'static [&'static str],
    pub skill: SkillProfile,
    /// Wraps the user query before it is sent; `{query}` is substituted
    pub query_template: Option<String>,
}

impl LlmAgentProfile {
    pub fn trending() -> Self {
        Self {
            name: "Trending Topics Agent",
            description: "Searches the web for current trending topics from social media",
            system_prompt: TRENDING_PROMPT,
            working_messages: &["Searching for trending topics..."],
            artifact_name: "trending_results",
            output_modes: &["application/json"],
            skill: SkillProfile {
                id: "find_trends",
                name: "Find Trending Topics",
                description: "Searches for current trending topics on social media",
                tags: &["trends", "social media", "twitter", "current events"],
                examples: &[
                    "What's trending today?",
                    "Show me current Twitter trends",
                    "What are people talking about on social media?",
                ],
            },
            query_template: None,
        }
    }

    pub fn analyzer() -> Self {
        Self {
            name: "Trend Analyzer Agent",
            description: "Performs deep analysis of trends with quantitative data",
            system_prompt: ANALYZER_PROMPT,
            working_messages: &["Analyzing trend data..."],
            artifact_name: "analysis_results",
            output_modes: &["application/json"],
            skill: SkillProfile {
                id: "analyze_trend",
                name: "Analyze Trend",
                description: "Provides quantitative analysis of a specific trend",
                tags: &["analysis", "data", "metrics", "statistics"],
                examples: &[
                    "Analyze the #ClimateChange trend",
                    "Get metrics for the Taylor Swift trend",
                    "Provide data analysis for AI adoption trend",
                ],
            },
            query_template: None,
        }
    }

    /// Host agent; the query is wrapped with the URLs of the agents it plans
    /// around
    pub fn host(trending_url: &str, analyzer_url: &str) -> Self {
        Self {
            name: "Trend Analysis Host",
            description: "Orchestrates trend discovery and analysis using specialized agents",
            system_prompt: HOST_PROMPT,
            working_messages: &["Analyzing your request and planning the workflow..."],
            artifact_name: "orchestration_results",
            output_modes: &["application/json"],
            skill: SkillProfile {
                id: "comprehensive_trend_analysis",
                name: "Comprehensive Trend Analysis",
                description: "Finds trending topics and provides deep analysis of the most relevant one",
                tags: &["trends", "analysis", "orchestration", "insights"],
                examples: &[
                    "Analyze current trends",
                    "What's trending and why is it important?",
                    "Give me a comprehensive trend report",
                ],
            },
            query_template: Some(format!(
                "User request: {{query}}\n\nAvailable agents:\n- Trending Topics Agent: {trending_url}\n- Trend Analyzer Agent: {analyzer_url}\n\nPlease provide a workflow plan and guidance for this request."
            )),
        }
    }

    pub fn market() -> Self {
        Self {
            name: "Market Analysis Agent",
            description: "Performs comprehensive financial market analysis and generates detailed reports",
            system_prompt: MARKET_PROMPT,
            working_messages: &[
                "Starting financial market analysis...",
                "Performing market research and analysis...",
            ],
            artifact_name: "market_analysis_report",
            output_modes: &["text/markdown"],
            skill: SkillProfile {
                id: "analyze_market",
                name: "Analyze Market",
                description: "Performs deep financial market analysis and generates comprehensive reports",
                tags: &["finance", "market analysis", "stocks", "investment", "research"],
                examples: &[
                    "Analyze the current state of the technology sector",
                    "Provide a market analysis for renewable energy stocks",
                    "Generate a financial report on the banking industry",
                ],
            },
            query_template: None,
        }
    }

    /// Text sent as the user turn
    pub fn render_query(&self, query: &str) -> String {
        match &self.query_template {
            Some(template) => template.replace("{query}", query),
            None => query.to_string(),
        }
    }

    pub fn card(&self, url: &str) -> AgentCard {
        AgentCard::new(self.name, self.description, url)
            .with_output_modes(self.output_modes)
            .with_skill(
                AgentSkill::new(self.skill.id, self.skill.name, self.skill.description)
                    .with_tags(self.skill.tags)
                    .with_examples(self.skill.examples),
            )
    }
}

/// Model settings applied to every completion
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&LlmSection> for ModelSettings {
    fn from(section: &LlmSection) -> Self {
        Self {
            model: section.model.clone(),
            temperature: section.temperature,
            max_tokens: section.max_tokens,
        }
    }
}

pub struct LlmAgentExecutor<P: LlmProvider + ?Sized> {
    profile: LlmAgentProfile,
    provider: Arc<P>,
    settings: ModelSettings,
    url: String,
}

impl<P: LlmProvider + ?Sized> LlmAgentExecutor<P> {
    pub fn new(
        profile: LlmAgentProfile,
        provider: Arc<P>,
        settings: ModelSettings,
        url: impl Into<String>,
    ) -> Self {
        Self {
            profile,
            provider,
            settings,
            url: url.into(),
        }
    }

    pub fn profile(&self) -> &LlmAgentProfile {
        &self.profile
    }

    async fn ask(&self, query: &str) -> Result<String, LlmError> {
        let request = CompletionRequest::new(
            self.settings.model.clone(),
            vec![
                ChatMessage::system(self.profile.system_prompt),
                ChatMessage::user(self.profile.render_query(query)),
            ],
        )
        .with_temperature(self.settings.temperature)
        .with_max_tokens(self.settings.max_tokens)
        .with_metadata("agent", self.profile.name);

        debug!(
            model = %request.model,
            provider = self.provider.name(),
            "Sending completion request"
        );

        let result = match self.provider.complete(request).await {
            Ok(response) => response.into_text(),
            Err(e) => Err(e),
        };
        metrics().llm_request(result.is_ok());
        result
    }
}

#[async_trait]
impl<P: LlmProvider + ?Sized + 'static> AgentExecutor for LlmAgentExecutor<P> {
    fn card(&self) -> AgentCard {
        self.profile.card(&self.url)
    }

    async fn execute(&self, ctx: &RequestContext, queue: &EventQueue) -> AgentResult<()> {
        let query = ctx.get_user_input();
        info!(
            agent = self.profile.name,
            preview = %query.chars().take(30).collect::<String>(),
            "LLM agent processing request"
        );

        if ctx.current_task.is_none() {
            queue.enqueue(Task::new_submitted(
                ctx.task_id.clone(),
                ctx.context_id.clone(),
                ctx.message.clone(),
            ))?;
        }

        let updater = TaskUpdater::new(queue.clone(), &ctx.task_id, &ctx.context_id);
        for text in self.profile.working_messages {
            updater.update_status(TaskState::Working, Some(updater.new_agent_message(*text)), false)?;
        }

        match self.ask(&query).await {
            Ok(answer) => {
                updater.add_artifact(vec![Part::text(answer)], self.profile.artifact_name)?;
                updater.complete()
            }
            Err(e) => {
                warn!(agent = self.profile.name, error = %e, "LLM request failed");
                updater.update_status(
                    TaskState::InputRequired,
                    Some(updater.new_agent_message(format!("Error processing request: {e}"))),
                    true,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2a::types::Event;
    use crate::testing::{request_context, run_executor, MockLlmProvider};

    fn settings() -> ModelSettings {
        ModelSettings {
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    #[tokio::test]
    async fn test_successful_run_event_sequence() {
        let provider = Arc::new(MockLlmProvider::single_response("{\"trends\": []}"));
        let executor = LlmAgentExecutor::new(
            LlmAgentProfile::trending(),
            provider.clone(),
            settings(),
            "http://localhost:10020",
        );

        let run = run_executor(&executor, &request_context("What's trending?", None)).await;

        assert!(run.result.is_ok());
        assert!(matches!(run.events[0], Event::Task(_)));
        assert_eq!(run.states(), vec![TaskState::Working, TaskState::Completed]);
        assert_eq!(run.artifact_names(), vec!["trending_results".to_string()]);
        assert!(run.last_is_final());

        let requests = provider.recorded_requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[0].messages[1].content, "What's trending?");
        assert_eq!(requests[0].temperature, Some(0.7));
        assert_eq!(requests[0].max_tokens, Some(2000));
    }

    #[tokio::test]
    async fn test_market_emits_two_working_messages() {
        let executor = LlmAgentExecutor::new(
            LlmAgentProfile::market(),
            Arc::new(MockLlmProvider::single_response("# Report")),
            settings(),
            "http://localhost:10023",
        );

        let run = run_executor(&executor, &request_context("NVDA", None)).await;

        assert_eq!(
            run.states(),
            vec![TaskState::Working, TaskState::Working, TaskState::Completed]
        );
        assert_eq!(
            run.messages(),
            vec![
                "Starting financial market analysis...".to_string(),
                "Performing market research and analysis...".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_llm_failure_requires_input() {
        let executor = LlmAgentExecutor::new(
            LlmAgentProfile::analyzer(),
            Arc::new(MockLlmProvider::with_failure()),
            settings(),
            "http://localhost:10021",
        );

        let run = run_executor(&executor, &request_context("Analyze #AI", None)).await;

        assert!(run.result.is_ok());
        assert_eq!(run.states(), vec![TaskState::Working, TaskState::InputRequired]);
        assert!(run.last_is_final());
        let last = run.messages().pop().unwrap();
        assert!(last.starts_with("Error processing request: "), "{last}");
        assert!(run.artifact_names().is_empty());
    }

    #[tokio::test]
    async fn test_host_wraps_query_with_agent_urls() {
        let provider = Arc::new(MockLlmProvider::single_response("plan"));
        let executor = LlmAgentExecutor::new(
            LlmAgentProfile::host("http://localhost:10020", "http://localhost:10021"),
            provider.clone(),
            settings(),
            "http://localhost:10022",
        );

        run_executor(&executor, &request_context("Analyze current trends", None)).await;

        let sent = &provider.recorded_requests().await[0].messages[1].content;
        assert!(sent.starts_with("User request: Analyze current trends"));
        assert!(sent.contains("- Trending Topics Agent: http://localhost:10020"));
        assert!(sent.contains("- Trend Analyzer Agent: http://localhost:10021"));
    }

    #[test]
    fn test_profile_cards() {
        let card = LlmAgentProfile::market().card("http://localhost:10023");
        assert_eq!(card.name, "Market Analysis Agent");
        assert_eq!(card.default_output_modes, vec!["text/markdown".to_string()]);
        assert_eq!(card.skills[0].id, "analyze_market");

        assert_eq!(
            LlmAgentProfile::host("a", "b").card("http://localhost:10022").skills[0].id,
            "comprehensive_trend_analysis"
        );
    }
}
