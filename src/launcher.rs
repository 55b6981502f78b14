//! Wiring between configuration, executors and HTTP servers
//!
//! [`build_server`] turns an [`AgentName`] into a ready [`AgentServer`];
//! [`launch`] runs several of them side by side until the shared shutdown
//! signal flips.

use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;

use clap::ValueEnum;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::a2a::agent_card::local_url;
use crate::a2a::executor::AgentExecutor;
use crate::a2a::server::{serve, AgentServer};
use crate::agents::llm_agent::ModelSettings;
use crate::agents::{
    CanvasAgentExecutor, LlmAgentExecutor, LlmAgentProfile, OrchestratorExecutor,
    TaskAgentExecutor,
};
use crate::config::{get_llm_api_key, AppConfig, ConfigError, PortsSection};
use crate::error::{AgentError, AgentResult};
use crate::llm::provider::LlmProvider;
use crate::llm::providers::openai::{OpenAiConfig, OpenAiProvider};
use crate::observability::health::LlmProviderHealthCheck;

/// Every agent the binary knows how to serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum AgentName {
    Orchestrator,
    Task,
    Canvas,
    Trending,
    Analyzer,
    Host,
    Market,
}

impl AgentName {
    /// Agents started by a plain `launch`
    pub const SPECIALISTS: [AgentName; 3] =
        [AgentName::Trending, AgentName::Analyzer, AgentName::Host];

    pub fn as_str(self) -> &'static str {
        match self {
            AgentName::Orchestrator => "orchestrator",
            AgentName::Task => "task",
            AgentName::Canvas => "canvas",
            AgentName::Trending => "trending",
            AgentName::Analyzer => "analyzer",
            AgentName::Host => "host",
            AgentName::Market => "market",
        }
    }

    pub fn port(self, ports: &PortsSection) -> u16 {
        match self {
            AgentName::Orchestrator => ports.orchestrator,
            AgentName::Task => ports.task,
            AgentName::Canvas => ports.canvas,
            AgentName::Trending => ports.trending,
            AgentName::Analyzer => ports.analyzer,
            AgentName::Host => ports.host,
            AgentName::Market => ports.market,
        }
    }

    /// Whether the agent cannot run without an LLM provider
    pub fn requires_llm(self) -> bool {
        matches!(
            self,
            AgentName::Trending | AgentName::Analyzer | AgentName::Host | AgentName::Market
        )
    }
}

impl std::fmt::Display for AgentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Create the configured LLM provider.
///
/// Returns `Ok(None)` when the API key is not set so that agents with a
/// rule-based fallback can still start.
pub fn build_provider(config: &AppConfig) -> AgentResult<Option<Arc<dyn LlmProvider>>> {
    let api_key = match get_llm_api_key(&config.llm) {
        Ok(key) => key,
        Err(ConfigError::EnvVarNotFound(var)) => {
            warn!(env = %var, "LLM API key not set");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    match config.llm.provider.as_str() {
        "openai" => {
            let provider = OpenAiProvider::new(OpenAiConfig::from_section(&config.llm, api_key))
                .map_err(|e| AgentError::llm_error(e.to_string()))?;
            info!(model = %config.llm.model, "Created OpenAI provider");
            Ok(Some(Arc::new(provider)))
        }
        other => Err(AgentError::ConfigError(ConfigError::InvalidConfig(format!(
            "Unsupported LLM provider: {other}"
        )))),
    }
}

fn llm_server(
    profile: LlmAgentProfile,
    provider: Arc<dyn LlmProvider>,
    config: &AppConfig,
    url: String,
) -> AgentServer {
    let executor: Arc<dyn AgentExecutor> = Arc::new(LlmAgentExecutor::new(
        profile,
        provider.clone(),
        ModelSettings::from(&config.llm),
        url,
    ));
    AgentServer::new(executor).with_health_check(Arc::new(LlmProviderHealthCheck::new(provider)))
}

fn remote_or_local(config: &AppConfig, name: &str, port: u16) -> String {
    config
        .remote_agents
        .get(name)
        .cloned()
        .unwrap_or_else(|| local_url(&config.server.host, port))
}

/// Build the server for one agent, advertising `url` in its card
pub fn build_server(
    config: &AppConfig,
    agent: AgentName,
    url: String,
    provider: Option<Arc<dyn LlmProvider>>,
) -> AgentResult<AgentServer> {
    if agent.requires_llm() && provider.is_none() {
        return Err(AgentError::ConfigError(ConfigError::EnvVarNotFound(
            config.llm.api_key_env.clone(),
        )));
    }

    let server = match (agent, provider) {
        (AgentName::Canvas, _) => {
            AgentServer::new(Arc::new(CanvasAgentExecutor::from_config(config, url)))
        }
        (AgentName::Task, _) => {
            AgentServer::new(Arc::new(TaskAgentExecutor::from_config(config, url)?))
        }
        (AgentName::Orchestrator, provider) => {
            let executor = OrchestratorExecutor::from_config(config, url, provider.clone())?;
            let server = AgentServer::new(Arc::new(executor));
            match provider {
                Some(p) => server.with_health_check(Arc::new(LlmProviderHealthCheck::new(p))),
                None => server,
            }
        }
        (AgentName::Trending, Some(p)) => llm_server(LlmAgentProfile::trending(), p, config, url),
        (AgentName::Analyzer, Some(p)) => llm_server(LlmAgentProfile::analyzer(), p, config, url),
        (AgentName::Market, Some(p)) => llm_server(LlmAgentProfile::market(), p, config, url),
        (AgentName::Host, Some(p)) => {
            let trending = remote_or_local(config, "trending", config.ports.trending);
            let analyzer = remote_or_local(config, "analyzer", config.ports.analyzer);
            llm_server(LlmAgentProfile::host(&trending, &analyzer), p, config, url)
        }
        (_, None) => {
            return Err(AgentError::internal_error(format!(
                "no LLM provider for {agent}"
            )))
        }
    };

    Ok(server)
}

/// Whether something is already listening on `host:port`
pub fn port_in_use(host: &str, port: u16) -> bool {
    TcpListener::bind((host, port)).is_err()
}

pub fn socket_addr(host: &str, port: u16) -> AgentResult<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| AgentError::internal_error(format!("Cannot resolve {host}:{port}: {e}")))?
        .next()
        .ok_or_else(|| AgentError::internal_error(format!("No address for {host}:{port}")))
}

/// Future resolving once the watch channel carries `true` or its sender is gone
pub async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}

/// Serve one agent on the given port until shutdown
pub async fn serve_agent(
    config: &AppConfig,
    agent: AgentName,
    port: u16,
    provider: Option<Arc<dyn LlmProvider>>,
    shutdown: watch::Receiver<bool>,
) -> AgentResult<()> {
    let url = local_url(&config.server.host, port);
    let addr = socket_addr(&config.server.host, port)?;
    let server = build_server(config, agent, url, provider)?;

    info!(agent = %agent, addr = %addr, "Starting agent server");
    serve(Arc::new(server), addr, wait_for_shutdown(shutdown)).await
}

/// Run several agents concurrently.
///
/// Agents whose port is taken are skipped with a warning. Returns once every
/// started agent has stopped, with the names of the agents that ran.
pub async fn launch(
    config: &AppConfig,
    agents: &[AgentName],
    shutdown: watch::Receiver<bool>,
) -> AgentResult<Vec<AgentName>> {
    let provider = build_provider(config)?;
    let mut handles = Vec::new();

    for &agent in agents {
        let port = agent.port(&config.ports);
        if port_in_use(&config.server.host, port) {
            warn!(agent = %agent, port, "Port already in use, skipping agent");
            continue;
        }

        let config = config.clone();
        let provider = provider.clone();
        let shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            serve_agent(&config, agent, port, provider, shutdown).await
        });
        handles.push((agent, handle));
    }

    if handles.is_empty() {
        warn!("No agents started");
    }

    let mut started = Vec::with_capacity(handles.len());
    for (agent, handle) in handles {
        match handle.await {
            Ok(Ok(())) => started.push(agent),
            Ok(Err(e)) => error!(agent = %agent, error = %e, "Agent server failed"),
            Err(e) => error!(agent = %agent, error = %e, "Agent task panicked"),
        }
    }

    info!(agents = started.len(), "All agents stopped");
    Ok(started)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLlmProvider;

    fn config() -> AppConfig {
        AppConfig::test_config()
    }

    #[test]
    fn test_agent_ports_follow_config() {
        let ports = PortsSection::default();
        assert_eq!(AgentName::Orchestrator.port(&ports), 9999);
        assert_eq!(AgentName::Canvas.port(&ports), 9999);
        assert_eq!(AgentName::Trending.port(&ports), 10020);
        assert_eq!(AgentName::Analyzer.port(&ports), 10021);
        assert_eq!(AgentName::Host.port(&ports), 10022);
        assert_eq!(AgentName::Market.port(&ports), 10023);
    }

    #[test]
    fn test_llm_agents_need_a_provider() {
        let err = build_server(
            &config(),
            AgentName::Trending,
            "http://localhost:10020".to_string(),
            None,
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("TEST_OPENAI_API_KEY"));
    }

    #[test]
    fn test_rule_based_agents_start_without_provider() {
        for agent in [AgentName::Orchestrator, AgentName::Task, AgentName::Canvas] {
            let server = build_server(&config(), agent, "http://localhost:9999".to_string(), None);
            assert!(server.is_ok(), "{agent} should build without an LLM");
        }
    }

    #[test]
    fn test_host_card_name() {
        let provider: Arc<dyn LlmProvider> = Arc::new(MockLlmProvider::single_response("ok"));
        let server = build_server(
            &config(),
            AgentName::Host,
            "http://localhost:10022".to_string(),
            Some(provider),
        )
        .unwrap();
        assert_eq!(server.agent_name(), LlmAgentProfile::host("", "").name);
    }

    #[test]
    fn test_port_in_use_detects_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(port_in_use("127.0.0.1", port));
        drop(listener);
    }

    #[tokio::test]
    async fn test_launch_skips_busy_ports_and_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = config();
        config.ports.task = listener.local_addr().unwrap().port();

        let (tx, rx) = watch::channel(true);
        let started = launch(&config, &[AgentName::Task], rx).await.unwrap();
        assert!(started.is_empty());
        drop(tx);
    }

    #[tokio::test]
    async fn test_wait_for_shutdown_returns_when_sender_dropped() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        wait_for_shutdown(rx).await;
    }
}
