//! Keyword-based selection of the remote agent that should run a job
//!
//! Selection only names an agent; whether that agent is reachable is decided
//! by the `remote_agents` table the router was built with.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, warn};

/// Remote agents a job description can be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    Trending,
    MarketAnalysis,
    Analyzer,
    Host,
}

impl AgentKind {
    /// Key used in the `remote_agents` table
    pub fn routing_name(self) -> &'static str {
        match self {
            AgentKind::Trending => "trending",
            AgentKind::MarketAnalysis => "market_analysis",
            AgentKind::Analyzer => "analyzer",
            AgentKind::Host => "host",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.routing_name())
    }
}

const SELECTION_RULES: &[(AgentKind, &[&str])] = &[
    (
        AgentKind::Trending,
        &["trend", "trending", "current", "popular", "viral"],
    ),
    (
        AgentKind::MarketAnalysis,
        &["market", "stock", "financial", "investment", "trading"],
    ),
    (
        AgentKind::Analyzer,
        &["analyze", "analysis", "research", "study"],
    ),
];

/// Pick the agent for a job description. First matching rule wins; anything
/// unmatched goes to the host agent.
pub fn select_agent(description: &str) -> AgentKind {
    let lower = description.to_lowercase();
    SELECTION_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(kind, _)| *kind)
        .unwrap_or(AgentKind::Host)
}

/// Routing outcome for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Send the job to this base URL
    Remote { agent: AgentKind, url: String },
    /// Selected agent has no configured URL
    Unavailable { agent: AgentKind },
}

impl RouteDecision {
    pub fn agent(&self) -> AgentKind {
        match self {
            RouteDecision::Remote { agent, .. } | RouteDecision::Unavailable { agent } => *agent,
        }
    }
}

/// Result text reported for a job whose agent is not configured
pub fn unavailable_text(agent: AgentKind, description: &str) -> String {
    format!("Agent {agent} not available. Task description: {description}")
}

/// Maps job descriptions onto configured remote agents
#[derive(Debug, Clone)]
pub struct AgentRouter {
    agents: BTreeMap<String, String>,
}

impl AgentRouter {
    pub fn new(agents: BTreeMap<String, String>) -> Self {
        Self { agents }
    }

    pub fn agent_url(&self, agent: AgentKind) -> Option<&str> {
        self.agents.get(agent.routing_name()).map(String::as_str)
    }

    pub fn route(&self, description: &str) -> RouteDecision {
        let agent = select_agent(description);
        debug!(agent = %agent, "Selected agent for job");

        match self.agent_url(agent) {
            Some(url) => {
                info!(agent = %agent, url = %url, "Routing job to remote agent");
                RouteDecision::Remote {
                    agent,
                    url: url.to_string(),
                }
            }
            None => {
                warn!(agent = %agent, "Selected agent is not configured");
                RouteDecision::Unavailable { agent }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_router() -> AgentRouter {
        AgentRouter::new(BTreeMap::from([
            ("trending".to_string(), "http://localhost:10020".to_string()),
            ("analyzer".to_string(), "http://localhost:10021".to_string()),
            ("host".to_string(), "http://localhost:10022".to_string()),
        ]))
    }

    #[test]
    fn test_selection_rules() {
        assert_eq!(select_agent("Find what's POPULAR on TikTok"), AgentKind::Trending);
        assert_eq!(select_agent("Stock performance review"), AgentKind::MarketAnalysis);
        assert_eq!(select_agent("Research the competition"), AgentKind::Analyzer);
        assert_eq!(select_agent("Write a haiku"), AgentKind::Host);
    }

    #[test]
    fn test_first_rule_wins() {
        // "current" beats "market"
        assert_eq!(
            select_agent("Analyze current market conditions"),
            AgentKind::Trending
        );
        // "market" beats "analyze"
        assert_eq!(select_agent("Analyze the market"), AgentKind::MarketAnalysis);
    }

    #[test]
    fn test_route_to_configured_agent() {
        let decision = default_router().route("Study consumer habits");
        assert_eq!(
            decision,
            RouteDecision::Remote {
                agent: AgentKind::Analyzer,
                url: "http://localhost:10021".to_string()
            }
        );
    }

    #[test]
    fn test_market_analysis_unavailable_by_default() {
        let decision = default_router().route("Review investment options");
        assert_eq!(
            decision,
            RouteDecision::Unavailable {
                agent: AgentKind::MarketAnalysis
            }
        );
        assert_eq!(decision.agent(), AgentKind::MarketAnalysis);
        assert_eq!(
            unavailable_text(decision.agent(), "Review investment options"),
            "Agent market_analysis not available. Task description: Review investment options"
        );
    }
}
