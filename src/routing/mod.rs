//! Routing of orchestrated jobs to remote A2A agents

pub mod agent_selector;

pub use agent_selector::{select_agent, unavailable_text, AgentKind, AgentRouter, RouteDecision};
