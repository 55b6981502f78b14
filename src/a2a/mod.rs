//! Agent-to-Agent (A2A) protocol surface
//!
//! Wire types, the JSON-RPC endpoint every agent serves, the executor
//! contract agents implement, and the client used to call other agents.

pub mod agent_card;
pub mod client;
pub mod executor;
pub mod jsonrpc;
pub mod server;
pub mod task_store;
pub mod types;

pub use agent_card::{local_url, AgentCapabilities, AgentCard, AgentSkill};
pub use client::{A2aClient, RemoteAgentError};
pub use executor::{
    AgentExecutor, EventQueue, MessageSendConfiguration, PushNotificationConfig, RequestContext,
    TaskUpdater,
};
pub use server::{serve, AgentServer};
pub use task_store::InMemoryTaskStore;
pub use types::*;
