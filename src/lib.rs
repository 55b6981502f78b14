//! A2A Agents - Rust Implementation
//!
//! A set of demo agents speaking the A2A JSON-RPC protocol over HTTP.
//!
//! # Overview
//!
//! This crate provides:
//! - A2A protocol types, a warp-based JSON-RPC server and a reqwest client
//! - Rule-based Canvas and Task agents that return canned task breakdowns
//! - LLM-backed Trending, Analyzer, Host and Market agents
//! - An Orchestrator that decomposes requests into jobs, routes them to
//!   remote agents and reports progress by webhook
//!
//! # Quick Start
//!
//! ```rust
//! use a2a_agents::routing::{select_agent, AgentKind};
//! use a2a_agents::templates::{JobGenerator, ProjectKind};
//!
//! let generator = JobGenerator::new(true);
//! assert_eq!(generator.classify("Plan a trip to Japan"), ProjectKind::Travel);
//!
//! let jobs = generator.generate("Plan a trip to Japan");
//! assert_eq!(jobs.len(), 4);
//! assert_eq!(jobs[0].id.as_deref(), Some("job-1"));
//!
//! assert_eq!(select_agent("Find trending topics"), AgentKind::Trending);
//! assert_eq!(select_agent("Write a summary"), AgentKind::Host);
//! ```

pub mod a2a;
pub mod agents;
pub mod config;
pub mod error;
pub mod launcher;
pub mod llm;
pub mod observability;
pub mod routing;
pub mod templates;
pub mod testing;
pub mod webhook;

pub use a2a::{serve, AgentCard, AgentExecutor, AgentServer};
pub use config::*;
pub use error::{AgentError, AgentResult};
pub use launcher::{launch, AgentName};
