//! LLM provider abstraction layer
//!
//! Agents depend on the [`LlmProvider`] trait; the OpenAI chat-completions
//! backend is the only concrete provider.

pub mod provider;
pub mod providers;

pub use provider::*;
pub use providers::*;
