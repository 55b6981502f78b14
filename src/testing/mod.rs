//! Testing utilities and mock implementations
//!
//! Lets agent logic be exercised without an OpenAI key or running peers.

pub mod mocks;

pub use mocks::*;
