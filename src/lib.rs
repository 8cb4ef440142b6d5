//! Orchestrator - one tool namespace and one message stream over many backends
//!
//! Backends register with a [`tools::ToolRouter`], which merges their tools into
//! a flat, conflict-free catalog and routes calls back to the owning backend.
//! Any backend can be wrapped in a [`security::GuardedClient`] to scan calls
//! without the router noticing. Chat backends are additionally polled through
//! [`channels::ChannelManager`].

pub mod backend;
pub mod channels;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod security;
pub mod tools;

pub use error::{OrchestratorError, Result};
pub use orchestrator::Orchestrator;
