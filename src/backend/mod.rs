//! Backend layer - the capability contract and its implementations
//!
//! Every tool provider (file storage, vaults, mail, code execution, chat)
//! sits behind [`BackendClient`].

mod client;
mod http;
mod mock;
mod types;

pub use client::BackendClient;
pub use http::HttpBackend;
pub use mock::MockBackend;
pub use types::{BackendMetadata, ToolCall, ToolCallResult, ToolDefinition, unwrap_envelope};
