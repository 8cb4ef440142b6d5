//! Error types for the orchestrator
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in the orchestrator
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No routing-table entry for the exposed name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Backend is not registered or reports itself unavailable
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Backend failed while listing or calling tools
    #[error("Backend '{backend}' error: {message}")]
    Backend { backend: String, message: String },

    /// Security scan rejected the call or its result
    #[error("Blocked by security scan: tool '{tool}' on '{backend}' (risk: {risk}, threats: {threats:?})")]
    SecurityBlocked {
        tool: String,
        backend: String,
        risk: String,
        threats: Vec<String>,
        reason: Option<String>,
    },

    /// The scanning collaborator itself failed
    #[error("Scanner error: {0}")]
    Scanner(String),

    /// Channel adapter failure
    #[error("Channel '{channel}' error: {message}")]
    Channel { channel: String, message: String },

    /// Embedded schedule expression failed to parse
    #[error("Invalid schedule '{expression}': {message}")]
    InvalidSchedule { expression: String, message: String },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OrchestratorError {
    /// Shorthand for a backend failure
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a channel failure
    pub fn channel(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Channel {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Check if this error is a security block
    pub fn is_security_block(&self) -> bool {
        matches!(self, Self::SecurityBlocked { .. })
    }

    /// Machine-readable code used in failure results
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "UNKNOWN_TOOL",
            Self::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            Self::SecurityBlocked { .. } => "SECURITY_BLOCKED",
            Self::Scanner(_) => "SCANNER_UNAVAILABLE",
            Self::InvalidSchedule { .. } => "INVALID_SCHEDULE",
            Self::Channel { .. } => "CHANNEL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Backend { .. } | Self::Http(_) | Self::Io(_) | Self::Json(_) => "BACKEND_ERROR",
        }
    }
}

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;
