//! Scanner contract and its implementations

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::backend::{BackendClient, ToolCall, unwrap_envelope};
use crate::error::{OrchestratorError, Result};

/// Which side of a call is being scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanDirection {
    Input,
    Output,
}

/// Context submitted alongside scanned content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanContext {
    pub backend: String,
    pub tool: String,
    pub direction: ScanDirection,
}

impl ScanContext {
    pub fn new(backend: impl Into<String>, tool: impl Into<String>, direction: ScanDirection) -> Self {
        Self {
            backend: backend.into(),
            tool: tool.into(),
            direction,
        }
    }
}

/// Outcome of a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanVerdict {
    pub allowed: bool,
    #[serde(default)]
    pub risk: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub threats: Vec<String>,
}

impl ScanVerdict {
    /// Verdict that lets the content through
    pub fn allow() -> Self {
        Self {
            allowed: true,
            risk: None,
            reason: None,
            threats: Vec::new(),
        }
    }

    /// Verdict that blocks the content
    pub fn block(risk: impl Into<String>, threats: &[&str]) -> Self {
        Self {
            allowed: false,
            risk: Some(risk.into()),
            reason: None,
            threats: threats.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Parse a verdict out of a scanning tool's response
    ///
    /// `allowed` is required (`safe` is accepted as an alias). Threats may be
    /// strings or objects carrying a `type` or `name`.
    pub fn from_value(value: &Value) -> Result<Self> {
        let value = unwrap_envelope(value);
        let allowed = value
            .get("allowed")
            .or_else(|| value.get("safe"))
            .and_then(Value::as_bool)
            .ok_or_else(|| OrchestratorError::Scanner(format!("verdict has no 'allowed' field: {}", value)))?;

        let text = |key: &str| match value.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };

        let threats = value
            .get("threats")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|t| match t {
                        Value::String(s) => Some(s.clone()),
                        Value::Object(_) => t
                            .get("type")
                            .or_else(|| t.get("name"))
                            .and_then(Value::as_str)
                            .map(String::from),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            allowed,
            risk: text("risk"),
            reason: text("reason"),
            threats,
        })
    }
}

/// Content scanning collaborator
#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan(&self, content: &str, context: &ScanContext) -> Result<ScanVerdict>;
}

/// Scanner that asks a scanning backend through a tool call
pub struct BackendScanner {
    backend: Arc<dyn BackendClient>,
    tool: String,
}

impl BackendScanner {
    pub fn new(backend: Arc<dyn BackendClient>, tool: impl Into<String>) -> Self {
        Self {
            backend,
            tool: tool.into(),
        }
    }
}

#[async_trait]
impl Scanner for BackendScanner {
    async fn scan(&self, content: &str, context: &ScanContext) -> Result<ScanVerdict> {
        if !self.backend.is_available() {
            return Err(OrchestratorError::Scanner(format!(
                "scanning backend '{}' is unavailable",
                self.backend.name()
            )));
        }

        let call = ToolCall::new(
            self.tool.clone(),
            json!({
                "content": content,
                "source": context.backend,
                "tool": context.tool,
                "direction": context.direction,
            }),
        );
        debug!("Scanning {:?} of '{}' via '{}'", context.direction, context.tool, self.tool);

        let result = self
            .backend
            .call_tool(call)
            .await
            .map_err(|e| OrchestratorError::Scanner(e.to_string()))?;
        if !result.success {
            return Err(OrchestratorError::Scanner(
                result.error.unwrap_or_else(|| "scan failed".to_string()),
            ));
        }

        let content = result
            .content
            .ok_or_else(|| OrchestratorError::Scanner("scan returned no verdict".to_string()))?;
        let content = match content {
            Value::String(s) => serde_json::from_str(&s).map_err(|e| OrchestratorError::Scanner(e.to_string()))?,
            other => other,
        };
        ScanVerdict::from_value(&content)
    }
}

/// Scanner with scripted verdicts that records what it saw
///
/// Content containing any configured marker is blocked; everything else is
/// allowed. Queued errors are returned first.
#[derive(Default)]
pub struct MockScanner {
    markers: Vec<String>,
    errors: Mutex<VecDeque<String>>,
    seen: Mutex<Vec<(String, ScanContext)>>,
}

impl MockScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block content containing `marker`
    pub fn blocking(mut self, marker: &str) -> Self {
        self.markers.push(marker.to_string());
        self
    }

    /// Fail the next scan with a scanner error
    pub fn push_error(&self, message: &str) {
        lock(&self.errors).push_back(message.to_string());
    }

    /// Content and context of every scan so far
    pub fn scans(&self) -> Vec<(String, ScanContext)> {
        lock(&self.seen).clone()
    }
}

#[async_trait]
impl Scanner for MockScanner {
    async fn scan(&self, content: &str, context: &ScanContext) -> Result<ScanVerdict> {
        lock(&self.seen).push((content.to_string(), context.clone()));

        if let Some(message) = lock(&self.errors).pop_front() {
            return Err(OrchestratorError::Scanner(message));
        }
        match self.markers.iter().find(|m| content.contains(m.as_str())) {
            Some(marker) => Ok(ScanVerdict::block("high", &[marker.as_str()]).with_reason("matched marker")),
            None => Ok(ScanVerdict::allow()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
