//! Scanning decorator over any backend

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};

use crate::backend::{BackendClient, ToolCall, ToolCallResult, ToolDefinition};
use crate::config::SecurityConfig;
use crate::error::{OrchestratorError, Result};

use super::scanner::{ScanContext, ScanDirection, ScanVerdict, Scanner};

/// Backend wrapper that scans call arguments and, optionally, results
///
/// Exposes the same surface as the wrapped backend, so the router cannot tell
/// a guarded backend from a plain one.
pub struct GuardedClient {
    inner: Box<dyn BackendClient>,
    scanner: Arc<dyn Scanner>,
    scan_input: bool,
    scan_output: bool,
    fail_open: bool,
}

impl GuardedClient {
    /// Wrap a backend with input scanning on, fail-closed
    pub fn new(inner: Box<dyn BackendClient>, scanner: Arc<dyn Scanner>) -> Self {
        Self {
            inner,
            scanner,
            scan_input: true,
            scan_output: false,
            fail_open: false,
        }
    }

    /// Wrap a backend using the security section of the config
    pub fn from_config(inner: Box<dyn BackendClient>, scanner: Arc<dyn Scanner>, config: &SecurityConfig) -> Self {
        Self::new(inner, scanner)
            .scan_input(config.scan_input)
            .scan_output(config.scan_output)
            .fail_open(config.fail_open)
    }

    pub fn scan_input(mut self, enabled: bool) -> Self {
        self.scan_input = enabled;
        self
    }

    pub fn scan_output(mut self, enabled: bool) -> Self {
        self.scan_output = enabled;
        self
    }

    pub fn fail_open(mut self, enabled: bool) -> Self {
        self.fail_open = enabled;
        self
    }

    async fn check(&self, content: &str, tool: &str, direction: ScanDirection) -> Result<()> {
        let context = ScanContext::new(self.inner.name(), tool, direction);
        let verdict = match self.scanner.scan(content, &context).await {
            Ok(verdict) => verdict,
            Err(e) if self.fail_open => {
                warn!(
                    "Scanner failed for '{}' on '{}', proceeding unscanned: {}",
                    tool,
                    self.inner.name(),
                    e
                );
                return Ok(());
            }
            Err(e @ OrchestratorError::Scanner(_)) => return Err(e),
            Err(e) => return Err(OrchestratorError::Scanner(e.to_string())),
        };

        if verdict.allowed {
            debug!("Scan passed for {:?} of '{}'", direction, tool);
            return Ok(());
        }
        Err(self.blocked(tool, verdict))
    }

    fn blocked(&self, tool: &str, verdict: ScanVerdict) -> OrchestratorError {
        warn!(
            "Blocked '{}' on '{}': risk={:?} threats={:?}",
            tool,
            self.inner.name(),
            verdict.risk,
            verdict.threats
        );
        OrchestratorError::SecurityBlocked {
            tool: tool.to_string(),
            backend: self.inner.name().to_string(),
            risk: verdict.risk.unwrap_or_else(|| "unknown".to_string()),
            threats: verdict.threats,
            reason: verdict.reason,
        }
    }
}

#[async_trait]
impl BackendClient for GuardedClient {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
        self.inner.list_tools().await
    }

    async fn call_tool(&self, call: ToolCall) -> Result<ToolCallResult> {
        if self.scan_input {
            let serialized = serde_json::to_string(&call.arguments)?;
            self.check(&serialized, &call.name, ScanDirection::Input).await?;
        }

        let tool = call.name.clone();
        let result = self.inner.call_tool(call).await?;

        if self.scan_output && result.success && result.content.is_some() {
            self.check(&result.content_text(), &tool, ScanDirection::Output).await?;
        }
        Ok(result)
    }
}
