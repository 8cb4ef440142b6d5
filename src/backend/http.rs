//! JSON-over-HTTP backend client
//!
//! Wire format:
//! - `GET  {url}/health`     -> any 2xx means available
//! - `GET  {url}/tools`      -> `{"tools": [ToolDefinition]}` or a bare list
//! - `POST {url}/tools/call` -> body `{name, arguments}`, response is a
//!   `ToolCallResult` or the standard `{success, data}` envelope

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;

use crate::error::{OrchestratorError, Result};

use super::client::BackendClient;
use super::types::{ToolCall, ToolCallResult, ToolDefinition, unwrap_envelope};

/// Backend reached over HTTP
pub struct HttpBackend {
    name: String,
    base_url: String,
    client: reqwest::Client,
    available: AtomicBool,
}

impl HttpBackend {
    /// Create a client for the backend at `base_url`
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            available: AtomicBool::new(true),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Probe the health endpoint and update availability
    pub async fn check_health(&self) -> bool {
        let healthy = match self.client.get(self.endpoint("health")).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Health check for '{}' failed: {}", self.name, e);
                false
            }
        };

        let was = self.available.swap(healthy, Ordering::SeqCst);
        if was && !healthy {
            warn!("Backend '{}' became unavailable", self.name);
        }
        healthy
    }
}

fn parse_tool_list(body: &Value) -> Result<Vec<ToolDefinition>> {
    let body = unwrap_envelope(body);
    let list = body.get("tools").unwrap_or(body);
    Ok(serde_json::from_value(list.clone())?)
}

#[async_trait]
impl BackendClient for HttpBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
        let resp = self.client.get(self.endpoint("tools")).send().await?;
        if !resp.status().is_success() {
            return Err(OrchestratorError::backend(
                &self.name,
                format!("tool listing returned {}", resp.status()),
            ));
        }
        let body: Value = resp.json().await?;
        parse_tool_list(&body)
    }

    async fn call_tool(&self, call: ToolCall) -> Result<ToolCallResult> {
        let resp = self.client.post(self.endpoint("tools/call")).json(&call).send().await?;
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(Value::Null);

        if !status.is_success() && body.get("success").is_none() {
            return Err(OrchestratorError::backend(
                &self.name,
                format!("call to '{}' returned {}", call.name, status),
            ));
        }
        Ok(ToolCallResult::from_response(body))
    }
}
