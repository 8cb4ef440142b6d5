//! In-memory backend for tests and local development

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{OrchestratorError, Result};

use super::client::BackendClient;
use super::types::{ToolCall, ToolCallResult, ToolDefinition};

enum Scripted {
    Result(ToolCallResult),
    Fail(String),
}

/// Backend with scripted responses that records every call it receives
///
/// Queued responses are consumed first; after that the fixed response for the
/// tool (if any) is returned on every call.
pub struct MockBackend {
    name: String,
    available: AtomicBool,
    tools: Mutex<Vec<ToolDefinition>>,
    fixed: Mutex<HashMap<String, Scripted>>,
    queued: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<ToolCall>>,
    list_error: Mutex<Option<String>>,
}

impl MockBackend {
    /// Create an available backend with no tools
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            available: AtomicBool::new(true),
            tools: Mutex::new(Vec::new()),
            fixed: Mutex::new(HashMap::new()),
            queued: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            list_error: Mutex::new(None),
        }
    }

    /// Add tools by name with a generic description
    pub fn with_tools(self, names: &[&str]) -> Self {
        for name in names {
            self.add_tool(ToolDefinition::simple(*name, format!("{} tool", name)));
        }
        self
    }

    /// Add a full tool definition
    pub fn with_tool(self, tool: ToolDefinition) -> Self {
        self.add_tool(tool);
        self
    }

    /// Set a fixed successful response for a tool
    pub fn with_response(self, tool: &str, content: Value) -> Self {
        self.set_response(tool, ToolCallResult::success(content));
        self
    }

    /// Make every call to a tool fail with a backend error
    pub fn with_error(self, tool: &str, message: &str) -> Self {
        lock(&self.fixed).insert(tool.to_string(), Scripted::Fail(message.to_string()));
        self
    }

    /// Mark the backend unavailable
    pub fn unavailable(self) -> Self {
        self.set_available(false);
        self
    }

    pub fn add_tool(&self, tool: ToolDefinition) {
        lock(&self.tools).push(tool);
    }

    pub fn remove_tool(&self, name: &str) {
        lock(&self.tools).retain(|t| t.name != name);
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_response(&self, tool: &str, result: ToolCallResult) {
        lock(&self.fixed).insert(tool.to_string(), Scripted::Result(result));
    }

    /// Queue a one-shot response for a tool
    pub fn push_response(&self, tool: &str, content: Value) {
        lock(&self.queued)
            .entry(tool.to_string())
            .or_default()
            .push_back(Scripted::Result(ToolCallResult::success(content)));
    }

    /// Queue a one-shot backend error for a tool
    pub fn push_error(&self, tool: &str, message: &str) {
        lock(&self.queued)
            .entry(tool.to_string())
            .or_default()
            .push_back(Scripted::Fail(message.to_string()));
    }

    /// Make `list_tools` fail
    pub fn fail_listing(&self, message: Option<&str>) {
        *lock(&self.list_error) = message.map(String::from);
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<ToolCall> {
        lock(&self.calls).clone()
    }

    /// Calls received for one tool
    pub fn calls_to(&self, tool: &str) -> Vec<ToolCall> {
        lock(&self.calls).iter().filter(|c| c.name == tool).cloned().collect()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    fn scripted(&self, tool: &str) -> Option<Result<ToolCallResult>> {
        let to_result = |s: &Scripted| match s {
            Scripted::Result(r) => Ok(r.clone()),
            Scripted::Fail(msg) => Err(OrchestratorError::backend(&self.name, msg.clone())),
        };

        if let Some(next) = lock(&self.queued).get_mut(tool).and_then(VecDeque::pop_front) {
            return Some(to_result(&next));
        }
        lock(&self.fixed).get(tool).map(to_result)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl BackendClient for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
        if let Some(message) = lock(&self.list_error).clone() {
            return Err(OrchestratorError::backend(&self.name, message));
        }
        Ok(lock(&self.tools).clone())
    }

    async fn call_tool(&self, call: ToolCall) -> Result<ToolCallResult> {
        lock(&self.calls).push(call.clone());

        match self.scripted(&call.name) {
            Some(result) => result,
            None => Ok(ToolCallResult::failure(format!(
                "No mock response configured for tool: {}",
                call.name
            ))),
        }
    }
}
