//! Backend capability contract

use async_trait::async_trait;

use crate::error::Result;

use super::types::{ToolCall, ToolCallResult, ToolDefinition};

/// Minimal contract every tool-providing backend satisfies
///
/// The router never looks behind this trait: a decorated backend and a plain
/// one are interchangeable.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Unique backend name, used as the namespace prefix
    fn name(&self) -> &str;

    /// Unavailable backends are skipped at discovery
    fn is_available(&self) -> bool;

    /// List the tools this backend currently provides
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>>;

    /// Invoke a tool by its original (unprefixed) name
    async fn call_tool(&self, call: ToolCall) -> Result<ToolCallResult>;
}

#[async_trait]
impl<T: BackendClient + ?Sized> BackendClient for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
        (**self).list_tools().await
    }

    async fn call_tool(&self, call: ToolCall) -> Result<ToolCallResult> {
        (**self).call_tool(call).await
    }
}
