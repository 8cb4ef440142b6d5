//! Wire types shared by every backend
//!
//! Tool definitions, calls, and results as they travel between the router
//! and the backends behind it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition as listed by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_schema")]
    pub input_schema: Value,
}

fn empty_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {}
    })
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Create a tool definition with an empty object schema
    pub fn simple(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, empty_schema())
    }
}

/// A tool invocation forwarded to a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Result of a tool call
///
/// Mirrors the platform's standard response contract: `success` plus either
/// `content` or `error`, with an optional machine-readable `errorCode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl ToolCallResult {
    /// Create a successful result
    pub fn success(content: Value) -> Self {
        Self {
            success: true,
            content: Some(content),
            error: None,
            error_code: None,
        }
    }

    /// Create a failure result
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            content: None,
            error: Some(error.into()),
            error_code: None,
        }
    }

    /// Create a failure result carrying an error code
    pub fn failure_with_code(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error_code: Some(code.into()),
            ..Self::failure(error)
        }
    }

    /// Interpret an arbitrary JSON response body
    ///
    /// Accepts `{success, content}`, the `{success, data, error, errorCode}`
    /// envelope, or any other value as successful content.
    pub fn from_response(value: Value) -> Self {
        let Some(success) = value.get("success").and_then(Value::as_bool) else {
            return Self::success(value);
        };

        let content = value
            .get("content")
            .or_else(|| value.get("data"))
            .filter(|v| !v.is_null())
            .cloned();
        let error = value.get("error").and_then(|e| match e {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        });
        let error_code = value.get("errorCode").and_then(Value::as_str).map(String::from);

        Self {
            success,
            content,
            error,
            error_code,
        }
    }

    /// Content rendered as text, for scanning and display
    pub fn content_text(&self) -> String {
        match &self.content {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

/// Strip the standard `{success, data}` envelope if present
pub fn unwrap_envelope(value: &Value) -> &Value {
    match value.get("data") {
        Some(data) if value.get("success").is_some() => data,
        _ => value,
    }
}

/// Optional metadata supplied at registration time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendMetadata {
    /// Service label shown in description tags
    pub label: Option<String>,
    pub description: Option<String>,
}

impl BackendMetadata {
    /// Create metadata with a display label
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            description: None,
        }
    }
}
