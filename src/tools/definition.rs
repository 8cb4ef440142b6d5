//! Routing-table entries and the presentation tables around them

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::backend::ToolDefinition;

/// One entry of the routing table
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedTool {
    /// Name the agent sees, possibly prefixed with the backend name
    pub exposed_name: String,
    /// Backend that owns the tool
    pub backend_name: String,
    /// Name as defined by the backend
    pub original_name: String,
    /// Definition presented to agents (exposed name, tagged description)
    pub definition: ToolDefinition,
}

impl RoutedTool {
    /// Check if this entry was namespace-prefixed
    pub fn is_prefixed(&self) -> bool {
        self.exposed_name != self.original_name
    }
}

/// Named set of tools, used only to tag descriptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolGroup {
    pub label: String,
    #[serde(default)]
    pub description: String,
    /// Original tool names in this group
    pub tools: BTreeSet<String>,
}

impl ToolGroup {
    /// Create a group from a list of original tool names
    pub fn new(label: impl Into<String>, description: impl Into<String>, tools: &[&str]) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            tools: tools.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn contains(&self, original_name: &str) -> bool {
        self.tools.contains(original_name)
    }
}

/// Advisory follow-up for a tool, keyed by original name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseHint {
    /// Original names of tools worth calling next
    #[serde(default)]
    pub suggest: Vec<String>,
    #[serde(default)]
    pub tip: String,
}

impl ResponseHint {
    pub fn new(suggest: &[&str], tip: impl Into<String>) -> Self {
        Self {
            suggest: suggest.iter().map(|s| s.to_string()).collect(),
            tip: tip.into(),
        }
    }
}

/// A hint whose suggestions have been rewritten to exposed names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedHint {
    pub suggest: Vec<String>,
    pub tip: String,
}
