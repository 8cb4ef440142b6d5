//! Tool groups and response hints
//!
//! Presentation tables layered over the routing table. Nothing here affects
//! which backend a call goes to.

use std::collections::HashMap;

use crate::config::RouterConfig;

use super::definition::{ResponseHint, ToolGroup};

/// Groups and hints, built-in defaults merged with configuration
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    groups: Vec<ToolGroup>,
    hints: HashMap<String, ResponseHint>,
}

impl ToolCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            hints: HashMap::new(),
        }
    }

    /// Catalog with the built-in groups and hints
    pub fn builtin() -> Self {
        Self {
            groups: default_groups(),
            hints: default_hints(),
        }
    }

    /// Built-in tables with configured overrides applied
    ///
    /// Configured groups replace the built-in list; configured hints override
    /// built-in hints for the same tool.
    pub fn from_config(config: &RouterConfig) -> Self {
        let mut catalog = Self::builtin();
        if !config.tool_groups.is_empty() {
            catalog.groups = config.tool_groups.clone();
        }
        for (name, hint) in &config.response_hints {
            catalog.hints.insert(name.clone(), hint.clone());
        }
        catalog
    }

    pub fn add_group(&mut self, group: ToolGroup) {
        self.groups.push(group);
    }

    pub fn add_hint(&mut self, original_name: impl Into<String>, hint: ResponseHint) {
        self.hints.insert(original_name.into(), hint);
    }

    /// First group containing the tool
    pub fn group_for(&self, original_name: &str) -> Option<&ToolGroup> {
        self.groups.iter().find(|g| g.contains(original_name))
    }

    pub fn hint_for(&self, original_name: &str) -> Option<&ResponseHint> {
        self.hints.get(original_name)
    }

    pub fn groups(&self) -> &[ToolGroup] {
        &self.groups
    }

    /// Prefix a description with `[Service | Group]`
    pub fn tag_description(&self, service: &str, original_name: &str, description: &str) -> String {
        let tag = match self.group_for(original_name) {
            Some(group) => format!("[{} | {}]", service, group.label),
            None => format!("[{}]", service),
        };
        if description.is_empty() {
            tag
        } else {
            format!("{} {}", tag, description)
        }
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn default_groups() -> Vec<ToolGroup> {
    vec![
        ToolGroup::new(
            "Messaging",
            "Chat channels",
            &["send_message", "get_messages", "list_chats", "get_me", "subscribe_chat", "get_conversations"],
        ),
        ToolGroup::new(
            "Files",
            "File storage",
            &["list_files", "read_file", "write_file", "delete_file", "move_file", "search_files"],
        ),
        ToolGroup::new(
            "Memory",
            "Long-term facts and profiles",
            &["store_fact", "list_facts", "delete_fact", "search_memories", "get_profile", "update_profile"],
        ),
        ToolGroup::new(
            "Credentials",
            "Password vault",
            &["store_password", "get_password", "list_passwords", "delete_password"],
        ),
        ToolGroup::new(
            "Email & Calendar",
            "Mail and events",
            &["send_email", "list_emails", "get_email", "list_events", "create_event"],
        ),
        ToolGroup::new(
            "Code",
            "Sandboxed code execution",
            &["execute_code", "start_session", "send_to_session", "close_session", "install_package"],
        ),
        ToolGroup::new(
            "Jobs",
            "Scheduled and queued work",
            &["create_job", "list_jobs", "delete_job", "queue_task"],
        ),
        ToolGroup::new("Security", "Content scanning", &["scan_content", "get_scan_log"]),
    ]
}

fn default_hints() -> HashMap<String, ResponseHint> {
    let mut hints = HashMap::new();
    hints.insert(
        "list_files".to_string(),
        ResponseHint::new(&["read_file"], "Read a listed file by passing its path to read_file."),
    );
    hints.insert(
        "get_messages".to_string(),
        ResponseHint::new(&["send_message"], "Reply in the same chat by passing its chat_id to send_message."),
    );
    hints.insert(
        "list_emails".to_string(),
        ResponseHint::new(&["get_email"], "Fetch the full body of a message with get_email."),
    );
    hints.insert(
        "search_memories".to_string(),
        ResponseHint::new(&["store_fact"], "Store anything new you learn with store_fact."),
    );
    hints.insert(
        "create_job".to_string(),
        ResponseHint::new(&["list_jobs"], "Confirm the schedule with list_jobs."),
    );
    hints.insert(
        "execute_code".to_string(),
        ResponseHint::new(&["install_package"], "If an import fails, install the package and run again."),
    );
    hints
}
