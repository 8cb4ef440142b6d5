//! Tool routing across registered backends
//!
//! The router owns the backend registry and a routing table mapping exposed
//! names to `(backend, original name)`. Discovery rebuilds the table from
//! scratch and swaps it in with one assignment; calls resolve against a
//! snapshot, so a call in flight during discovery completes against the table
//! it started with.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use log::{debug, info, warn};
use serde_json::Value;

use crate::backend::{BackendClient, BackendMetadata, ToolCall, ToolCallResult, ToolDefinition};
use crate::config::RouterConfig;
use crate::error::{OrchestratorError, Result};

use super::catalog::ToolCatalog;
use super::definition::{ResolvedHint, RoutedTool};
use super::normalize::{ArgumentNormalizer, default_nesting_rules};
use super::policy::ToolPolicy;

struct RegisteredBackend {
    name: String,
    client: Arc<dyn BackendClient>,
    metadata: BackendMetadata,
}

impl RegisteredBackend {
    fn service_label(&self) -> &str {
        self.metadata.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Default)]
struct RoutingTable {
    tools: Vec<RoutedTool>,
    index: HashMap<String, usize>,
}

impl RoutingTable {
    fn get(&self, exposed_name: &str) -> Option<&RoutedTool> {
        self.index.get(exposed_name).map(|&i| &self.tools[i])
    }

    fn insert(&mut self, tool: RoutedTool) -> bool {
        if self.index.contains_key(&tool.exposed_name) {
            return false;
        }
        self.index.insert(tool.exposed_name.clone(), self.tools.len());
        self.tools.push(tool);
        true
    }

    fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.exposed_name.as_str()).collect()
    }
}

/// Flat, conflict-free tool namespace over many backends
pub struct ToolRouter {
    config: RouterConfig,
    catalog: ToolCatalog,
    normalizer: ArgumentNormalizer,
    backends: RwLock<Vec<RegisteredBackend>>,
    table: RwLock<Arc<RoutingTable>>,
    discovery: tokio::sync::Mutex<()>,
    reported_unavailable: Mutex<HashSet<String>>,
}

impl ToolRouter {
    /// Create a router with the built-in catalog and nesting rules
    pub fn new(config: RouterConfig) -> Self {
        let catalog = ToolCatalog::from_config(&config);
        let rules = config.nesting_rules.clone().unwrap_or_else(default_nesting_rules);
        Self {
            config,
            catalog,
            normalizer: ArgumentNormalizer::new(rules),
            backends: RwLock::new(Vec::new()),
            table: RwLock::new(Arc::new(RoutingTable::default())),
            discovery: tokio::sync::Mutex::new(()),
            reported_unavailable: Mutex::new(HashSet::new()),
        }
    }

    /// Replace the presentation catalog
    pub fn with_catalog(mut self, catalog: ToolCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn separator(&self) -> &str {
        &self.config.separator
    }

    /// Register a backend; takes effect at the next discovery
    ///
    /// Registering an existing name replaces its client in place.
    pub fn register_backend(
        &self,
        name: impl Into<String>,
        client: Arc<dyn BackendClient>,
        metadata: Option<BackendMetadata>,
    ) {
        let name = name.into();
        let entry = RegisteredBackend {
            name: name.clone(),
            client,
            metadata: metadata.unwrap_or_default(),
        };

        let mut backends = write(&self.backends);
        match backends.iter_mut().find(|b| b.name == name) {
            Some(existing) => {
                info!("Replacing backend registration '{}'", name);
                *existing = entry;
            }
            None => {
                info!("Registered backend '{}'", name);
                backends.push(entry);
            }
        }
    }

    /// Remove a backend; its tools stay in the table until the next discovery
    pub fn unregister_backend(&self, name: &str) -> bool {
        let mut backends = write(&self.backends);
        let before = backends.len();
        backends.retain(|b| b.name != name);
        let removed = backends.len() != before;
        if removed {
            info!("Unregistered backend '{}'", name);
        }
        removed
    }

    /// Names of registered backends, in registration order
    pub fn backend_names(&self) -> Vec<String> {
        read(&self.backends).iter().map(|b| b.name.clone()).collect()
    }

    fn backend_client(&self, name: &str) -> Option<Arc<dyn BackendClient>> {
        read(&self.backends)
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.client.clone())
    }

    fn snapshot(&self) -> Arc<RoutingTable> {
        read(&self.table).clone()
    }

    /// Rebuild the routing table from every available backend
    ///
    /// Returns the number of exposed tools.
    pub async fn discover_tools(&self) -> usize {
        let _serial = self.discovery.lock().await;

        let backends: Vec<(String, String, Arc<dyn BackendClient>)> = read(&self.backends)
            .iter()
            .map(|b| (b.name.clone(), b.service_label().to_string(), b.client.clone()))
            .collect();

        let mut sources: Vec<(String, String, Vec<ToolDefinition>)> = Vec::new();
        for (name, label, client) in backends {
            if !client.is_available() {
                if lock(&self.reported_unavailable).insert(name.clone()) {
                    warn!("Backend '{}' is unavailable, skipping its tools", name);
                }
                continue;
            }
            if lock(&self.reported_unavailable).remove(&name) {
                info!("Backend '{}' is available again", name);
            }

            match client.list_tools().await {
                Ok(tools) => {
                    let mut seen = HashSet::new();
                    let tools: Vec<ToolDefinition> =
                        tools.into_iter().filter(|t| seen.insert(t.name.clone())).collect();
                    debug!("Backend '{}' lists {} tools", name, tools.len());
                    sources.push((name, label, tools));
                }
                Err(e) => warn!("Failed to list tools from '{}': {}", name, e),
            }
        }

        let table = self.build_table(&sources);
        let count = table.tools.len();
        *write(&self.table) = Arc::new(table);

        info!("Discovered {} tools from {} backends", count, sources.len());
        count
    }

    fn build_table(&self, sources: &[(String, String, Vec<ToolDefinition>)]) -> RoutingTable {
        let mut providers: HashMap<&str, usize> = HashMap::new();
        for (_, _, tools) in sources {
            for tool in tools {
                *providers.entry(tool.name.as_str()).or_default() += 1;
            }
        }

        let needs_prefix =
            |tool: &str| self.config.always_prefix || providers.get(tool).copied().unwrap_or(0) > 1;

        let mut prefixed_names: HashSet<String> = HashSet::new();
        for (backend, _, tools) in sources {
            for tool in tools {
                if needs_prefix(tool.name.as_str()) {
                    prefixed_names.insert(self.prefixed_name(backend, &tool.name));
                }
            }
        }

        let mut table = RoutingTable::default();
        for (backend, label, tools) in sources {
            for tool in tools {
                let exposed_name = if needs_prefix(tool.name.as_str()) {
                    self.prefixed_name(backend, &tool.name)
                } else if prefixed_names.contains(&tool.name) {
                    warn!(
                        "Tool '{}' from '{}' collides with a prefixed name, prefixing it too",
                        tool.name, backend
                    );
                    self.prefixed_name(backend, &tool.name)
                } else {
                    tool.name.clone()
                };

                let definition = ToolDefinition::new(
                    exposed_name.clone(),
                    self.catalog.tag_description(label, &tool.name, &tool.description),
                    tool.input_schema.clone(),
                );
                let routed = RoutedTool {
                    exposed_name,
                    backend_name: backend.clone(),
                    original_name: tool.name.clone(),
                    definition,
                };

                let exposed = routed.exposed_name.clone();
                if !table.insert(routed) {
                    warn!("Skipping duplicate exposed tool name '{}' from '{}'", exposed, backend);
                }
            }
        }
        table
    }

    fn prefixed_name(&self, backend: &str, tool: &str) -> String {
        format!("{}{}{}", backend, self.config.separator, tool)
    }

    /// Route a call by exposed name
    ///
    /// Every failure comes back as a failure result the agent can read,
    /// except a security block, which is returned as an error.
    pub async fn route_tool_call(&self, exposed_name: &str, args: Value) -> Result<ToolCallResult> {
        let table = self.snapshot();

        let Some(routed) = table.get(exposed_name) else {
            warn!("Unknown tool requested: {}", exposed_name);
            let err = OrchestratorError::UnknownTool(exposed_name.to_string());
            let known = table.names();
            let message = if known.is_empty() {
                format!("{}. No tools are available", err)
            } else {
                format!("{}. Available tools: {}", err, known.join(", "))
            };
            return Ok(ToolCallResult::failure_with_code(message, err.error_code()));
        };

        let client = match self.backend_client(&routed.backend_name) {
            Some(client) if client.is_available() => client,
            _ => {
                let err = OrchestratorError::BackendUnavailable(routed.backend_name.clone());
                return Ok(ToolCallResult::failure_with_code(err.to_string(), err.error_code()));
            }
        };

        let args = match self.normalizer.normalize(&routed.original_name, args) {
            Ok(args) => args,
            Err(e) => {
                warn!("Rejected arguments for '{}': {}", exposed_name, e);
                return Ok(ToolCallResult::failure_with_code(e.to_string(), e.error_code()));
            }
        };

        debug!(
            "Routing '{}' to '{}' as '{}'",
            exposed_name, routed.backend_name, routed.original_name
        );
        match client.call_tool(ToolCall::new(routed.original_name.clone(), args)).await {
            Ok(result) => Ok(result),
            Err(e) if e.is_security_block() => {
                warn!("Call to '{}' blocked: {}", exposed_name, e);
                Err(e)
            }
            Err(e) => {
                warn!("Call to '{}' failed: {}", exposed_name, e);
                Ok(ToolCallResult::failure_with_code(e.to_string(), e.error_code()))
            }
        }
    }

    /// Definitions of every exposed tool, in table order
    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.snapshot().tools.iter().map(|t| t.definition.clone()).collect()
    }

    /// Definitions admitted by the allow/deny globs
    pub fn get_filtered_tool_definitions<S: AsRef<str>>(&self, allow: &[S], deny: &[S]) -> Vec<ToolDefinition> {
        let policy = ToolPolicy::new(allow, deny);
        self.snapshot()
            .tools
            .iter()
            .filter(|t| policy.allows(&t.exposed_name))
            .map(|t| t.definition.clone())
            .collect()
    }

    /// Check if an exposed name is currently routable
    pub fn has_tool(&self, exposed_name: &str) -> bool {
        self.snapshot().get(exposed_name).is_some()
    }

    pub fn get_routed_tool(&self, exposed_name: &str) -> Option<RoutedTool> {
        self.snapshot().get(exposed_name).cloned()
    }

    /// All routing entries, in table order
    pub fn routed_tools(&self) -> Vec<RoutedTool> {
        self.snapshot().tools.clone()
    }

    /// Exposed name under which a backend's tool is currently routed
    pub fn resolve_exposed_name(&self, backend: &str, original_name: &str) -> Option<String> {
        self.snapshot()
            .tools
            .iter()
            .find(|t| t.backend_name == backend && t.original_name == original_name)
            .map(|t| t.exposed_name.clone())
    }

    /// Follow-up suggestions for a tool, rewritten to exposed names
    ///
    /// A suggestion served by the same backend wins; otherwise every backend
    /// serving it is listed. Suggestions with no current route are dropped.
    pub fn get_response_hints(&self, exposed_name: &str) -> Option<ResolvedHint> {
        let table = self.snapshot();
        let routed = table.get(exposed_name)?;
        let hint = self.catalog.hint_for(&routed.original_name)?;

        let mut suggest: Vec<String> = Vec::new();
        for target in &hint.suggest {
            let candidates: Vec<&RoutedTool> = table.tools.iter().filter(|t| &t.original_name == target).collect();
            let same_backend: Vec<&RoutedTool> = candidates
                .iter()
                .copied()
                .filter(|t| t.backend_name == routed.backend_name)
                .collect();
            let chosen = if same_backend.is_empty() { candidates } else { same_backend };

            for tool in chosen {
                if !suggest.contains(&tool.exposed_name) {
                    suggest.push(tool.exposed_name.clone());
                }
            }
        }

        Some(ResolvedHint {
            suggest,
            tip: hint.tip.clone(),
        })
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
