//! Orchestrator - wires configuration into the router, guards, and channels

use std::sync::Arc;

use log::{info, warn};
use serde_json::Value;

use crate::backend::{BackendClient, BackendMetadata, HttpBackend, ToolCallResult};
use crate::channels::{ChannelManager, GenericChannelAdapter, MessageHandler};
use crate::config::{BackendConfig, Config};
use crate::error::{OrchestratorError, Result};
use crate::security::{BackendScanner, GuardedClient, Scanner};
use crate::tools::ToolRouter;

/// Owns the router and the channel manager for one configuration
pub struct Orchestrator {
    config: Config,
    router: Arc<ToolRouter>,
    channels: ChannelManager,
    http_backends: Vec<Arc<HttpBackend>>,
}

impl Orchestrator {
    /// Router and channel manager with no backends registered
    pub fn new(config: Config) -> Self {
        let router = Arc::new(ToolRouter::new(config.router.clone()));
        let channels = ChannelManager::new(config.channels.clone());
        Self {
            config,
            router,
            channels,
            http_backends: Vec::new(),
        }
    }

    /// Build HTTP clients for every configured backend
    ///
    /// Guarded backends are wrapped with a scanner that calls
    /// `security.scanner_tool` on `security.scanner_backend`; backends marked
    /// as channels also get an adapter.
    pub fn from_config(config: Config) -> Result<Self> {
        let mut orchestrator = Self::new(config);

        let clients = orchestrator
            .config
            .backends
            .iter()
            .map(|b| Ok((b.clone(), Arc::new(HttpBackend::new(&b.name, &b.url, b.timeout_ms)?))))
            .collect::<Result<Vec<(BackendConfig, Arc<HttpBackend>)>>>()?;

        let scanner = orchestrator.build_scanner(&clients)?;
        for (backend, client) in clients {
            orchestrator.http_backends.push(client.clone());
            let client: Arc<dyn BackendClient> = match (&scanner, backend.guarded) {
                (Some(scanner), true) => Arc::new(GuardedClient::from_config(
                    Box::new(client),
                    scanner.clone(),
                    &orchestrator.config.security,
                )),
                _ => client,
            };
            orchestrator.add_backend(&backend, client);
        }
        Ok(orchestrator)
    }

    fn build_scanner(&self, clients: &[(BackendConfig, Arc<HttpBackend>)]) -> Result<Option<Arc<dyn Scanner>>> {
        let guarded: Vec<&str> = clients
            .iter()
            .filter(|(b, _)| b.guarded)
            .map(|(b, _)| b.name.as_str())
            .collect();
        if guarded.is_empty() {
            return Ok(None);
        }

        let security = &self.config.security;
        let scanner_name = security.scanner_backend.as_deref().ok_or_else(|| {
            OrchestratorError::Config(format!(
                "backends {:?} are guarded but security.scanner_backend is not set",
                guarded
            ))
        })?;
        if guarded.contains(&scanner_name) {
            return Err(OrchestratorError::Config(format!(
                "scanner backend '{}' cannot itself be guarded",
                scanner_name
            )));
        }

        let (_, scanner_client) = clients
            .iter()
            .find(|(b, _)| b.name == scanner_name)
            .ok_or_else(|| OrchestratorError::Config(format!("unknown scanner backend '{}'", scanner_name)))?;
        let scanner: Arc<dyn Scanner> = Arc::new(BackendScanner::new(
            scanner_client.clone(),
            security.scanner_tool.clone(),
        ));
        Ok(Some(scanner))
    }

    /// Register a backend client under a configured entry
    pub fn add_backend(&self, backend: &BackendConfig, client: Arc<dyn BackendClient>) {
        let metadata = BackendMetadata {
            label: backend.label.clone(),
            description: backend.description.clone(),
        };
        self.router.register_backend(&backend.name, client, Some(metadata));
        if backend.channel {
            self.add_channel(&backend.name);
        }
    }

    /// Poll a registered backend as a chat channel
    pub fn add_channel(&self, name: &str) {
        let adapter = GenericChannelAdapter::new(name, self.router.clone(), self.config.channels.adapter_for(name));
        self.channels.register_adapter(Arc::new(adapter));
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &Arc<ToolRouter> {
        &self.router
    }

    pub fn channels(&self) -> &ChannelManager {
        &self.channels
    }

    /// Health-check HTTP backends, then rebuild the routing table
    pub async fn refresh(&self) -> usize {
        for backend in &self.http_backends {
            backend.check_health().await;
        }
        self.router.discover_tools().await
    }

    /// Discover tools, initialize channels, and start polling
    pub async fn start(&self, handler: Arc<dyn MessageHandler>) -> usize {
        let tools = self.refresh().await;
        info!("Routing {} tools from {} backends", tools, self.router.backend_names().len());

        self.channels.set_dispatcher(handler);
        let channels = self.channels.get_channels();
        if channels.is_empty() {
            warn!("No channel backends configured, nothing to poll");
            return tools;
        }
        self.channels.initialize().await;
        self.channels.start();
        tools
    }

    pub async fn stop(&self) {
        self.channels.stop().await;
    }

    /// Route a tool call by exposed name
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult> {
        self.router.route_tool_call(name, arguments).await
    }
}
