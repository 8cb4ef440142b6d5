use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::tools::{NestingRule, ResponseHint, ToolGroup};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub router: RouterConfig,
    pub security: SecurityConfig,
    pub channels: ChannelsConfig,
    pub backends: Vec<BackendConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Prefix every tool with its backend name, even without a conflict
    pub always_prefix: bool,
    pub separator: String,
    /// Replaces the built-in groups when non-empty
    pub tool_groups: Vec<ToolGroup>,
    /// Merged over the built-in hints, keyed by original tool name
    pub response_hints: HashMap<String, ResponseHint>,
    /// Replaces the built-in re-nesting rules when set
    pub nesting_rules: Option<Vec<NestingRule>>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            always_prefix: false,
            separator: "_".to_string(),
            tool_groups: Vec::new(),
            response_hints: HashMap::new(),
            nesting_rules: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub scan_input: bool,
    pub scan_output: bool,
    /// Proceed when the scanner itself is unreachable
    pub fail_open: bool,
    /// Backend that provides the scanning tool
    pub scanner_backend: Option<String>,
    pub scanner_tool: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            scan_input: true,
            scan_output: false,
            fail_open: false,
            scanner_backend: None,
            scanner_tool: "scan_content".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    pub poll_interval_ms: u64,
    pub max_messages_per_cycle: usize,
    /// Agent assigned to messages from channels without a binding
    pub default_agent: Option<String>,
    /// Channel name to agent id
    pub bindings: HashMap<String, String>,
    /// Defaults for every adapter
    pub adapter: AdapterConfig,
    /// Per-channel adapter settings, replacing the defaults entirely
    pub overrides: HashMap<String, AdapterConfig>,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10_000,
            max_messages_per_cycle: 20,
            default_agent: None,
            bindings: HashMap::new(),
            adapter: AdapterConfig::default(),
            overrides: HashMap::new(),
        }
    }
}

impl ChannelsConfig {
    /// Effective adapter settings for a channel
    pub fn adapter_for(&self, channel: &str) -> AdapterConfig {
        self.overrides.get(channel).cloned().unwrap_or_else(|| self.adapter.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Text prefixes of the bot's own error/apology replies
    pub bot_patterns: Vec<String>,
    pub chat_refresh_interval_ms: u64,
    pub max_message_age_ms: u64,
    pub messages_per_chat: u32,
    pub chat_list_limit: u32,
    pub high_water_mark: usize,
    pub low_water_mark: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            bot_patterns: vec![
                "Sorry, I encountered an error".to_string(),
                "I apologize, but".to_string(),
            ],
            chat_refresh_interval_ms: 300_000,
            max_message_age_ms: 120_000,
            messages_per_chat: 10,
            chat_list_limit: 50,
            high_water_mark: 1000,
            low_water_mark: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Wrap this backend with the security scanner
    #[serde(default)]
    pub guarded: bool,
    /// Also poll this backend as a chat channel
    #[serde(default)]
    pub channel: bool,
    #[serde(default = "default_backend_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_backend_timeout_ms() -> u64 {
    30_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            router: RouterConfig::default(),
            security: SecurityConfig::default(),
            channels: ChannelsConfig::default(),
            backends: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. ./orchestrator.yml
    /// 3. ~/.config/orchestrator/orchestrator.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");
        let project_config = PathBuf::from(format!("{}.yml", project_name));
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", project_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config = Self::from_yaml(&content)?;
        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.router.separator.is_empty() {
            eyre::bail!("router.separator must not be empty");
        }
        if self.channels.poll_interval_ms == 0 {
            eyre::bail!("channels.poll_interval_ms must be > 0");
        }
        if self.channels.max_messages_per_cycle == 0 {
            eyre::bail!("channels.max_messages_per_cycle must be > 0");
        }

        let adapters = std::iter::once(("defaults", &self.channels.adapter))
            .chain(self.channels.overrides.iter().map(|(k, v)| (k.as_str(), v)));
        for (name, adapter) in adapters {
            if adapter.low_water_mark >= adapter.high_water_mark {
                eyre::bail!(
                    "channels adapter '{}': low_water_mark must be below high_water_mark",
                    name
                );
            }
        }

        let mut seen = std::collections::HashSet::new();
        for backend in &self.backends {
            if !seen.insert(backend.name.as_str()) {
                eyre::bail!("duplicate backend name '{}'", backend.name);
            }
        }
        if let Some(scanner) = &self.security.scanner_backend {
            if !seen.contains(scanner.as_str()) {
                eyre::bail!("security.scanner_backend '{}' is not a configured backend", scanner);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(!config.router.always_prefix);
        assert_eq!(config.router.separator, "_");
        assert!(config.security.scan_input);
        assert!(!config.security.scan_output);
        assert_eq!(config.channels.adapter.chat_refresh_interval_ms, 300_000);
        assert_eq!(config.channels.adapter.max_message_age_ms, 120_000);
        assert_eq!(config.channels.adapter.high_water_mark, 1000);
        assert_eq!(config.channels.adapter.low_water_mark, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_partial_yaml() {
        let yaml = r#"
router:
  always_prefix: true
channels:
  poll_interval_ms: 5000
  bindings:
    telegram: annabelle
backends:
  - name: telegram
    url: http://localhost:8002
    channel: true
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.router.always_prefix);
        assert_eq!(config.router.separator, "_");
        assert_eq!(config.channels.poll_interval_ms, 5000);
        assert_eq!(config.channels.max_messages_per_cycle, 20);
        assert_eq!(config.backends.len(), 1);
        assert!(config.backends[0].channel);
        assert!(!config.backends[0].guarded);
        assert_eq!(config.backends[0].timeout_ms, 30_000);
        assert_eq!(config.channels.bindings.get("telegram").map(String::as_str), Some("annabelle"));
        assert_eq!(config.channels.default_agent, None);
    }

    #[test]
    fn test_config_adapter_overrides() {
        let yaml = r#"
channels:
  default_agent: main
  overrides:
    telegram:
      bot_patterns: ["Oops"]
      max_message_age_ms: 60000
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let tg = config.channels.adapter_for("telegram");
        assert_eq!(tg.bot_patterns, vec!["Oops".to_string()]);
        assert_eq!(tg.max_message_age_ms, 60_000);
        assert_eq!(tg.chat_refresh_interval_ms, 300_000);

        let other = config.channels.adapter_for("slack");
        assert_eq!(other, AdapterConfig::default());
        assert_eq!(config.channels.default_agent.as_deref(), Some("main"));
    }

    #[test]
    fn test_config_rejects_empty_separator() {
        let yaml = "router:\n  separator: \"\"\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_config_rejects_inverted_water_marks() {
        let yaml = "channels:\n  adapter:\n    high_water_mark: 10\n    low_water_mark: 20\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_config_rejects_duplicate_backends() {
        let yaml = r#"
backends:
  - name: a
    url: http://one
  - name: a
    url: http://two
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_config_rejects_unknown_scanner_backend() {
        let yaml = "security:\n  scanner_backend: guardian\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_config_load_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.yml");
        std::fs::write(&path, "log_level: debug\nsecurity:\n  fail_open: true\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert!(config.security.fail_open);
    }

    #[test]
    fn test_config_load_missing_explicit_path() {
        let path = PathBuf::from("/nonexistent/orchestrator.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_config_tool_groups_yaml() {
        let yaml = r#"
router:
  tool_groups:
    - label: Files
      description: File storage
      tools: [list_files, read_file]
  response_hints:
    list_files:
      suggest: [read_file]
      tip: Read one of the listed files next.
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.router.tool_groups.len(), 1);
        assert!(config.router.tool_groups[0].tools.contains("read_file"));
        assert_eq!(config.router.response_hints["list_files"].suggest, vec!["read_file".to_string()]);
    }
}
