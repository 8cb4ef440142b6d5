//! Channel adapters
//!
//! A `GenericChannelAdapter` turns any chat-style backend reachable through the
//! router into a stream of new, deduplicated messages. It never calls a
//! backend to find out what it supports; capabilities come from which routes
//! exist when the adapter is initialized.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::backend::unwrap_envelope;
use crate::config::AdapterConfig;
use crate::error::{OrchestratorError, Result};
use crate::tools::ToolRouter;

use super::message::{IncomingMessage, RawMessage, id_string, messages_from_response};

const GET_MESSAGES: &str = "get_messages";
const SEND_MESSAGE: &str = "send_message";
const GET_ME: &str = "get_me";
const LIST_CHATS: &str = "list_chats";
const SUBSCRIBE_CHAT: &str = "subscribe_chat";

/// A source of inbound messages that can also deliver replies
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Channel name, unique within a manager
    fn channel(&self) -> &str;

    async fn initialize(&self) -> Result<()>;

    /// New messages since the last poll, oldest first
    async fn poll(&self) -> Result<Vec<IncomingMessage>>;

    /// Best-effort delivery; failures are logged, not returned
    async fn send_message(&self, chat_id: &str, text: &str);

    async fn shutdown(&self) -> Result<()>;
}

/// Optional backend features, probed once by route existence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelCapabilities {
    /// `get_me` is routable
    pub identity: bool,
    /// `list_chats` is routable
    pub chat_listing: bool,
    /// `subscribe_chat` is routable
    pub subscriptions: bool,
}

#[derive(Debug, Default)]
struct AdapterState {
    initialized: bool,
    capabilities: ChannelCapabilities,
    bot_user_id: Option<String>,
    monitored_chat_ids: Vec<String>,
    processed_message_ids: HashSet<String>,
    last_chat_refresh: Option<Instant>,
}

/// Adapter over a channel backend's tools
pub struct GenericChannelAdapter {
    channel: String,
    router: Arc<ToolRouter>,
    config: AdapterConfig,
    state: Mutex<AdapterState>,
}

impl GenericChannelAdapter {
    pub fn new(channel: impl Into<String>, router: Arc<ToolRouter>, config: AdapterConfig) -> Self {
        Self {
            channel: channel.into(),
            router,
            config,
            state: Mutex::new(AdapterState::default()),
        }
    }

    /// Capability record from the last `initialize`
    pub async fn capabilities(&self) -> ChannelCapabilities {
        self.state.lock().await.capabilities
    }

    pub async fn bot_user_id(&self) -> Option<String> {
        self.state.lock().await.bot_user_id.clone()
    }

    pub async fn monitored_chats(&self) -> Vec<String> {
        self.state.lock().await.monitored_chat_ids.clone()
    }

    /// Number of message ids remembered for deduplication
    pub async fn processed_count(&self) -> usize {
        self.state.lock().await.processed_message_ids.len()
    }

    pub async fn is_processed(&self, id: &str) -> bool {
        self.state.lock().await.processed_message_ids.contains(id)
    }

    /// Exposed name of one of this channel's tools
    ///
    /// Whatever name the router gave the channel backend's tool; otherwise
    /// `{channel}{separator}{tool}`, but only while this channel's backend owns it.
    fn route(&self, tool: &str) -> Option<String> {
        if let Some(exposed) = self.router.resolve_exposed_name(&self.channel, tool) {
            return Some(exposed);
        }
        let conventional = format!("{}{}{}", self.channel, self.router.separator(), tool);
        self.router
            .get_routed_tool(&conventional)
            .filter(|routed| routed.backend_name == self.channel)
            .map(|_| conventional)
    }

    async fn call(&self, tool: &str, args: Value) -> Result<Value> {
        let exposed = self
            .route(tool)
            .ok_or_else(|| OrchestratorError::channel(&self.channel, format!("no route for '{}'", tool)))?;

        let result = self.router.route_tool_call(&exposed, args).await?;
        if !result.success {
            let error = result.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(OrchestratorError::channel(&self.channel, format!("{} failed: {}", tool, error)));
        }
        Ok(result.content.map(|c| unwrap_envelope(&c).clone()).unwrap_or(Value::Null))
    }

    async fn fetch_bot_id(&self) -> Option<String> {
        match self.call(GET_ME, json!({})).await {
            Ok(content) => {
                let user = content.get("user").unwrap_or(&content);
                user.get("id").and_then(id_string)
            }
            Err(e) => {
                warn!("[{}] Identity lookup failed: {}", self.channel, e);
                None
            }
        }
    }

    fn refresh_due(&self, state: &AdapterState) -> bool {
        let interval = Duration::from_millis(self.config.chat_refresh_interval_ms);
        state.monitored_chat_ids.is_empty()
            || state.last_chat_refresh.is_none_or(|at| at.elapsed() >= interval)
    }

    async fn discover_chats(&self, caps: ChannelCapabilities) -> Vec<String> {
        if caps.subscriptions {
            match self.call(SUBSCRIBE_CHAT, json!({"action": "list"})).await {
                Ok(content) => {
                    let chats = ids_under(&content, "subscriptions");
                    if !chats.is_empty() {
                        return chats;
                    }
                    debug!("[{}] No subscriptions, falling back to chat listing", self.channel);
                }
                Err(e) => warn!("[{}] Subscription listing failed: {}", self.channel, e),
            }
        }

        if caps.chat_listing {
            match self
                .call(LIST_CHATS, json!({"limit": self.config.chat_list_limit}))
                .await
            {
                Ok(content) => return ids_under(&content, "chats"),
                Err(e) => warn!("[{}] Chat listing failed: {}", self.channel, e),
            }
        }
        Vec::new()
    }

    async fn fetch(&self, state: &AdapterState) -> Result<Vec<(RawMessage, Option<String>)>> {
        let limit = self.config.messages_per_chat;
        let caps = state.capabilities;

        if !caps.subscriptions && !caps.chat_listing {
            let content = self.call(GET_MESSAGES, json!({"limit": limit})).await?;
            return Ok(messages_from_response(&content).into_iter().map(|m| (m, None)).collect());
        }

        let mut fetched = Vec::new();
        for chat_id in &state.monitored_chat_ids {
            match self
                .call(GET_MESSAGES, json!({"chat_id": chat_id, "limit": limit}))
                .await
            {
                Ok(content) => fetched.extend(
                    messages_from_response(&content)
                        .into_iter()
                        .map(|m| (m, Some(chat_id.clone()))),
                ),
                Err(e) => warn!("[{}] Fetching chat {} failed: {}", self.channel, chat_id, e),
            }
        }
        Ok(fetched)
    }

    /// Run one raw message through the filter pipeline
    fn admit(&self, state: &mut AdapterState, raw: &RawMessage, now: DateTime<Utc>) -> bool {
        if state.processed_message_ids.contains(&raw.id) {
            return false;
        }

        let from_self = raw.is_outgoing
            || matches!((&state.bot_user_id, &raw.sender_id), (Some(bot), Some(sender)) if bot == sender);
        if from_self {
            state.processed_message_ids.insert(raw.id.clone());
            return false;
        }

        if raw.text.trim().is_empty() {
            return false;
        }

        if let Some(date) = raw.date {
            let age = now.signed_duration_since(date).num_milliseconds();
            if age > self.config.max_message_age_ms as i64 {
                debug!("[{}] Dropping stale message {} ({}ms old)", self.channel, raw.id, age);
                return false;
            }
        }

        let text = raw.text.trim_start();
        if self.config.bot_patterns.iter().any(|p| text.starts_with(p.as_str())) {
            state.processed_message_ids.insert(raw.id.clone());
            return false;
        }

        state.processed_message_ids.insert(raw.id.clone());
        true
    }

    fn evict(&self, state: &mut AdapterState) {
        let ids = &mut state.processed_message_ids;
        if ids.len() <= self.config.high_water_mark {
            return;
        }

        let mut sorted: Vec<String> = ids.drain().collect();
        sorted.sort_by(|a, b| compare_ids(a, b));
        let keep_from = sorted.len().saturating_sub(self.config.low_water_mark);
        ids.extend(sorted.into_iter().skip(keep_from));
        debug!("[{}] Evicted {} processed message ids", self.channel, keep_from);
    }
}

#[async_trait]
impl ChannelAdapter for GenericChannelAdapter {
    fn channel(&self) -> &str {
        &self.channel
    }

    async fn initialize(&self) -> Result<()> {
        if self.route(GET_MESSAGES).is_none() {
            return Err(OrchestratorError::channel(
                &self.channel,
                format!("backend does not expose '{}'", GET_MESSAGES),
            ));
        }

        let capabilities = ChannelCapabilities {
            identity: self.route(GET_ME).is_some(),
            chat_listing: self.route(LIST_CHATS).is_some(),
            subscriptions: self.route(SUBSCRIBE_CHAT).is_some(),
        };
        let bot_user_id = if capabilities.identity {
            self.fetch_bot_id().await
        } else {
            None
        };

        let mut state = self.state.lock().await;
        state.capabilities = capabilities;
        state.bot_user_id = bot_user_id;
        state.initialized = true;

        info!(
            "[{}] Initialized (identity={}, chat_listing={}, subscriptions={}, bot_user_id={:?})",
            self.channel,
            capabilities.identity,
            capabilities.chat_listing,
            capabilities.subscriptions,
            state.bot_user_id
        );
        Ok(())
    }

    async fn poll(&self) -> Result<Vec<IncomingMessage>> {
        let mut state = self.state.lock().await;
        if !state.initialized {
            return Err(OrchestratorError::channel(&self.channel, "poll before initialize"));
        }

        let caps = state.capabilities;
        if (caps.subscriptions || caps.chat_listing) && self.refresh_due(&state) {
            state.monitored_chat_ids = self.discover_chats(caps).await;
            state.last_chat_refresh = Some(Instant::now());
            debug!(
                "[{}] Monitoring {} chats",
                self.channel,
                state.monitored_chat_ids.len()
            );
        }

        let fetched = self.fetch(&state).await?;
        let now = Utc::now();

        let mut messages = Vec::new();
        for (raw, chat) in fetched {
            if self.admit(&mut state, &raw, now) {
                messages.push(raw.into_incoming(&self.channel, chat.as_deref(), now));
            }
        }
        self.evict(&mut state);

        sort_messages(&mut messages);
        if !messages.is_empty() {
            debug!("[{}] {} new messages", self.channel, messages.len());
        }
        Ok(messages)
    }

    async fn send_message(&self, chat_id: &str, text: &str) {
        match self
            .call(SEND_MESSAGE, json!({"chat_id": chat_id, "message": text}))
            .await
        {
            Ok(_) => debug!("[{}] Sent message to {}", self.channel, chat_id),
            Err(e) => warn!("[{}] Failed to send message to {}: {}", self.channel, chat_id, e),
        }
    }

    async fn shutdown(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.initialized = false;
        state.monitored_chat_ids.clear();
        state.last_chat_refresh = None;
        info!("[{}] Shut down", self.channel);
        Ok(())
    }
}

/// Numeric ids compare numerically and sort before non-numeric ones
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Ascending numeric order when every id is an integer, else lexicographic
fn sort_messages(messages: &mut [IncomingMessage]) {
    if messages.iter().all(|m| m.numeric_id().is_some()) {
        messages.sort_by_key(|m| m.numeric_id());
    } else {
        messages.sort_by(|a, b| a.id.cmp(&b.id));
    }
}

fn ids_under(content: &Value, key: &str) -> Vec<String> {
    let items = match content {
        Value::Array(items) => Some(items),
        other => other.get(key).and_then(Value::as_array),
    };
    items
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(_) => item
                        .get("id")
                        .or_else(|| item.get("chatId"))
                        .or_else(|| item.get("chat_id"))
                        .and_then(id_string),
                    other => id_string(other),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::config::RouterConfig;

    fn now_secs() -> i64 {
        Utc::now().timestamp()
    }

    fn message(id: i64, sender: i64, text: &str) -> Value {
        json!({"id": id, "chatId": 100, "senderId": sender, "text": text, "date": now_secs()})
    }

    async fn adapter_for(backend: MockBackend, config: AdapterConfig) -> (GenericChannelAdapter, Arc<MockBackend>) {
        let router = Arc::new(ToolRouter::new(RouterConfig::default()));
        let backend = Arc::new(backend);
        router.register_backend("telegram", backend.clone(), None);
        router.discover_tools().await;
        (GenericChannelAdapter::new("telegram", router, config), backend)
    }

    fn telegram() -> MockBackend {
        MockBackend::new("telegram").with_tools(&["get_messages", "send_message"])
    }

    #[tokio::test]
    async fn test_initialize_requires_get_messages() {
        let (adapter, _) = adapter_for(MockBackend::new("telegram").with_tools(&["send_message"]), AdapterConfig::default()).await;
        assert!(adapter.initialize().await.is_err());
    }

    #[tokio::test]
    async fn test_capabilities_probed_by_route() {
        let backend = telegram()
            .with_tools(&["get_me", "list_chats"])
            .with_response("get_me", json!({"user": {"id": 555}}));
        let (adapter, backend) = adapter_for(backend, AdapterConfig::default()).await;
        adapter.initialize().await.unwrap();

        let caps = adapter.capabilities().await;
        assert!(caps.identity);
        assert!(caps.chat_listing);
        assert!(!caps.subscriptions);
        assert_eq!(adapter.bot_user_id().await.as_deref(), Some("555"));
        // only get_me was called; nothing probed by trial
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_routes_ignore_lookalike_tool_on_other_backend() {
        let router = Arc::new(ToolRouter::new(RouterConfig::default()));
        let telegram = Arc::new(telegram().with_response("get_messages", json!({"messages": []})));
        let other = Arc::new(MockBackend::new("other").with_tools(&["telegram_send_message", "telegram_get_messages"]));
        router.register_backend("telegram", telegram.clone(), None);
        router.register_backend("other", other.clone(), None);
        router.discover_tools().await;
        assert_eq!(router.get_routed_tool("telegram_send_message").unwrap().backend_name, "other");

        let adapter = GenericChannelAdapter::new("telegram", router, AdapterConfig::default());
        adapter.initialize().await.unwrap();
        adapter.poll().await.unwrap();
        adapter.send_message("42", "hello").await;

        assert_eq!(telegram.calls_to("send_message").len(), 1);
        assert_eq!(telegram.calls_to("get_messages").len(), 1);
        assert_eq!(other.call_count(), 0);
    }

    #[tokio::test]
    async fn test_identity_failure_is_not_fatal() {
        let backend = telegram().with_tools(&["get_me"]).with_error("get_me", "auth");
        let (adapter, _) = adapter_for(backend, AdapterConfig::default()).await;
        adapter.initialize().await.unwrap();
        assert!(adapter.bot_user_id().await.is_none());
    }

    #[tokio::test]
    async fn test_poll_before_initialize_fails() {
        let (adapter, _) = adapter_for(telegram(), AdapterConfig::default()).await;
        assert!(adapter.poll().await.is_err());
    }

    #[tokio::test]
    async fn test_dedup_across_polls() {
        let backend = telegram().with_response("get_messages", json!({"messages": [message(1, 9, "hi")]}));
        let (adapter, _) = adapter_for(backend, AdapterConfig::default()).await;
        adapter.initialize().await.unwrap();

        assert_eq!(adapter.poll().await.unwrap().len(), 1);
        assert!(adapter.poll().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_self_messages_suppressed() {
        let backend = telegram()
            .with_tools(&["get_me"])
            .with_response("get_me", json!({"id": 555}))
            .with_response(
                "get_messages",
                json!({"messages": [
                    message(1, 555, "my own reply"),
                    {"id": 2, "senderId": 9, "text": "sent from this account", "date": now_secs(), "isOutgoing": true},
                    message(3, 9, "hello bot")
                ]}),
            );
        let (adapter, _) = adapter_for(backend, AdapterConfig::default()).await;
        adapter.initialize().await.unwrap();

        let ids: Vec<String> = adapter.poll().await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["3"]);
        assert!(adapter.is_processed("1").await);
        assert!(adapter.is_processed("2").await);
    }

    #[tokio::test]
    async fn test_filter_pipeline() {
        let backend = telegram().with_response(
            "get_messages",
            json!({"messages": [
                message(1, 9, "   "),
                {"id": 2, "senderId": 9, "text": "old news", "date": now_secs() - 3600},
                message(3, 9, "Sorry, I encountered an error: timeout"),
                message(4, 9, "real question"),
                {"id": 5, "senderId": 9, "text": "undated"}
            ]}),
        );
        let (adapter, _) = adapter_for(backend, AdapterConfig::default()).await;
        adapter.initialize().await.unwrap();

        let ids: Vec<String> = adapter.poll().await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["4", "5"]);
        assert!(!adapter.is_processed("1").await);
        assert!(!adapter.is_processed("2").await);
        assert!(adapter.is_processed("3").await);
    }

    #[tokio::test]
    async fn test_empty_text_retried_later() {
        let (adapter, backend) = adapter_for(telegram(), AdapterConfig::default()).await;
        backend.push_response("get_messages", json!({"messages": [message(1, 9, "")]}));
        backend.push_response("get_messages", json!({"messages": [message(1, 9, "edited")]}));
        adapter.initialize().await.unwrap();

        assert!(adapter.poll().await.unwrap().is_empty());
        assert_eq!(adapter.poll().await.unwrap()[0].text, "edited");
    }

    #[tokio::test]
    async fn test_numeric_ordering() {
        let backend = telegram().with_response(
            "get_messages",
            json!({"messages": [message(7, 9, "a"), message(3, 9, "b"), message(9, 9, "c")]}),
        );
        let (adapter, _) = adapter_for(backend, AdapterConfig::default()).await;
        adapter.initialize().await.unwrap();

        let ids: Vec<String> = adapter.poll().await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["3", "7", "9"]);
    }

    #[tokio::test]
    async fn test_lexicographic_ordering_for_mixed_ids() {
        let backend = telegram().with_response(
            "get_messages",
            json!({"messages": [
                {"id": "b", "text": "x", "date": now_secs()},
                {"id": 10, "text": "x", "date": now_secs()},
                {"id": "a", "text": "x", "date": now_secs()}
            ]}),
        );
        let (adapter, _) = adapter_for(backend, AdapterConfig::default()).await;
        adapter.initialize().await.unwrap();

        let ids: Vec<String> = adapter.poll().await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["10", "a", "b"]);
    }

    #[tokio::test]
    async fn test_water_mark_eviction_keeps_largest() {
        let batch: Vec<Value> = (1..=1001).map(|id| message(id, 9, "msg")).collect();
        let backend = telegram().with_response("get_messages", json!({"messages": batch}));
        let (adapter, _) = adapter_for(backend, AdapterConfig::default()).await;
        adapter.initialize().await.unwrap();

        assert_eq!(adapter.poll().await.unwrap().len(), 1001);
        assert_eq!(adapter.processed_count().await, 500);
        assert!(adapter.is_processed("1001").await);
        assert!(adapter.is_processed("502").await);
        assert!(!adapter.is_processed("501").await);
        assert!(!adapter.is_processed("1").await);
    }

    #[tokio::test]
    async fn test_chat_discovery_prefers_subscriptions() {
        let backend = telegram()
            .with_tools(&["subscribe_chat", "list_chats"])
            .with_response("subscribe_chat", json!({"subscriptions": [111]}))
            .with_response("list_chats", json!({"chats": [{"id": 222}]}))
            .with_response("get_messages", json!({"messages": [{"id": 1, "text": "x", "date": now_secs()}]}));
        let (adapter, backend) = adapter_for(backend, AdapterConfig::default()).await;
        adapter.initialize().await.unwrap();

        let messages = adapter.poll().await.unwrap();
        assert_eq!(adapter.monitored_chats().await, vec!["111"]);
        assert_eq!(messages[0].chat_id, "111");
        assert!(backend.calls_to("list_chats").is_empty());

        let fetches = backend.calls_to("get_messages");
        assert_eq!(fetches[0].arguments, json!({"chat_id": "111", "limit": 10}));
    }

    #[tokio::test]
    async fn test_chat_discovery_falls_back_to_listing() {
        let backend = telegram()
            .with_tools(&["subscribe_chat", "list_chats"])
            .with_response("subscribe_chat", json!({"subscriptions": []}))
            .with_response("list_chats", json!({"chats": [{"id": 222, "type": "private"}, {"id": "333"}]}))
            .with_response("get_messages", json!({"messages": []}));
        let (adapter, backend) = adapter_for(backend, AdapterConfig::default()).await;
        adapter.initialize().await.unwrap();

        adapter.poll().await.unwrap();
        assert_eq!(adapter.monitored_chats().await, vec!["222", "333"]);
        assert_eq!(backend.calls_to("list_chats")[0].arguments, json!({"limit": 50}));
        assert_eq!(backend.calls_to("get_messages").len(), 2);

        // refresh interval has not elapsed
        adapter.poll().await.unwrap();
        assert_eq!(backend.calls_to("list_chats").len(), 1);
    }

    #[tokio::test]
    async fn test_chat_refresh_interval() {
        let backend = telegram()
            .with_tools(&["list_chats"])
            .with_response("list_chats", json!({"chats": [{"id": 1}]}))
            .with_response("get_messages", json!({"messages": []}));
        let config = AdapterConfig {
            chat_refresh_interval_ms: 0,
            ..Default::default()
        };
        let (adapter, backend) = adapter_for(backend, config).await;
        adapter.initialize().await.unwrap();

        adapter.poll().await.unwrap();
        adapter.poll().await.unwrap();
        assert_eq!(backend.calls_to("list_chats").len(), 2);
    }

    #[tokio::test]
    async fn test_unscoped_fetch_without_discovery() {
        let backend = telegram().with_response("get_messages", json!({"success": true, "data": {"messages": []}}));
        let (adapter, backend) = adapter_for(backend, AdapterConfig::default()).await;
        adapter.initialize().await.unwrap();

        adapter.poll().await.unwrap();
        assert_eq!(backend.calls_to("get_messages")[0].arguments, json!({"limit": 10}));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_an_error() {
        let backend = telegram().with_error("get_messages", "flood wait");
        let (adapter, _) = adapter_for(backend, AdapterConfig::default()).await;
        adapter.initialize().await.unwrap();
        assert!(matches!(adapter.poll().await, Err(OrchestratorError::Channel { .. })));
    }

    #[tokio::test]
    async fn test_send_message_best_effort() {
        let backend = telegram().with_error("send_message", "chat not found");
        let (adapter, backend) = adapter_for(backend, AdapterConfig::default()).await;
        adapter.initialize().await.unwrap();

        adapter.send_message("100", "hello").await;
        let calls = backend.calls_to("send_message");
        assert_eq!(calls[0].arguments, json!({"chat_id": "100", "message": "hello"}));
    }

    #[tokio::test]
    async fn test_conventional_route_preferred() {
        let router = Arc::new(ToolRouter::new(RouterConfig::default()));
        let telegram = Arc::new(telegram().with_response("get_messages", json!({"messages": []})));
        let slack = Arc::new(MockBackend::new("slack").with_tools(&["get_messages", "send_message"]));
        router.register_backend("telegram", telegram.clone(), None);
        router.register_backend("slack", slack.clone(), None);
        router.discover_tools().await;

        let adapter = GenericChannelAdapter::new("telegram", router, AdapterConfig::default());
        adapter.initialize().await.unwrap();
        adapter.poll().await.unwrap();

        assert_eq!(telegram.calls_to("get_messages").len(), 1);
        assert_eq!(slack.call_count(), 0);
    }

    #[test]
    fn test_compare_ids() {
        assert_eq!(compare_ids("9", "10"), Ordering::Less);
        assert_eq!(compare_ids("10", "a"), Ordering::Less);
        assert_eq!(compare_ids("b", "a"), Ordering::Greater);
    }
}
