//! Channel Manager - fans poll cycles across adapters into one dispatcher
//!
//! One timer drives cycles. A cycle visits adapters in registration order and
//! dispatches their messages sequentially, so the dispatched stream is
//! deterministic. A trigger that arrives while a cycle is running is dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::ChannelsConfig;
use crate::error::{OrchestratorError, Result};

use super::adapter::ChannelAdapter;
use super::message::IncomingMessage;

/// Receives every message that survives an adapter's filters
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: IncomingMessage) -> Result<()>;
}

struct ManagerInner {
    config: ChannelsConfig,
    adapters: RwLock<Vec<Arc<dyn ChannelAdapter>>>,
    dispatcher: RwLock<Option<Arc<dyn MessageHandler>>>,
    bindings: RwLock<HashMap<String, String>>,
    polling: AtomicBool,
    timer: Mutex<Option<JoinHandle<()>>>,
}

/// Resets the in-flight flag even if a cycle panics
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Registry of channel adapters plus the poll loop; cheap to clone
#[derive(Clone)]
pub struct ChannelManager {
    inner: Arc<ManagerInner>,
}

impl ChannelManager {
    pub fn new(config: ChannelsConfig) -> Self {
        let bindings = config.bindings.clone();
        Self {
            inner: Arc::new(ManagerInner {
                config,
                adapters: RwLock::new(Vec::new()),
                dispatcher: RwLock::new(None),
                bindings: RwLock::new(bindings),
                polling: AtomicBool::new(false),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Register an adapter; a second adapter for the same channel replaces the first
    pub fn register_adapter(&self, adapter: Arc<dyn ChannelAdapter>) {
        let channel = adapter.channel().to_string();
        let mut adapters = write(&self.inner.adapters);
        match adapters.iter_mut().find(|a| a.channel() == channel) {
            Some(existing) => {
                warn!("Replacing adapter for channel '{}'", channel);
                *existing = adapter;
            }
            None => {
                info!("Registered channel '{}'", channel);
                adapters.push(adapter);
            }
        }
    }

    pub fn get_adapter(&self, channel: &str) -> Option<Arc<dyn ChannelAdapter>> {
        read(&self.inner.adapters)
            .iter()
            .find(|a| a.channel() == channel)
            .cloned()
    }

    /// Channel names in registration order
    pub fn get_channels(&self) -> Vec<String> {
        read(&self.inner.adapters)
            .iter()
            .map(|a| a.channel().to_string())
            .collect()
    }

    /// Set the single dispatch callback
    pub fn set_dispatcher(&self, handler: Arc<dyn MessageHandler>) {
        *write(&self.inner.dispatcher) = Some(handler);
    }

    /// Bind a channel's messages to an agent
    pub fn bind_agent(&self, channel: impl Into<String>, agent_id: impl Into<String>) {
        write(&self.inner.bindings).insert(channel.into(), agent_id.into());
    }

    /// Agent for a channel, falling back to the configured default
    pub fn agent_for(&self, channel: &str) -> Option<String> {
        read(&self.inner.bindings)
            .get(channel)
            .cloned()
            .or_else(|| self.inner.config.default_agent.clone())
    }

    fn snapshot(&self) -> Vec<Arc<dyn ChannelAdapter>> {
        read(&self.inner.adapters).clone()
    }

    /// Initialize every adapter; returns how many succeeded
    pub async fn initialize(&self) -> usize {
        let mut ready = 0;
        for adapter in self.snapshot() {
            match adapter.initialize().await {
                Ok(()) => ready += 1,
                Err(e) => error!("[{}] Initialization failed: {}", adapter.channel(), e),
            }
        }
        info!("Initialized {} of {} channels", ready, read(&self.inner.adapters).len());
        ready
    }

    /// Start the poll timer; the first cycle runs immediately
    pub fn start(&self) {
        let mut timer = lock(&self.inner.timer);
        if timer.is_some() {
            warn!("Channel polling already started");
            return;
        }

        let period = Duration::from_millis(self.inner.config.poll_interval_ms);
        let manager = self.clone();
        *timer = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let cycle = manager.clone();
                tokio::spawn(async move {
                    cycle.poll_cycle().await;
                });
            }
        }));
        info!("Channel polling started (every {}ms)", self.inner.config.poll_interval_ms);
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner.timer).is_some()
    }

    /// Stop the timer and shut every adapter down
    ///
    /// A cycle already in flight is not cancelled.
    pub async fn stop(&self) {
        if let Some(handle) = lock(&self.inner.timer).take() {
            handle.abort();
            info!("Channel polling stopped");
        }

        for adapter in self.snapshot() {
            if let Err(e) = adapter.shutdown().await {
                error!("[{}] Shutdown failed: {}", adapter.channel(), e);
            }
        }
    }

    /// Run one poll cycle; returns the number of messages dispatched
    ///
    /// Returns 0 without polling if another cycle is in flight or no
    /// dispatcher is set.
    pub async fn poll_cycle(&self) -> usize {
        if self.inner.polling.swap(true, Ordering::SeqCst) {
            debug!("Poll cycle already in flight, skipping");
            return 0;
        }
        let _guard = CycleGuard(&self.inner.polling);

        let Some(dispatcher) = read(&self.inner.dispatcher).clone() else {
            warn!("No dispatcher set, skipping poll cycle");
            return 0;
        };

        let mut dispatched = 0;
        for adapter in self.snapshot() {
            let channel = adapter.channel().to_string();
            let messages = match adapter.poll().await {
                Ok(messages) => messages,
                Err(e) => {
                    error!("[{}] Poll failed: {}", channel, e);
                    continue;
                }
            };

            let cap = self.inner.config.max_messages_per_cycle;
            if messages.len() > cap {
                warn!(
                    "[{}] {} messages this cycle, dispatching the first {}",
                    channel,
                    messages.len(),
                    cap
                );
            }

            for mut message in messages.into_iter().take(cap) {
                message.agent_id = self.agent_for(&message.channel);
                let id = message.id.clone();
                if let Err(e) = dispatcher.handle(message).await {
                    error!("[{}] Dispatch of message {} failed: {}", channel, id, e);
                }
                dispatched += 1;
            }
        }

        if dispatched > 0 {
            debug!("Poll cycle dispatched {} messages", dispatched);
        }
        dispatched
    }

    /// Send a reply through the adapter that owns `channel`
    pub async fn send_reply(&self, channel: &str, chat_id: &str, text: &str) -> Result<()> {
        let adapter = self
            .get_adapter(channel)
            .ok_or_else(|| OrchestratorError::channel(channel, "no adapter registered"))?;
        adapter.send_message(chat_id, text).await;
        Ok(())
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
