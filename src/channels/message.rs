//! Normalized inbound messages and the raw shapes they come from

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unix timestamps above this are taken as milliseconds
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// A message ready for dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub text: String,
    pub date: DateTime<Utc>,
    /// Channel the message arrived on; replies route back through it
    pub channel: String,
    /// Agent bound to the channel, filled in by the manager
    pub agent_id: Option<String>,
}

impl IncomingMessage {
    /// Numeric id, when the backend uses integer ids
    pub fn numeric_id(&self) -> Option<i64> {
        self.id.parse().ok()
    }
}

/// Message as returned by a channel backend's `get_messages`
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub id: String,
    pub chat_id: Option<String>,
    pub sender_id: Option<String>,
    pub text: String,
    pub date: Option<DateTime<Utc>>,
    pub is_outgoing: bool,
}

impl RawMessage {
    /// Parse one backend message; `None` if it has no usable id
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = id_string(value.get("id")?)?;
        let field = |camel: &str, snake: &str| value.get(camel).or_else(|| value.get(snake));

        Some(Self {
            id,
            chat_id: field("chatId", "chat_id").and_then(id_string),
            sender_id: field("senderId", "sender_id").and_then(id_string),
            text: value
                .get("text")
                .or_else(|| value.get("message"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            date: value.get("date").and_then(parse_date),
            is_outgoing: field("isOutgoing", "is_outgoing")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }

    /// Build the dispatchable message
    ///
    /// `fallback_chat` is used when the backend omits the chat id, which
    /// happens for per-chat fetches.
    pub fn into_incoming(self, channel: &str, fallback_chat: Option<&str>, now: DateTime<Utc>) -> IncomingMessage {
        IncomingMessage {
            id: self.id,
            chat_id: self
                .chat_id
                .or_else(|| fallback_chat.map(String::from))
                .unwrap_or_default(),
            sender_id: self.sender_id.unwrap_or_default(),
            text: self.text,
            date: self.date.unwrap_or(now),
            channel: channel.to_string(),
            agent_id: None,
        }
    }
}

/// Ids arrive as JSON numbers or strings
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Unix seconds, unix milliseconds, or an RFC 3339 string
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let raw = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            if raw.unsigned_abs() >= MILLIS_THRESHOLD.unsigned_abs() {
                Utc.timestamp_millis_opt(raw).single()
            } else {
                Utc.timestamp_opt(raw, 0).single()
            }
        }
        Value::String(s) => match s.parse::<i64>() {
            Ok(raw) => parse_date(&Value::from(raw)),
            Err(_) => DateTime::parse_from_rfc3339(s).ok().map(|d| d.with_timezone(&Utc)),
        },
        _ => None,
    }
}

/// Pull the message list out of a `get_messages` response
pub fn messages_from_response(content: &Value) -> Vec<RawMessage> {
    let list = match content {
        Value::Array(items) => Some(items),
        other => other.get("messages").and_then(Value::as_array),
    };
    list.map(|items| items.iter().filter_map(RawMessage::from_value).collect())
        .unwrap_or_default()
}
