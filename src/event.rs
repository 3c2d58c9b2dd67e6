//! Inbound webhook payload model.
//!
//! The platform posts `{"destination": ..., "events": [...]}`. Each event is
//! decoded on its own so that a malformed entry never rejects the batch, and
//! every field is optional because the platform omits fields freely (e.g.
//! `source.userId` is absent in groups where the user has not consented).

use serde_json::Value;

use crate::tlog;

/// Top-level webhook body.
#[derive(Debug, Default)]
pub struct WebhookBody {
    pub destination: Option<String>,
    pub events: Vec<Value>,
}

impl WebhookBody {
    /// Read the body envelope. Only a non-object body or a non-array
    /// `events` is rejected; `destination` is informational and read
    /// leniently.
    pub fn from_value(payload: &Value) -> Result<Self, String> {
        let Some(body) = payload.as_object() else {
            return Err("expected a JSON object".to_string());
        };
        let events = match body.get("events") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(events)) => events.clone(),
            Some(_) => return Err("`events` must be an array".to_string()),
        };
        Ok(Self {
            destination: body.get("destination").and_then(str_field_value),
            events,
        })
    }
}

/// One decoded event.
#[derive(Debug, Clone, Default)]
pub struct WebhookEvent {
    pub kind: Option<String>,
    pub source: Source,
    pub message: Option<Value>,
    pub timestamp: Option<i64>,
}

impl WebhookEvent {
    /// Decode an event field by field; a mistyped field degrades to `None`
    /// without affecting the others.
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            tlog!("webhook: event is not a JSON object: {}", value);
            return Self::default();
        }
        let timestamp = value.get("timestamp").and_then(integer_field);
        if timestamp.is_none() && value.get("timestamp").is_some_and(|t| !t.is_null()) {
            tlog!("webhook: unreadable event timestamp {}", value["timestamp"]);
        }
        Self {
            kind: value.get("type").and_then(Value::as_str).map(String::from),
            source: value.get("source").map(Source::from_value).unwrap_or_default(),
            message: value.get("message").filter(|m| m.is_object()).cloned(),
            timestamp,
        }
    }

    pub fn is_message(&self) -> bool {
        self.kind.as_deref() == Some("message")
    }
}

/// Where an event originated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Source {
    pub kind: SourceKind,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
    pub room_id: Option<String>,
}

impl Source {
    pub fn user(user_id: &str) -> Self {
        Self {
            kind: SourceKind::User,
            user_id: Some(user_id.to_string()),
            ..Default::default()
        }
    }

    pub fn from_value(value: &Value) -> Self {
        Self {
            kind: value
                .get("type")
                .and_then(Value::as_str)
                .map(SourceKind::from)
                .unwrap_or_default(),
            user_id: str_field(value, "userId"),
            group_id: str_field(value, "groupId"),
            room_id: str_field(value, "roomId"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    User,
    Group,
    Room,
    Other(String),
}

impl SourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            SourceKind::User => "user",
            SourceKind::Group => "group",
            SourceKind::Room => "room",
            SourceKind::Other(tag) => tag,
        }
    }
}

impl Default for SourceKind {
    fn default() -> Self {
        SourceKind::Other(String::new())
    }
}

impl From<&str> for SourceKind {
    fn from(tag: &str) -> Self {
        match tag {
            "user" => SourceKind::User,
            "group" => SourceKind::Group,
            "room" => SourceKind::Room,
            other => SourceKind::Other(other.to_string()),
        }
    }
}

/// Kind-specific message content.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text { text: String },
    Image,
    Video,
    Sticker { sticker_id: Option<String> },
    /// `kind` is `None` when the message carries no `type`.
    Other { kind: Option<String>, raw: Value },
}

impl MessageContent {
    /// Classify the raw `message` object of an event.
    pub fn from_message(message: &Value) -> Self {
        let kind = message.get("type").and_then(Value::as_str);
        match kind.unwrap_or_default() {
            "text" => MessageContent::Text {
                text: str_field(message, "text").unwrap_or_default(),
            },
            "image" => MessageContent::Image,
            "video" => MessageContent::Video,
            "sticker" => MessageContent::Sticker {
                sticker_id: str_field(message, "stickerId")
                    .or_else(|| str_field(message, "sticker_id")),
            },
            _ => MessageContent::Other {
                kind: kind.map(String::from),
                raw: message.clone(),
            },
        }
    }

    /// The `message_type` tag stored on the record.
    pub fn kind(&self) -> Option<&str> {
        match self {
            MessageContent::Text { .. } => Some("text"),
            MessageContent::Image => Some("image"),
            MessageContent::Video => Some("video"),
            MessageContent::Sticker { .. } => Some("sticker"),
            MessageContent::Other { kind, .. } => kind.as_deref(),
        }
    }

    /// The stored `content` string. Never empty of meaning: media kinds get a
    /// placeholder keyed by the message ID, unknown kinds keep the raw payload.
    pub fn render(&self, message_id: Option<&str>) -> String {
        let id = message_id.unwrap_or("unknown");
        match self {
            MessageContent::Text { text } => text.clone(),
            MessageContent::Image => format!("image_{id}"),
            MessageContent::Video => format!("video_{id}"),
            MessageContent::Sticker { sticker_id } => {
                format!("sticker_{}", sticker_id.as_deref().unwrap_or("unknown"))
            }
            MessageContent::Other { raw, .. } => raw.to_string(),
        }
    }
}

/// Read a string field, accepting numbers too (sticker IDs arrive as either).
pub(crate) fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(str_field_value)
}

fn str_field_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Integers, or floats with no fractional part (`1000.0`).
fn integer_field(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}
