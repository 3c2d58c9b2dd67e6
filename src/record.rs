//! Normalized message record written once per qualifying event.

use serde::Serialize;
use serde_json::Value;

use crate::event::{MessageContent, Source};
use crate::profile::ProfileResolution;

/// Collection that message records are written to.
pub const MESSAGES_COLLECTION: &str = "messages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
}

/// One stored message. `created_at` is added by the store on insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageRecord {
    pub user_id: String,
    pub display_name: Option<String>,
    pub picture_url: Option<String>,
    /// `None` when the platform sent no `message.type`.
    pub message_type: Option<String>,
    pub message_id: Option<String>,
    pub timestamp: Option<i64>,
    pub source_type: String,
    pub status: RecordStatus,
    pub printed: bool,
    pub content: String,
}

impl MessageRecord {
    /// Build a fresh record. Status and the printed flag always start at
    /// `pending` / `false`.
    pub fn new(
        user_id: &str,
        source: &Source,
        message: &Value,
        timestamp: Option<i64>,
        profile: &ProfileResolution,
    ) -> Self {
        let content = MessageContent::from_message(message);
        let message_id = message_id_of(message);
        Self {
            user_id: user_id.to_string(),
            display_name: profile.display_name().map(String::from),
            picture_url: profile.picture_url().map(String::from),
            message_type: content.kind().map(String::from),
            content: content.render(message_id.as_deref()),
            message_id,
            timestamp,
            source_type: source.kind.as_str().to_string(),
            status: RecordStatus::Pending,
            printed: false,
        }
    }

    pub fn to_document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// The platform sends message IDs as strings; tolerate numbers.
pub fn message_id_of(message: &Value) -> Option<String> {
    match message.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SourceKind;
    use crate::profile::{Profile, SkipReason};
    use serde_json::json;

    #[test]
    fn text_record_without_profile() {
        let record = MessageRecord::new(
            "U1",
            &Source::user("U1"),
            &json!({"type": "text", "id": "M1", "text": "hello"}),
            Some(1000),
            &ProfileResolution::Skipped(SkipReason::NoAccessToken),
        );
        let doc = record.to_document().unwrap();
        assert_eq!(
            doc,
            json!({
                "user_id": "U1",
                "display_name": null,
                "picture_url": null,
                "message_type": "text",
                "message_id": "M1",
                "timestamp": 1000,
                "source_type": "user",
                "status": "pending",
                "printed": false,
                "content": "hello",
            })
        );
    }

    #[test]
    fn resolved_profile_fills_display_fields() {
        let source = Source {
            kind: SourceKind::Room,
            user_id: Some("U2".into()),
            room_id: Some("R1".into()),
            ..Default::default()
        };
        let profile = ProfileResolution::Resolved(Profile {
            display_name: Some("Bob".into()),
            picture_url: Some("https://cdn.example/bob.jpg".into()),
            status_message: Some("away".into()),
        });
        let record = MessageRecord::new(
            "U2",
            &source,
            &json!({"type": "image", "id": "M5"}),
            None,
            &profile,
        );
        assert_eq!(record.display_name.as_deref(), Some("Bob"));
        assert_eq!(record.picture_url.as_deref(), Some("https://cdn.example/bob.jpg"));
        assert_eq!(record.content, "image_M5");
        assert_eq!(record.source_type, "room");
        assert_eq!(record.status, RecordStatus::Pending);
        assert!(!record.printed);
    }

    #[test]
    fn unknown_kind_records_raw_tag_and_payload() {
        let message = json!({"type": "audio", "id": "M3", "duration": 1200});
        let record = MessageRecord::new(
            "U1",
            &Source::user("U1"),
            &message,
            Some(5),
            &ProfileResolution::Skipped(SkipReason::NoAccessToken),
        );
        assert_eq!(record.message_type.as_deref(), Some("audio"));
        assert_eq!(serde_json::from_str::<Value>(&record.content).unwrap(), message);
    }

    #[test]
    fn message_id_accepts_numbers() {
        assert_eq!(message_id_of(&json!({"id": 42})).as_deref(), Some("42"));
        assert_eq!(message_id_of(&json!({"type": "text"})), None);
    }
}
