//! Sequential processing of one webhook batch.
//!
//! Each event either produces exactly one stored record or is skipped. No
//! per-event failure aborts the batch; outcomes are collected in a
//! [`BatchReport`] and logged.

use serde_json::Value;

use crate::event::WebhookEvent;
use crate::logging;
use crate::profile::{ProfileLookup, ProfileResolution};
use crate::record::{MessageRecord, MESSAGES_COLLECTION};
use crate::storage::DocumentStore;
use crate::tlog;

/// What happened to one event of the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// Not a message event.
    Ignored { kind: Option<String> },
    /// Message event without `source.userId`.
    MissingUser,
    Stored {
        document_id: String,
        profile: ProfileResolution,
    },
    WriteFailed {
        error: String,
        profile: ProfileResolution,
    },
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<EventOutcome>,
}

impl BatchReport {
    pub fn stored(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EventOutcome::Stored { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EventOutcome::WriteFailed { .. }))
            .count()
    }
}

/// Process every event in order, one profile lookup and one write per
/// qualifying event.
pub fn process_batch(
    store: &dyn DocumentStore,
    profiles: &dyn ProfileLookup,
    events: &[Value],
) -> BatchReport {
    let mut report = BatchReport::default();
    for raw in events {
        let outcome = process_event(store, profiles, raw);
        report.outcomes.push(outcome);
    }
    tlog!(
        "webhook: {} event(s), {} stored, {} write failure(s)",
        report.outcomes.len(),
        report.stored(),
        report.failed()
    );
    report
}

pub fn process_event(
    store: &dyn DocumentStore,
    profiles: &dyn ProfileLookup,
    raw: &Value,
) -> EventOutcome {
    let event = WebhookEvent::from_value(raw);
    if !event.is_message() {
        tlog!(
            "webhook: skipping {} event",
            event.kind.as_deref().unwrap_or("untyped")
        );
        return EventOutcome::Ignored { kind: event.kind };
    }

    let Some(user_id) = event.source.user_id.as_deref().filter(|u| !u.is_empty()) else {
        tlog!("webhook: no userId in event source, skipping");
        return EventOutcome::MissingUser;
    };

    let message = event
        .message
        .clone()
        .unwrap_or_else(|| Value::Object(Default::default()));

    let profile = profiles.resolve(&event.source, user_id);
    match &profile {
        ProfileResolution::Resolved(p) => tlog!(
            "profile: {} is {:?}",
            logging::user_id(user_id),
            p.display_name.as_deref().unwrap_or("")
        ),
        ProfileResolution::Skipped(reason) => {
            tlog!("profile: lookup skipped for {}: {}", logging::user_id(user_id), reason)
        }
        ProfileResolution::Failed(e) => {
            tlog!("profile: lookup failed for {}: {}", logging::user_id(user_id), e)
        }
    }

    let record = MessageRecord::new(user_id, &event.source, &message, event.timestamp, &profile);
    tlog!(
        "webhook: {} message {} from {}",
        record.message_type.as_deref().unwrap_or("untyped"),
        logging::doc_id(record.message_id.as_deref().unwrap_or("?")),
        logging::user_id(user_id)
    );

    let written = record
        .to_document()
        .map_err(|e| e.to_string())
        .and_then(|doc| {
            store
                .insert(MESSAGES_COLLECTION, &doc)
                .map_err(|e| e.to_string())
        });

    match written {
        Ok(inserted) => {
            tlog!("webhook: saved message doc {}", logging::doc_id(&inserted.id));
            EventOutcome::Stored {
                document_id: inserted.id,
                profile,
            }
        }
        Err(error) => {
            tlog!("webhook: failed to save message: {}", error);
            EventOutcome::WriteFailed { error, profile }
        }
    }
}
