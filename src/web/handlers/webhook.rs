//! Webhook ingress.
//!
//! Once the body parses, the response is always 200 so the platform does not
//! redeliver the whole batch over a single failed event.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;

use crate::event::WebhookBody;
use crate::ingest::process_batch;
use crate::tlog;
use crate::web::state::SharedState;
use crate::web::utils::{api_error, api_success};

pub async fn webhook_handler(State(state): State<SharedState>, body: Bytes) -> Response {
    let Some(store) = state.store.clone() else {
        return api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Document store not connected",
        );
    };

    let payload = match parse_payload(&body) {
        Ok(payload) => payload,
        Err(rejection) => return rejection,
    };

    tlog!(
        "webhook: received {}",
        serde_json::to_string_pretty(&payload).unwrap_or_default()
    );

    let webhook = match WebhookBody::from_value(&payload) {
        Ok(webhook) => webhook,
        Err(e) => {
            tlog!("webhook: malformed body: {}", e);
            return api_error(StatusCode::BAD_REQUEST, format!("Invalid webhook body: {e}"));
        }
    };
    if let Some(destination) = &webhook.destination {
        tlog!("webhook: {} event(s) for {}", webhook.events.len(), destination);
    }

    let profiles = Arc::clone(&state.profiles);
    let result = tokio::task::spawn_blocking(move || {
        process_batch(store.as_ref(), profiles.as_ref(), &webhook.events);
    })
    .await;

    match result {
        Ok(()) => api_success(),
        Err(e) => {
            let message = panic_message(e);
            tlog!("webhook: error while processing batch: {}", message);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

/// Parse the raw body, rejecting empty and JSON-falsy payloads with 400.
fn parse_payload(body: &[u8]) -> Result<Value, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(api_error(StatusCode::BAD_REQUEST, "No data"));
    }
    let payload: Value = serde_json::from_slice(body).map_err(|e| {
        tlog!("webhook: body is not JSON: {}", e);
        api_error(StatusCode::BAD_REQUEST, format!("Invalid JSON: {e}"))
    })?;
    if is_empty_payload(&payload) {
        return Err(api_error(StatusCode::BAD_REQUEST, "No data"));
    }
    Ok(payload)
}

fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
    }
}

fn panic_message(error: tokio::task::JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }
    let payload = error.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "batch processing panicked".to_string()
    }
}
