//! Shared response helpers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Build a standard JSON error response.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "status": "error", "message": message.into() });
    (status, axum::Json(body)).into_response()
}

pub fn api_success() -> Response {
    let body = serde_json::json!({ "status": "success" });
    (StatusCode::OK, axum::Json(body)).into_response()
}
