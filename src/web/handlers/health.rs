//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::web::state::SharedState;

pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "ok",
        "message": "LINE webhook is running",
        "store_connected": state.store_connected(),
    });
    (StatusCode::OK, axum::Json(body))
}
