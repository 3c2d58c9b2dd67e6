//! Axum router construction.

use axum::routing::{get, post};
use axum::Router;

use crate::web::handlers;
use crate::web::state::SharedState;

/// Build the router with the health check and webhook routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handlers::health::health_handler))
        .route("/webhook", post(handlers::webhook::webhook_handler))
        .with_state(state)
}
