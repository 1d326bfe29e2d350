//! HTTP route definitions.
//!
//! One flat router on the loopback port. The Probe runs inside a browser
//! tab, so CORS is permissive: any origin, GET and POST, Content-Type.

use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::handlers;
use crate::state::AppState;

/// Create the control plane router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // Probe state intake
        .route("/cursor-position", post(handlers::cursor_position))
        .route("/cursor-hover", post(handlers::cursor_hover))
        // DOM query correlation (Probe polls, then POSTs back)
        .route("/coord-request", get(handlers::coord_request))
        .route("/coord-response", post(handlers::coord_response))
        .route("/scan-request", get(handlers::scan_request))
        .route("/scan-response", post(handlers::scan_response))
        // Command intake and dispatch
        .route("/automation", post(handlers::automation))
        .route("/start", post(handlers::start))
        // Diagnostics
        .route("/dom-change", post(handlers::dom_change))
        .route("/form-fields", post(handlers::form_fields))
        .route("/bottom-reached", post(handlers::bottom_reached))
        .route("/status", get(handlers::status))
        // Debug tooling
        .route("/test-move", post(handlers::test_move))
        .route("/trigger-scan", post(handlers::trigger_scan))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
