//! Route definitions.
//!
//! ```text
//! POST    /ingest-events    - persist a transmitter batch (202)
//! POST    /pattern-detector - run temporal intent clustering for an org
//! POST    /ghost-executor   - execute an approved ghost
//! POST    /approve-ghost    - drive the approval state machine
//! GET     /health           - provider + service health
//! OPTIONS (any of the above) - permissive CORS preflight
//! ```

use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::http::{approvals, executor, ingest, monitoring, patterns};
use crate::state::AppState;

/// Headers the browser capture surface is allowed to send.
const ALLOWED_HEADERS: &str =
    "authorization, content-type, x-client-info, apikey, x-ghost-batch-id, x-ghost-device";

/// Build the service router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/ingest-events",
            post(ingest::ingest_events)
                .options(preflight)
                .fallback(ingest::method_not_allowed),
        )
        .route(
            "/pattern-detector",
            post(patterns::detect_patterns)
                .options(preflight)
                .fallback(ingest::method_not_allowed),
        )
        .route(
            "/ghost-executor",
            post(executor::execute_ghost)
                .options(preflight)
                .fallback(ingest::method_not_allowed),
        )
        .route(
            "/approve-ghost",
            post(approvals::approve_ghost)
                .options(preflight)
                .fallback(ingest::method_not_allowed),
        )
        .route("/health", get(monitoring::health))
        .with_state(state)
}

/// Permissive CORS preflight response.
async fn preflight() -> Response {
    let mut response = StatusCode::OK.into_response();
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    response
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
