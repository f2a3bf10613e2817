//! Router assembly for the recording API.
//!
//! [`build_router`] wires all handler functions to their routes with
//! CORS and tracing middleware layers.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete axum router with all API routes.
///
/// Routes use axum 0.8 `/{param}` path syntax.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Sessions
        .route(
            "/sessions",
            get(handlers::sessions::list_sessions).post(handlers::sessions::create_session),
        )
        .route(
            "/sessions/{id}",
            get(handlers::sessions::get_session).delete(handlers::sessions::close_session),
        )
        // Records
        .route(
            "/sessions/{id}/records",
            post(handlers::records::record_call),
        )
        // Artifacts
        .route("/artifacts", get(handlers::artifacts::list_artifacts))
        .route("/artifacts/{id}", get(handlers::artifacts::get_artifact))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
