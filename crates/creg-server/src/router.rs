use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all registry endpoints.
pub fn build_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/stats", get(handler::stats_handler))
        .route("/v1/audit", get(handler::audit_handler))
        .route("/v1/audit/repair", post(handler::repair_handler))
        .route("/v1/certificates", post(handler::issue_handler))
        .route("/v1/certificates/:id", get(handler::verify_handler))
        .route("/v1/certificates/:id/payload", get(handler::payload_handler))
        .route(
            "/v1/students/:student_id/certificates",
            get(handler::list_handler),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
