pub mod extract;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::jobs::handlers::{handle_llm_cancel, method_not_allowed};
use crate::scoring::handlers::handle_company_scoring;
use crate::segments::handlers::{
    handle_segments_ai, handle_segments_create, handle_segments_delete, handle_segments_update,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Scoring (internal pipeline, keyed by ids)
        .route("/api/v1/company-scoring", post(handle_company_scoring))
        // Segments API
        .route("/api/v1/segments-ai", post(handle_segments_ai))
        .route("/api/v1/segments-create", post(handle_segments_create))
        .route("/api/v1/segments-update", post(handle_segments_update))
        .route("/api/v1/segments-delete", post(handle_segments_delete))
        // Job control
        .route(
            "/api/v1/llm-cancel",
            post(handle_llm_cancel).fallback(method_not_allowed),
        )
        .with_state(state)
}
