pub mod health;
pub mod jobs;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/jobs", post(jobs::handle_submit))
        .route("/api/v1/jobs/:id", get(jobs::handle_status))
        .route(
            "/api/v1/jobs/:id/artifacts/:kind",
            get(jobs::handle_artifact),
        )
        .with_state(state)
}
