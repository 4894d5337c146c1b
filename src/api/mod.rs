use crate::state::AppState;
use axum::Router;
use axum::routing::{delete, get};
use std::sync::{Arc, RwLock};

pub mod handlers;
pub mod responses;

pub fn router(state: Arc<RwLock<AppState>>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_health))
        .route(
            "/api/observations",
            get(handlers::get_observations).post(handlers::post_observation),
        )
        .route(
            "/api/observations/last",
            delete(handlers::delete_last_observation),
        )
        .route("/api/estimate", get(handlers::get_estimate))
        .with_state(state)
}
