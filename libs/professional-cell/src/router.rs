use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

pub fn professional_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::list_professionals))
        .route("/{professional_id}", get(handlers::get_professional))
        .route("/{professional_id}/slots", get(handlers::get_available_slots))
        .route("/cache/invalidate", post(handlers::invalidate_catalog))
        .with_state(state)
}

pub fn service_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::list_services))
        .with_state(state)
}
