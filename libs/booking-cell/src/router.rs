use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use professional_cell::state::AppState;

use crate::handlers;

pub fn booking_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::list_day_appointments).post(handlers::commit_booking),
        )
        .route("/validate", post(handlers::validate_booking))
        .with_state(state)
}
