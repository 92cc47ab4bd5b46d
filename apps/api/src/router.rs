use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    Json,
};
use serde_json::{json, Value};

use booking_cell::router::booking_routes;
use professional_cell::router::{professional_routes, service_routes};
use professional_cell::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Salon booking API is running!" }))
        .route("/health", get(health_check))
        .nest("/api/professionals", professional_routes(state.clone()))
        .nest("/api/services", service_routes(state.clone()))
        .nest("/api/bookings", booking_routes(state))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
