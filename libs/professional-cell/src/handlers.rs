use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{Professional, Service, TimeSlot};
use crate::services::availability::AvailabilityService;
use crate::services::catalog::ProfessionalService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

#[axum::debug_handler]
pub async fn list_professionals(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Professional>>, AppError> {
    let service = ProfessionalService::new(&state);
    let professionals = service
        .list_professionals()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(professionals))
}

#[axum::debug_handler]
pub async fn get_professional(
    State(state): State<Arc<AppState>>,
    Path(professional_id): Path<String>,
) -> Result<Json<Professional>, AppError> {
    let service = ProfessionalService::new(&state);
    let professional = service
        .get_professional(&professional_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Professional not found".to_string()))?;

    Ok(Json(professional))
}

/// Read path of the booking wizard: the ordered slot sequence for one
/// professional and date, with availability and same-day suppression
/// already resolved.
#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppState>>,
    Path(professional_id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<TimeSlot>>, AppError> {
    let service = AvailabilityService::new(&state.config);
    let slots = service
        .get_available_slots(&professional_id, query.date)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Professional not found".to_string()))?;

    Ok(Json(slots))
}

#[axum::debug_handler]
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Service>>, AppError> {
    let service = ProfessionalService::new(&state);
    let services = service
        .list_services()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(services))
}

/// Admin hook: drop the catalog cache after editing professionals/services.
#[axum::debug_handler]
pub async fn invalidate_catalog(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.catalog.invalidate();
    Json(json!({ "invalidated": true }))
}
