use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use professional_cell::state::AppState;
use shared_models::error::AppError;

use crate::models::{
    Appointment, BookingValidation, CommitBookingRequest, CommitBookingResponse,
    DayAppointmentsQuery, ValidateBookingRequest,
};
use crate::services::booking::BookingService;

/// Pre-submit check the wizard runs after the customer picks a slot.
#[axum::debug_handler]
pub async fn validate_booking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateBookingRequest>,
) -> Json<BookingValidation> {
    let service = BookingService::new(&state.config);
    Json(service.validator().validate_booking(&request).await)
}

/// Conflict-checked commit. Always answers with the structured result
/// shape; rejections and infrastructure failures are payloads, not HTTP
/// errors.
#[axum::debug_handler]
pub async fn commit_booking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CommitBookingRequest>,
) -> Json<CommitBookingResponse> {
    let service = BookingService::new(&state.config);
    Json(service.commit_booking(request).await)
}

/// A professional's appointments for one date, ordered by time.
#[axum::debug_handler]
pub async fn list_day_appointments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DayAppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let service = BookingService::new(&state.config);
    let appointments = service
        .list_day_appointments(&query.professional_id, query.date)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(appointments))
}
