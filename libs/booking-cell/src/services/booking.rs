use std::sync::{Arc, LazyLock};

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Method;
use serde_json::Value;
use tracing::{error, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::clock::{Clock, SystemClock};
use shared_utils::time::{format_date_key, parse_time};

use crate::models::{
    Appointment, AppointmentStatus, BookingError, BookingErrorType, CommitBookingRequest,
    CommitBookingResponse, SlotKey, ValidateBookingRequest,
};
use crate::services::notification::NotificationService;
use crate::services::validation::BookingValidationService;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .expect("email regex is valid")
});

pub struct BookingService {
    supabase: Arc<SupabaseClient>,
    validation: BookingValidationService,
    notifications: NotificationService,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            validation: BookingValidationService::with_clock(supabase.clone(), clock.clone()),
            notifications: NotificationService::new(config),
            supabase,
            clock,
        }
    }

    pub fn validator(&self) -> &BookingValidationService {
        &self.validation
    }

    /// Commit a booking: re-validate the request shape (the client may have
    /// bypassed the UI), run the full business-rule chain, perform one final
    /// duplicate check immediately before the write, then persist and
    /// trigger notifications. All failure paths fold into the typed response
    /// shape; nothing escapes as an error.
    pub async fn commit_booking(&self, request: CommitBookingRequest) -> CommitBookingResponse {
        info!(
            "Commit booking requested for professional {} on {} at {}",
            request.professional_id, request.date, request.time
        );

        let today = self.clock.now().date_naive();
        if let Err(reason) = validate_request_shape(&request, today) {
            return CommitBookingResponse::rejected(reason, BookingErrorType::ValidationError);
        }

        let validate_request = ValidateBookingRequest {
            professional_id: request.professional_id.clone(),
            date: request.date,
            time: request.time.clone(),
            service_ids: request.service_ids.clone(),
        };
        match self.validation.run_checks(&validate_request).await {
            Ok(()) => {}
            Err(BookingError::Database(e)) => {
                error!("Commit aborted, validation could not reach storage: {}", e);
                return CommitBookingResponse::rejected(
                    "Unable to process booking right now, please try again".to_string(),
                    BookingErrorType::ServerError,
                );
            }
            Err(reason @ (BookingError::SlotTaken | BookingError::SlotPassed)) => {
                return CommitBookingResponse::rejected(
                    reason.to_string(),
                    BookingErrorType::ScheduleConflict,
                );
            }
            Err(reason) => {
                return CommitBookingResponse::rejected(
                    reason.to_string(),
                    BookingErrorType::ValidationError,
                );
            }
        }

        // Shape validation guarantees the time parses.
        let key = match SlotKey::new(&request.professional_id, request.date, &request.time) {
            Ok(key) => key,
            Err(e) => {
                return CommitBookingResponse::rejected(
                    e.to_string(),
                    BookingErrorType::ValidationError,
                );
            }
        };

        // Last-instant duplicate check: the store has no unique constraint
        // on (professionalId, hora), so this narrows - without closing - the
        // window between "slot shown free" and the write.
        match self.slot_already_booked(&key).await {
            Ok(false) => {}
            Ok(true) => {
                warn!(
                    "Schedule conflict on commit for professional {} at {}",
                    key.professional_id,
                    key.to_hora()
                );
                return CommitBookingResponse::rejected(
                    BookingError::SlotTaken.to_string(),
                    BookingErrorType::ScheduleConflict,
                );
            }
            Err(e) => {
                error!("Commit aborted, conflict check failed: {}", e);
                return CommitBookingResponse::rejected(
                    "Unable to process booking right now, please try again".to_string(),
                    BookingErrorType::ServerError,
                );
            }
        }

        let appointment = Appointment {
            id: None,
            name: request.name.trim().to_string(),
            phone: request.phone.trim().to_string(),
            mail: request.email.trim().to_string(),
            hora: key.to_hora(),
            tipos: request.service_ids.clone(),
            professional_id: request.professional_id.clone(),
            status: AppointmentStatus::Confirmed,
            created_at: self.clock.now(),
        };

        match self.insert_appointment(&appointment).await {
            Ok(stored) => {
                info!(
                    "Booking committed for professional {} at {}",
                    stored.professional_id, stored.hora
                );
                let notification_sent =
                    self.notifications.send_booking_notifications(&stored).await;
                if !notification_sent {
                    warn!(
                        "Booking {} saved but notifications were not delivered",
                        stored.hora
                    );
                }
                CommitBookingResponse::committed(stored, notification_sent)
            }
            Err(e) => {
                error!("Failed to persist booking: {}", e);
                CommitBookingResponse::rejected(
                    "Unable to save booking, please try again".to_string(),
                    BookingErrorType::ServerError,
                )
            }
        }
    }

    /// The admin calendar's read: one professional's appointments for a
    /// date, ordered by time.
    pub async fn list_day_appointments(
        &self,
        professional_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>> {
        let date_key = format_date_key(date);
        let path = format!(
            "/rest/v1/appointments?professionalId=eq.{}&hora=like.{}&order=hora.asc",
            urlencoding::encode(professional_id),
            urlencoding::encode(&format!("{}*", date_key)),
        );

        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        result
            .into_iter()
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| anyhow!("Failed to parse appointment: {}", e))
            })
            .collect()
    }

    async fn slot_already_booked(&self, key: &SlotKey) -> Result<bool> {
        let path = format!(
            "/rest/v1/appointments?professionalId=eq.{}&hora=eq.{}&status=neq.cancelled&select=id",
            urlencoding::encode(&key.professional_id),
            urlencoding::encode(&key.to_hora()),
        );

        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(!result.is_empty())
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<Appointment> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(serde_json::to_value(appointment)?),
                Some(headers),
            )
            .await?;

        let stored = result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Insert returned no appointment"))?;
        Ok(serde_json::from_value(stored)?)
    }
}

/// Server-side request shape checks, independent of whatever the UI already
/// validated.
fn validate_request_shape(request: &CommitBookingRequest, today: NaiveDate) -> Result<(), String> {
    if request.name.trim().chars().count() < 2 {
        return Err("Name must be at least 2 characters".to_string());
    }

    let digits: String = request
        .phone
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    let separators_only = request
        .phone
        .chars()
        .all(|c| c.is_ascii_digit() || " ()-+.".contains(c));
    if !separators_only || !(8..=15).contains(&digits.len()) {
        return Err("Invalid phone number".to_string());
    }

    if !EMAIL_RE.is_match(request.email.trim()) {
        return Err("Invalid email address".to_string());
    }

    if parse_time(&request.time).is_err() {
        return Err("Invalid time format".to_string());
    }

    if request.date < today {
        return Err(BookingError::PastDate.to_string());
    }

    if request.service_ids.is_empty() {
        return Err("At least one service must be selected".to_string());
    }

    if !request.total_price.is_finite() || request.total_price < 0.0 {
        return Err("Invalid total price".to_string());
    }

    Ok(())
}
