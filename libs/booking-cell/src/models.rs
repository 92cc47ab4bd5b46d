use std::fmt;

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shared_utils::time::{format_date_key, format_time, parse_date_key, parse_time};

// ==============================================================================
// PERSISTED APPOINTMENT CONTRACT
// ==============================================================================

/// The committed booking as persisted in the `appointments` collection.
///
/// The wire field names (`mail`, `hora`, `tipos`, `professionalId`,
/// `createdAt`) are a durable contract: calendar grouping and slot-conflict
/// detection both key off the combined `hora` string, and other tooling
/// filters on its "DD/MM/YYYY" prefix. Changing any of them is a migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub phone: String,
    pub mail: String,
    /// "DD/MM/YYYY - HH:MM"
    pub hora: String,
    /// Selected service identifiers.
    pub tipos: Vec<String>,
    #[serde(rename = "professionalId")]
    pub professional_id: String,
    pub status: AppointmentStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// The structured booking-conflict key. Internally every comparison works on
/// this; the legacy `hora` string only exists at the persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub professional_id: String,
    pub date: NaiveDate,
    /// Minutes since midnight.
    pub minutes: i32,
}

impl SlotKey {
    pub fn new(professional_id: &str, date: NaiveDate, time: &str) -> Result<Self> {
        Ok(Self {
            professional_id: professional_id.to_string(),
            date,
            minutes: parse_time(time)?,
        })
    }

    pub fn time(&self) -> String {
        format_time(self.minutes)
    }

    /// Render the legacy combined date-time string.
    pub fn to_hora(&self) -> String {
        format!("{} - {}", format_date_key(self.date), self.time())
    }

    /// Parse a persisted `hora` back into the structured key.
    pub fn parse_hora(professional_id: &str, hora: &str) -> Result<Self> {
        let (date_part, time_part) = hora
            .split_once(" - ")
            .ok_or_else(|| anyhow!("Malformed hora field: {:?}", hora))?;
        Ok(Self {
            professional_id: professional_id.to_string(),
            date: parse_date_key(date_part)?,
            minutes: parse_time(time_part)?,
        })
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateBookingRequest {
    pub professional_id: String,
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub service_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BookingValidation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn reject(reason: String) -> Self {
        Self {
            valid: false,
            error: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitBookingRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub date: NaiveDate,
    pub time: String,
    pub professional_id: String,
    #[serde(default)]
    pub service_ids: Vec<String>,
    #[serde(default)]
    pub total_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitBookingResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<BookingErrorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment: Option<Appointment>,
    /// Side condition only: false never fails the booking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_sent: Option<bool>,
}

impl CommitBookingResponse {
    pub fn committed(appointment: Appointment, notification_sent: bool) -> Self {
        Self {
            success: true,
            error: None,
            error_type: None,
            appointment: Some(appointment),
            notification_sent: Some(notification_sent),
        }
    }

    pub fn rejected(error: String, error_type: BookingErrorType) -> Self {
        Self {
            success: false,
            error: Some(error),
            error_type: Some(error_type),
            appointment: None,
            notification_sent: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingErrorType {
    ValidationError,
    ScheduleConflict,
    ServerError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAppointmentsQuery {
    pub professional_id: String,
    pub date: NaiveDate,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

/// Rejection reasons for a prospective booking. The display strings are
/// surfaced to the end user, so each must stay distinguishable.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Professional not available")]
    ProfessionalInactive,

    #[error("Cannot book past dates")]
    PastDate,

    #[error("Professional does not work on this day")]
    NotWorkingDay,

    #[error("Time outside working hours")]
    OutsideWorkingHours,

    #[error("Time is no longer available today")]
    SlotPassed,

    #[error("Time slot already taken")]
    SlotTaken,

    #[error("Service {0} is not offered by this professional")]
    ServiceNotOffered(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_key_round_trips_through_hora() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let key = SlotKey::new("pro-1", date, "09:30").unwrap();
        assert_eq!(key.to_hora(), "02/06/2025 - 09:30");

        let parsed = SlotKey::parse_hora("pro-1", &key.to_hora()).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn slot_key_rejects_malformed_hora() {
        assert!(SlotKey::parse_hora("pro-1", "02/06/2025 09:30").is_err());
        assert!(SlotKey::parse_hora("pro-1", "2025-06-02 - 09:30").is_err());
        assert!(SlotKey::parse_hora("pro-1", "02/06/2025 - late").is_err());
    }

    #[test]
    fn appointment_serializes_with_legacy_field_names() {
        let appointment = Appointment {
            id: None,
            name: "Maria".to_string(),
            phone: "11 91234-5678".to_string(),
            mail: "maria@example.com".to_string(),
            hora: "02/06/2025 - 09:30".to_string(),
            tipos: vec!["svc-1".to_string()],
            professional_id: "pro-1".to_string(),
            status: AppointmentStatus::Confirmed,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&appointment).unwrap();
        assert_eq!(value["mail"], "maria@example.com");
        assert_eq!(value["hora"], "02/06/2025 - 09:30");
        assert_eq!(value["tipos"][0], "svc-1");
        assert_eq!(value["professionalId"], "pro-1");
        assert_eq!(value["status"], "confirmed");
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn error_type_uses_screaming_snake_wire_names() {
        assert_eq!(
            serde_json::to_value(BookingErrorType::ScheduleConflict).unwrap(),
            "SCHEDULE_CONFLICT"
        );
        assert_eq!(
            serde_json::to_value(BookingErrorType::ValidationError).unwrap(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            serde_json::to_value(BookingErrorType::ServerError).unwrap(),
            "SERVER_ERROR"
        );
    }

    #[test]
    fn rejection_reasons_stay_distinguishable() {
        let reasons: Vec<String> = [
            BookingError::ProfessionalNotFound,
            BookingError::ProfessionalInactive,
            BookingError::PastDate,
            BookingError::NotWorkingDay,
            BookingError::OutsideWorkingHours,
            BookingError::SlotPassed,
            BookingError::SlotTaken,
            BookingError::ServiceNotOffered("Corte".to_string()),
        ]
        .iter()
        .map(|e| e.to_string())
        .collect();

        let unique: std::collections::HashSet<&String> = reasons.iter().collect();
        assert_eq!(unique.len(), reasons.len());
    }
}
