use std::sync::Arc;

use chrono::Timelike;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use professional_cell::models::{Professional, Service};
use professional_cell::services::availability::{
    AvailabilityService, SAME_DAY_LEAD_TIME_MINUTES,
};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::clock::{Clock, SystemClock};
use shared_utils::time::{parse_time, weekday_key};

use crate::models::{BookingError, BookingValidation, ValidateBookingRequest};

/// The business-rule chain a prospective booking must pass. Nothing is
/// cached between calls: booked times are re-derived from current data on
/// every validation to avoid staleness.
pub struct BookingValidationService {
    supabase: Arc<SupabaseClient>,
    availability: AvailabilityService,
    clock: Arc<dyn Clock>,
}

impl BookingValidationService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(Arc::new(SupabaseClient::new(config)), Arc::new(SystemClock))
    }

    pub fn with_clock(supabase: Arc<SupabaseClient>, clock: Arc<dyn Clock>) -> Self {
        let availability = AvailabilityService::with_clock(supabase.clone(), clock.clone());
        Self {
            supabase,
            availability,
            clock,
        }
    }

    /// Validate and fold every outcome into the `{ valid, error }` shape the
    /// booking wizard consumes. Never returns an error to the caller.
    pub async fn validate_booking(&self, request: &ValidateBookingRequest) -> BookingValidation {
        match self.run_checks(request).await {
            Ok(()) => BookingValidation::ok(),
            Err(BookingError::Database(e)) => {
                tracing::error!("Booking validation failed on storage access: {}", e);
                BookingValidation::reject(
                    "Unable to validate booking right now, please try again".to_string(),
                )
            }
            Err(reason) => BookingValidation::reject(reason.to_string()),
        }
    }

    /// The short-circuit check chain, in order. Each rejection carries a
    /// distinct user-facing reason.
    pub async fn run_checks(&self, request: &ValidateBookingRequest) -> Result<(), BookingError> {
        debug!(
            "Validating booking for professional {} on {} at {}",
            request.professional_id, request.date, request.time
        );

        // 1. Professional must exist
        let professional = self
            .get_professional(&request.professional_id)
            .await?
            .ok_or(BookingError::ProfessionalNotFound)?;

        // 2. ...and accept new bookings
        if !professional.is_active {
            return Err(BookingError::ProfessionalInactive);
        }

        // 3. Date not in the past, day granularity
        let now = self.clock.now();
        let today = now.date_naive();
        if request.date < today {
            return Err(BookingError::PastDate);
        }

        // 4. The weekday must be a working day
        let day_key = weekday_key(request.date);
        let day = professional
            .schedule
            .day(day_key)
            .filter(|d| d.is_working_day)
            .ok_or(BookingError::NotWorkingDay)?;

        // 5. The time must fall inside a working period (start inclusive,
        //    end exclusive)
        let minutes = parse_time(&request.time)
            .map_err(|_| BookingError::InvalidInput("Invalid time format".to_string()))?;
        let in_working_period = day.working_periods.iter().any(|period| {
            match (parse_time(&period.start_time), parse_time(&period.end_time)) {
                (Ok(start), Ok(end)) => start <= minutes && minutes < end,
                _ => false,
            }
        });
        if !in_working_period {
            return Err(BookingError::OutsideWorkingHours);
        }

        // Same-day lead time: a slot the resolver would suppress as passed
        // cannot be validated either.
        if request.date == today {
            let now_minutes = now.hour() as i32 * 60 + now.minute() as i32;
            if minutes <= now_minutes + SAME_DAY_LEAD_TIME_MINUTES {
                return Err(BookingError::SlotPassed);
            }
        }

        // 6. The time must not already be booked
        let booked = self
            .availability
            .get_booked_times(&request.professional_id, request.date)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;
        if booked.contains(&request.time) {
            return Err(BookingError::SlotTaken);
        }

        // 7. Every selected service must be offered by this professional
        self.check_services_offered(&professional, &request.service_ids)
            .await?;

        Ok(())
    }

    async fn get_professional(
        &self,
        professional_id: &str,
    ) -> Result<Option<Professional>, BookingError> {
        let path = format!(
            "/rest/v1/professionals?id=eq.{}",
            urlencoding::encode(professional_id)
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        match result.into_iter().next() {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| BookingError::Database(format!("Failed to parse professional: {}", e))),
            None => Ok(None),
        }
    }

    /// Match by service id, with a fallback match on the service's name for
    /// legacy professional records that stored names instead of ids.
    async fn check_services_offered(
        &self,
        professional: &Professional,
        service_ids: &[String],
    ) -> Result<(), BookingError> {
        let unmatched: Vec<&String> = service_ids
            .iter()
            .filter(|id| !professional.services.contains(id))
            .collect();
        if unmatched.is_empty() {
            return Ok(());
        }

        let records = self.get_services(&unmatched).await?;
        for id in unmatched {
            let record = records.iter().find(|s| &s.id == id);
            let offered_by_name = record
                .map(|s| professional.services.contains(&s.name))
                .unwrap_or(false);
            if !offered_by_name {
                let label = record.map(|s| s.name.clone()).unwrap_or_else(|| id.clone());
                return Err(BookingError::ServiceNotOffered(label));
            }
        }

        Ok(())
    }

    async fn get_services(&self, service_ids: &[&String]) -> Result<Vec<Service>, BookingError> {
        let id_list = service_ids
            .iter()
            .map(|id| urlencoding::encode(id).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        let path = format!("/rest/v1/services?id=in.({})", id_list);

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| BookingError::Database(format!("Failed to parse service: {}", e)))
            })
            .collect()
    }
}
