use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::clock::{Clock, SystemClock};
use shared_utils::time::{format_date_key, format_time, parse_time, weekday_key};

use crate::models::{ProfessionalSchedule, Professional, TimeSlot};

/// Step size used when neither the day nor the professional configures one.
pub const DEFAULT_SLOT_INTERVAL_MINUTES: i32 = 30;

/// Minimum lead time for same-day bookings: slots starting at or before
/// now + this buffer are suppressed.
pub const SAME_DAY_LEAD_TIME_MINUTES: i32 = 15;

/// Generate the ordered candidate slots for one professional on one date.
///
/// Pure function of its inputs: same schedule and date always yield the
/// same sequence. Periods with `endTime <= startTime` or unparseable times
/// contribute no slots (admin-entered data may be transiently invalid), and
/// periods are sorted before walking since the admin UI does not guarantee
/// order. Overlapping periods are not de-duplicated.
pub fn generate_slots(schedule: &ProfessionalSchedule, date: NaiveDate) -> Vec<TimeSlot> {
    let day_key = weekday_key(date);
    let Some(day) = schedule.day(day_key) else {
        return Vec::new();
    };
    if !day.is_working_day {
        return Vec::new();
    }

    let interval = day
        .slot_interval
        .or(schedule.default_slot_interval)
        .filter(|i| *i > 0)
        .unwrap_or(DEFAULT_SLOT_INTERVAL_MINUTES);

    let mut periods: Vec<(i32, i32)> = day
        .working_periods
        .iter()
        .filter_map(|period| {
            match (parse_time(&period.start_time), parse_time(&period.end_time)) {
                (Ok(start), Ok(end)) if start < end => Some((start, end)),
                _ => {
                    warn!(
                        "Skipping invalid working period {}-{} on {}",
                        period.start_time, period.end_time, day_key
                    );
                    None
                }
            }
        })
        .collect();
    periods.sort_unstable_by_key(|&(start, _)| start);

    let mut slots = Vec::new();
    for (start, end) in periods {
        // Slots never start at or after the period's end.
        let mut current = start;
        while current < end {
            slots.push(TimeSlot::open(format_time(current)));
            current += interval;
        }
    }

    slots
}

/// Overlay the booked-times set and the same-day lead-time cutoff onto a
/// candidate slot sequence. Pure read-side computation, re-run per query.
pub fn resolve_availability(
    slots: Vec<TimeSlot>,
    booked: &HashSet<String>,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<TimeSlot> {
    let cutoff = if date == now.date_naive() {
        Some(now.hour() as i32 * 60 + now.minute() as i32 + SAME_DAY_LEAD_TIME_MINUTES)
    } else {
        None
    };

    slots
        .into_iter()
        .map(|mut slot| {
            if booked.contains(&slot.time) {
                slot.available = false;
            }
            if let (Some(cutoff), Ok(minutes)) = (cutoff, parse_time(&slot.time)) {
                if minutes <= cutoff {
                    slot.has_passed = Some(true);
                    slot.available = false;
                }
            }
            slot
        })
        .collect()
}

pub struct AvailabilityService {
    supabase: Arc<SupabaseClient>,
    clock: Arc<dyn Clock>,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(Arc::new(SupabaseClient::new(config)), Arc::new(SystemClock))
    }

    pub fn with_clock(supabase: Arc<SupabaseClient>, clock: Arc<dyn Clock>) -> Self {
        Self { supabase, clock }
    }

    /// Compute the bookable slots for a date. Returns `None` when the
    /// professional does not exist.
    pub async fn get_available_slots(
        &self,
        professional_id: &str,
        date: NaiveDate,
    ) -> Result<Option<Vec<TimeSlot>>> {
        debug!(
            "Calculating available slots for professional {} on {}",
            professional_id, date
        );

        let Some(professional) = self.get_professional(professional_id).await? else {
            return Ok(None);
        };

        let slots = generate_slots(&professional.schedule, date);
        if slots.is_empty() {
            return Ok(Some(slots));
        }

        let booked = self.get_booked_times(professional_id, date).await?;
        let resolved = resolve_availability(slots, &booked, date, self.clock.now());

        debug!(
            "Resolved {} slots ({} available) for professional {} on {}",
            resolved.len(),
            resolved.iter().filter(|s| s.available).count(),
            professional_id,
            date
        );
        Ok(Some(resolved))
    }

    /// The set of "HH:MM" times already taken for this professional on this
    /// date, derived from the `hora` prefix of non-cancelled appointments.
    /// Booking validation and the read path both use this derivation, so a
    /// slot shown as taken always corresponds to a persisted appointment.
    pub async fn get_booked_times(
        &self,
        professional_id: &str,
        date: NaiveDate,
    ) -> Result<HashSet<String>> {
        let date_key = format_date_key(date);
        let path = format!(
            "/rest/v1/appointments?professionalId=eq.{}&status=neq.cancelled&hora=like.{}&select=hora",
            urlencoding::encode(professional_id),
            urlencoding::encode(&format!("{}*", date_key)),
        );

        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let booked = result
            .iter()
            .filter_map(|apt| apt["hora"].as_str())
            .filter_map(|hora| hora.split(" - ").nth(1))
            .map(|time| time.to_string())
            .collect();

        Ok(booked)
    }

    async fn get_professional(&self, professional_id: &str) -> Result<Option<Professional>> {
        let path = format!(
            "/rest/v1/professionals?id=eq.{}",
            urlencoding::encode(professional_id)
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        match result.into_iter().next() {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}
