use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A professional (stylist/barber) as persisted in the `professionals`
/// document collection. `services` holds the identifiers of the services
/// this professional offers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub schedule: ProfessionalSchedule,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfessionalSchedule {
    /// At most one entry per weekday; days without an entry are treated as
    /// non-working.
    pub weekly_schedule: Vec<DaySchedule>,
    pub default_slot_interval: Option<i32>,
}

impl ProfessionalSchedule {
    pub fn day(&self, day_of_week: &str) -> Option<&DaySchedule> {
        self.weekly_schedule
            .iter()
            .find(|d| d.day_of_week == day_of_week)
    }
}

/// One weekday's configuration. Admin-entered: working periods may arrive
/// unsorted or transiently invalid, so consumers sort and skip rather than
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub day_of_week: String,
    pub is_working_day: bool,
    #[serde(default)]
    pub working_periods: Vec<WorkingPeriod>,
    #[serde(default)]
    pub slot_interval: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingPeriod {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub promo_price: Option<f64>,
    pub duration: i32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Service {
    /// The promo price only applies when strictly below the regular price.
    pub fn effective_price(&self) -> f64 {
        match self.promo_price {
            Some(promo) if promo < self.price => promo,
            _ => self.price,
        }
    }
}

/// A bookable point in time for one professional on one date. Transient:
/// computed per query, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub time: String,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_passed: Option<bool>,
}

impl TimeSlot {
    pub fn open(time: String) -> Self {
        Self {
            time,
            available: true,
            has_passed: None,
        }
    }
}
