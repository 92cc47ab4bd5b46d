use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::clock::Clock;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub notification_webhook_url: String,
    pub salon_notification_email: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            notification_webhook_url: String::new(),
            salon_notification_email: "salon@example.com".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            notification_webhook_url: self.notification_webhook_url.clone(),
            salon_notification_email: self.salon_notification_email.clone(),
        }
    }

}

/// A clock pinned to a single instant.
#[derive(Debug, Clone)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Canned PostgREST payloads matching the salon schema, for wiremock tests.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    /// A Monday-to-Friday 09:00-18:00 schedule with a lunch break and
    /// 30-minute slots.
    pub fn standard_weekly_schedule() -> Value {
        let working_days = ["monday", "tuesday", "wednesday", "thursday", "friday"];
        let mut days: Vec<Value> = working_days
            .iter()
            .map(|day| {
                json!({
                    "dayOfWeek": day,
                    "isWorkingDay": true,
                    "workingPeriods": [
                        { "startTime": "09:00", "endTime": "12:00" },
                        { "startTime": "13:00", "endTime": "18:00" }
                    ],
                    "slotInterval": 30
                })
            })
            .collect();
        for day in ["saturday", "sunday"] {
            days.push(json!({
                "dayOfWeek": day,
                "isWorkingDay": false,
                "workingPeriods": []
            }));
        }
        json!(days)
    }

    pub fn professional_response(id: &str, name: &str, service_ids: &[&str]) -> Value {
        json!({
            "id": id,
            "name": name,
            "phone": "11 98765-4321",
            "email": "pro@example.com",
            "services": service_ids,
            "schedule": {
                "weeklySchedule": Self::standard_weekly_schedule(),
                "defaultSlotInterval": 30
            },
            "isActive": true
        })
    }

    pub fn service_response(id: &str, name: &str, price: f64) -> Value {
        json!({
            "id": id,
            "name": name,
            "price": price,
            "promoPrice": null,
            "duration": 30,
            "category": "hair",
            "isActive": true
        })
    }

    pub fn appointment_response(professional_id: &str, hora: &str, tipos: &[&str]) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "name": "Test Customer",
            "phone": "11 91234-5678",
            "mail": "customer@example.com",
            "hora": hora,
            "tipos": tipos,
            "professionalId": professional_id,
            "status": "confirmed",
            "createdAt": Utc::now().to_rfc3339()
        })
    }
}
