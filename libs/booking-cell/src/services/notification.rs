use serde_json::json;
use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::models::Appointment;

/// Best-effort booking notifications: one confirmation to the customer, one
/// internal alert to the salon. The appointment is already durable when
/// these fire, so a delivery failure is logged and reported as a side
/// condition only. It never rolls back or fails the booking.
pub struct NotificationService {
    client: reqwest::Client,
    webhook_url: String,
    salon_email: String,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: config.notification_webhook_url.clone(),
            salon_email: config.salon_notification_email.clone(),
        }
    }

    /// Returns whether both messages were accepted downstream.
    pub async fn send_booking_notifications(&self, appointment: &Appointment) -> bool {
        if self.webhook_url.is_empty() {
            debug!("Notification webhook not configured, skipping");
            return false;
        }

        let customer = self
            .deliver(
                "booking_confirmation",
                &appointment.mail,
                appointment,
            )
            .await;
        let internal = self
            .deliver(
                "internal_booking_alert",
                &self.salon_email,
                appointment,
            )
            .await;

        customer && internal
    }

    async fn deliver(&self, template: &str, recipient: &str, appointment: &Appointment) -> bool {
        let payload = json!({
            "template": template,
            "to": recipient,
            "booking": {
                "name": appointment.name,
                "phone": appointment.phone,
                "mail": appointment.mail,
                "hora": appointment.hora,
                "tipos": appointment.tipos,
                "professionalId": appointment.professional_id,
            }
        });

        match self.client.post(&self.webhook_url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Notification {} delivered to {}", template, recipient);
                true
            }
            Ok(response) => {
                warn!(
                    "Notification {} to {} rejected with status {}",
                    template,
                    recipient,
                    response.status()
                );
                false
            }
            Err(e) => {
                warn!("Notification {} to {} failed: {}", template, recipient, e);
                false
            }
        }
    }
}
