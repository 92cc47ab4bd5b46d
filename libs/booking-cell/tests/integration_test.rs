use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::models::{
    BookingErrorType, CommitBookingRequest, ValidateBookingRequest,
};
use booking_cell::services::booking::BookingService;
use shared_config::AppConfig;
use shared_utils::clock::Clock;
use shared_utils::test_utils::{FixedClock, MockSupabaseResponses, TestConfig};

// Fixed timeline: "now" is Sunday 2025-06-01 12:00 UTC, bookings target
// Monday 2025-06-02.
fn sunday_noon() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    ))
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn test_config(mock_server: &MockServer) -> AppConfig {
    TestConfig::with_supabase_url(&mock_server.uri()).to_app_config()
}

fn booking_service(mock_server: &MockServer) -> BookingService {
    BookingService::with_clock(&test_config(mock_server), sunday_noon())
}

fn validate_request(time: &str) -> ValidateBookingRequest {
    ValidateBookingRequest {
        professional_id: "pro-1".to_string(),
        date: monday(),
        time: time.to_string(),
        service_ids: vec!["svc-1".to_string()],
    }
}

fn commit_request(time: &str) -> CommitBookingRequest {
    CommitBookingRequest {
        name: "Maria Silva".to_string(),
        phone: "11 91234-5678".to_string(),
        email: "maria@example.com".to_string(),
        date: monday(),
        time: time.to_string(),
        professional_id: "pro-1".to_string(),
        service_ids: vec!["svc-1".to_string()],
        total_price: 80.0,
    }
}

async fn mock_professional(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .and(query_param("id", "eq.pro-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::professional_response("pro-1", "Ana", &["svc-1"])
        ])))
        .mount(mock_server)
        .await;
}

async fn mock_no_booked_times(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("select", "hora"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;
}

// ==============================================================================
// VALIDATION CHAIN
// ==============================================================================

#[tokio::test]
async fn validates_a_clean_booking() {
    let mock_server = MockServer::start().await;
    mock_professional(&mock_server).await;
    mock_no_booked_times(&mock_server).await;

    let service = booking_service(&mock_server);
    let result = service.validator().validate_booking(&validate_request("09:30")).await;

    assert!(result.valid);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn rejects_unknown_professional() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = booking_service(&mock_server);
    let result = service.validator().validate_booking(&validate_request("09:30")).await;

    assert!(!result.valid);
    assert_eq!(result.error.as_deref(), Some("Professional not found"));
}

#[tokio::test]
async fn rejects_inactive_professional() {
    let mock_server = MockServer::start().await;
    let mut professional = MockSupabaseResponses::professional_response("pro-1", "Ana", &["svc-1"]);
    professional["isActive"] = json!(false);
    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([professional])))
        .mount(&mock_server)
        .await;

    let service = booking_service(&mock_server);
    let result = service.validator().validate_booking(&validate_request("09:30")).await;

    assert_eq!(result.error.as_deref(), Some("Professional not available"));
}

#[tokio::test]
async fn rejects_past_dates() {
    let mock_server = MockServer::start().await;
    mock_professional(&mock_server).await;

    let service = booking_service(&mock_server);
    let mut request = validate_request("09:30");
    request.date = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
    let result = service.validator().validate_booking(&request).await;

    assert_eq!(result.error.as_deref(), Some("Cannot book past dates"));
}

#[tokio::test]
async fn rejects_non_working_day() {
    let mock_server = MockServer::start().await;
    mock_professional(&mock_server).await;

    let service = booking_service(&mock_server);
    let mut request = validate_request("09:30");
    // 2025-06-08 is a Sunday; the standard schedule does not work Sundays.
    request.date = NaiveDate::from_ymd_opt(2025, 6, 8).unwrap();
    let result = service.validator().validate_booking(&request).await;

    assert_eq!(
        result.error.as_deref(),
        Some("Professional does not work on this day")
    );
}

#[tokio::test]
async fn rejects_time_outside_working_periods() {
    let mock_server = MockServer::start().await;
    mock_professional(&mock_server).await;

    let service = booking_service(&mock_server);
    // Lunch gap between the 09:00-12:00 and 13:00-18:00 periods, plus the
    // exclusive period end.
    for time in ["08:00", "12:00", "12:30", "18:00"] {
        let result = service.validator().validate_booking(&validate_request(time)).await;
        assert_eq!(
            result.error.as_deref(),
            Some("Time outside working hours"),
            "time {}",
            time
        );
    }
}

#[tokio::test]
async fn accepts_period_start_inclusive() {
    let mock_server = MockServer::start().await;
    mock_professional(&mock_server).await;
    mock_no_booked_times(&mock_server).await;

    let service = booking_service(&mock_server);
    let result = service.validator().validate_booking(&validate_request("09:00")).await;
    assert!(result.valid);
}

#[tokio::test]
async fn rejects_already_booked_time() {
    let mock_server = MockServer::start().await;
    mock_professional(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("select", "hora"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "hora": "02/06/2025 - 09:30" }
        ])))
        .mount(&mock_server)
        .await;

    let service = booking_service(&mock_server);
    let result = service.validator().validate_booking(&validate_request("09:30")).await;

    assert_eq!(result.error.as_deref(), Some("Time slot already taken"));
}

#[tokio::test]
async fn rejects_same_day_time_within_lead_buffer() {
    let mock_server = MockServer::start().await;
    mock_professional(&mock_server).await;
    mock_no_booked_times(&mock_server).await;

    // Now is Monday 09:20; 09:30 is inside the 15-minute lead buffer,
    // 10:00 is not.
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 20, 0).unwrap(),
    ));
    let service = BookingService::with_clock(&test_config(&mock_server), clock);

    let passed = service.validator().validate_booking(&validate_request("09:30")).await;
    assert_eq!(
        passed.error.as_deref(),
        Some("Time is no longer available today")
    );

    let open = service.validator().validate_booking(&validate_request("10:00")).await;
    assert!(open.valid);
}

#[tokio::test]
async fn rejects_service_not_offered_naming_the_service() {
    let mock_server = MockServer::start().await;
    mock_professional(&mock_server).await;
    mock_no_booked_times(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::service_response("svc-2", "Barba", 40.0)
        ])))
        .mount(&mock_server)
        .await;

    let service = booking_service(&mock_server);
    let mut request = validate_request("09:30");
    request.service_ids = vec!["svc-2".to_string()];
    let result = service.validator().validate_booking(&request).await;

    assert_eq!(
        result.error.as_deref(),
        Some("Service Barba is not offered by this professional")
    );
}

#[tokio::test]
async fn matches_legacy_records_by_service_name() {
    let mock_server = MockServer::start().await;
    // Legacy professional record: offers services by name, not id.
    let mut professional = MockSupabaseResponses::professional_response("pro-1", "Ana", &[]);
    professional["services"] = json!(["Barba"]);
    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([professional])))
        .mount(&mock_server)
        .await;
    mock_no_booked_times(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::service_response("svc-2", "Barba", 40.0)
        ])))
        .mount(&mock_server)
        .await;

    let service = booking_service(&mock_server);
    let mut request = validate_request("09:30");
    request.service_ids = vec!["svc-2".to_string()];
    let result = service.validator().validate_booking(&request).await;

    assert!(result.valid, "legacy name match should pass: {:?}", result.error);
}

// ==============================================================================
// CONFLICT-CHECKED COMMIT
// ==============================================================================

async fn mock_insert(mock_server: &MockServer) {
    let stored = MockSupabaseResponses::appointment_response("pro-1", "02/06/2025 - 09:30", &["svc-1"]);
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([stored])))
        .expect(1)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn commits_a_clean_booking_and_notifies() {
    let mock_server = MockServer::start().await;
    mock_professional(&mock_server).await;
    mock_no_booked_times(&mock_server).await;
    // Final existence check sees nothing
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("select", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    mock_insert(&mock_server).await;
    // Customer confirmation + internal alert
    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server);
    config.notification_webhook_url = format!("{}/notify", mock_server.uri());
    let service = BookingService::with_clock(&config, sunday_noon());

    let response = service.commit_booking(commit_request("09:30")).await;

    assert!(response.success, "commit failed: {:?}", response.error);
    assert_eq!(response.notification_sent, Some(true));
    let appointment = response.appointment.expect("stored appointment");
    assert_eq!(appointment.hora, "02/06/2025 - 09:30");
    assert_eq!(appointment.professional_id, "pro-1");
}

#[tokio::test]
async fn second_commit_for_same_slot_is_rejected() {
    let mock_server = MockServer::start().await;
    mock_professional(&mock_server).await;
    mock_no_booked_times(&mock_server).await;

    // The existence check is empty exactly once; after the first write it
    // reports the stored appointment. This reproduces two racing commit
    // attempts resolving to the same professional+time.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("select", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("select", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "apt-1" }
        ])))
        .mount(&mock_server)
        .await;
    mock_insert(&mock_server).await;

    let service = booking_service(&mock_server);

    let first = service.commit_booking(commit_request("09:30")).await;
    assert!(first.success);

    let second = service.commit_booking(commit_request("09:30")).await;
    assert!(!second.success);
    assert_eq!(second.error_type, Some(BookingErrorType::ScheduleConflict));
    assert_eq!(second.error.as_deref(), Some("Time slot already taken"));
}

#[tokio::test]
async fn notification_failure_does_not_fail_the_booking() {
    let mock_server = MockServer::start().await;
    mock_professional(&mock_server).await;
    mock_no_booked_times(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("select", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    mock_insert(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server);
    config.notification_webhook_url = format!("{}/notify", mock_server.uri());
    let service = BookingService::with_clock(&config, sunday_noon());

    let response = service.commit_booking(commit_request("09:30")).await;

    assert!(response.success);
    assert_eq!(response.notification_sent, Some(false));
}

#[tokio::test]
async fn commit_rejects_malformed_input_before_touching_storage() {
    let mock_server = MockServer::start().await;
    let service = booking_service(&mock_server);

    let mut request = commit_request("09:30");
    request.email = "not-an-email".to_string();
    let response = service.commit_booking(request).await;

    assert!(!response.success);
    assert_eq!(response.error_type, Some(BookingErrorType::ValidationError));
    assert_eq!(response.error.as_deref(), Some("Invalid email address"));
    // No storage mocks were mounted: the shape check short-circuits.
}

#[tokio::test]
async fn validation_rejection_surfaces_as_validation_error_type() {
    let mock_server = MockServer::start().await;
    mock_professional(&mock_server).await;

    let service = booking_service(&mock_server);
    let response = service.commit_booking(commit_request("12:30")).await;

    assert!(!response.success);
    assert_eq!(response.error_type, Some(BookingErrorType::ValidationError));
    assert_eq!(response.error.as_deref(), Some("Time outside working hours"));
}

#[tokio::test]
async fn lists_a_day_of_appointments() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response("pro-1", "02/06/2025 - 09:00", &["svc-1"]),
            MockSupabaseResponses::appointment_response("pro-1", "02/06/2025 - 10:30", &["svc-1"]),
        ])))
        .mount(&mock_server)
        .await;

    let service = booking_service(&mock_server);
    let appointments = service
        .list_day_appointments("pro-1", monday())
        .await
        .expect("listing");

    assert_eq!(appointments.len(), 2);
    assert_eq!(appointments[0].hora, "02/06/2025 - 09:00");
    assert_eq!(appointments[1].hora, "02/06/2025 - 10:30");
}
