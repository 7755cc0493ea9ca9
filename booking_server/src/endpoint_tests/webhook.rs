use std::time::Duration;

use actix_web::http::StatusCode;
use booking_engine::{
    db_types::TenantId,
    test_utils::{fakes::succeeded_payment, prepare_env::tear_down},
    traits::{PaymentStatus, VerifiedPayment},
    GatewayError,
    PollSchedule,
    ReservationStore,
};
use serde_json::Value;

use super::{
    helpers::{
        confirm_body,
        immediate,
        options,
        payment_event,
        post,
        post_with_headers,
        signed,
        test_api,
        test_database,
        T1_SECRET,
    },
    mocks::{offline_sequence, MockGateway},
};

const WEBHOOK: &str = "/webhook/payments";
const SUCCEEDED: &str = "payment_intent.succeeded";

fn gateway_with(payment: VerifiedPayment) -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().returning(move |_| Ok(payment.clone()));
    gateway
}

#[actix_web::test]
async fn signed_event_creates_the_reservation() {
    let db = test_database().await;
    let url = db.url().to_string();
    let api = test_api(db, gateway_with(succeeded_payment("pi_123", "T1")), offline_sequence());
    let event = payment_event(SUCCEEDED, "pi_123", "T1");
    let headers = signed(&event, T1_SECRET);
    let (status, body) = post_with_headers(api.clone(), immediate(), WEBHOOK, &event, &headers).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["received"], true);
    assert_eq!(body["reservation_number"], "T1P-000001");
    assert_eq!(body["created_by"], "created");

    // Redelivery of the same event
    let (status, body) = post_with_headers(api.clone(), immediate(), WEBHOOK, &event, &headers).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["created_by"], "existing");
    assert_eq!(api.db().fetch_reservations_for_tenant(&TenantId::from("T1")).await.unwrap().len(), 1);
    tear_down(&url).await;
}

#[actix_web::test]
async fn bad_signature_still_reconciles_a_verified_payment() {
    let db = test_database().await;
    let url = db.url().to_string();
    let mut gateway = MockGateway::new();
    let payment = succeeded_payment("pi_123", "T1");
    gateway.expect_fetch_payment().times(1).returning(move |_| Ok(payment.clone()));
    let api = test_api(db, gateway, offline_sequence());
    let event = payment_event(SUCCEEDED, "pi_123", "T1");
    let headers = signed(&event, "whsec_not_the_tenants");
    let (status, body) = post_with_headers(api.clone(), immediate(), WEBHOOK, &event, &headers).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["created_by"], "created");
    tear_down(&url).await;
}

#[actix_web::test]
async fn other_event_types_are_acknowledged_and_ignored() {
    let db = test_database().await;
    let url = db.url().to_string();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().never();
    let api = test_api(db, gateway, offline_sequence());
    let event = payment_event("payment_intent.created", "pi_123", "T1");
    let (status, body) = post(api.clone(), immediate(), WEBHOOK, &event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);
    // No tenant marker: nothing to reconcile against
    let event = payment_event(SUCCEEDED, "pi_123", " ");
    let (status, body) = post(api.clone(), immediate(), WEBHOOK, &event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);
    assert!(api.db().fetch_reservations_for_tenant(&TenantId::from("T1")).await.unwrap().is_empty());
    tear_down(&url).await;
}

#[actix_web::test]
async fn malformed_events_are_refused() {
    let db = test_database().await;
    let url = db.url().to_string();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().never();
    let api = test_api(db, gateway, offline_sequence());
    let (status, _) = post(api.clone(), immediate(), WEBHOOK, "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let no_id = r#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"metadata":{"tenant_id":"T1"}}}}"#;
    let (status, _) = post(api, immediate(), WEBHOOK, no_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    tear_down(&url).await;
}

#[actix_web::test]
async fn gateway_outage_asks_for_redelivery() {
    let db = test_database().await;
    let url = db.url().to_string();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().returning(|_| Err(GatewayError::GatewayUnreachable("timed out".into())));
    let api = test_api(db, gateway, offline_sequence());
    let event = payment_event(SUCCEEDED, "pi_123", "T1");
    let (status, body) = post(api, immediate(), WEBHOOK, &event).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"received":false}"#);
    tear_down(&url).await;
}

#[actix_web::test]
async fn failed_payment_is_acknowledged_without_a_reservation() {
    let db = test_database().await;
    let url = db.url().to_string();
    let failed = VerifiedPayment { status: PaymentStatus::Failed, ..succeeded_payment("pi_123", "T1") };
    let api = test_api(db, gateway_with(failed), offline_sequence());
    let event = payment_event(SUCCEEDED, "pi_123", "T1");
    let (status, body) = post(api.clone(), immediate(), WEBHOOK, &event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);
    assert!(api.db().fetch_reservations_for_tenant(&TenantId::from("T1")).await.unwrap().is_empty());
    tear_down(&url).await;
}

#[actix_web::test]
async fn webhook_and_browser_race_for_the_same_payment() {
    let db = test_database().await;
    let url = db.url().to_string();
    let api = test_api(db, gateway_with(succeeded_payment("pi_123", "T1")), offline_sequence());
    let event = payment_event(SUCCEEDED, "pi_123", "T1");
    let headers = signed(&event, T1_SECRET);
    let waiting = options(PollSchedule {
        initial_delay: Duration::from_millis(100),
        interval: Duration::from_millis(100),
        max_checks: 5,
        deadline: Duration::from_secs(2),
    });
    let request = confirm_body("pi_123", "T1");
    let ((hook_status, hook_body), (confirm_status, reply)) = futures::join!(
        post_with_headers(api.clone(), immediate(), WEBHOOK, &event, &headers),
        post(api.clone(), waiting, "/api/confirm-payment", &request),
    );
    assert_eq!(hook_status, StatusCode::OK);
    assert_eq!(confirm_status, StatusCode::OK);
    let hook: Value = serde_json::from_str(&hook_body).unwrap();
    let confirm: Value = serde_json::from_str(&reply).unwrap();
    let mut origins = vec![hook["created_by"].as_str().unwrap(), confirm["created_by"].as_str().unwrap()];
    origins.sort();
    assert_eq!(origins, vec!["created", "existing"]);
    assert_eq!(hook["reservation_number"], "T1P-000001");
    assert_eq!(confirm["reservation_number"], "T1P-000001");
    assert_eq!(hook["reservation_id"], confirm["reservation_id"]);
    assert_eq!(api.db().fetch_reservations_for_tenant(&TenantId::from("T1")).await.unwrap().len(), 1);
    tear_down(&url).await;
}
