use actix_web::http::StatusCode;
use booking_engine::{
    db_types::TenantId,
    test_utils::{fakes::succeeded_payment, prepare_env::tear_down},
    traits::{PaymentStatus, VerifiedPayment},
    GatewayError,
    ReservationStore,
};
use serde_json::Value;

use super::{
    helpers::{confirm_body, immediate, post, test_api, test_database},
    mocks::{offline_sequence, MockGateway},
};

const CONFIRM: &str = "/api/confirm-payment";

fn gateway_with(payment: VerifiedPayment) -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().returning(move |_| Ok(payment.clone()));
    gateway
}

#[actix_web::test]
async fn confirm_creates_then_finds_the_reservation() {
    let db = test_database().await;
    let url = db.url().to_string();
    let api = test_api(db, gateway_with(succeeded_payment("pi_123", "T1")), offline_sequence());
    let (status, body) = post(api.clone(), immediate(), CONFIRM, &confirm_body("pi_123", "T1")).await;
    assert_eq!(status, StatusCode::OK);
    let first: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(first["success"], true);
    assert_eq!(first["reservation_number"], "T1P-000001");
    assert_eq!(first["created_by"], "created");

    let (status, body) = post(api.clone(), immediate(), CONFIRM, &confirm_body("pi_123", "T1")).await;
    assert_eq!(status, StatusCode::OK);
    let second: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(second["created_by"], "existing");
    assert_eq!(second["reservation_id"], first["reservation_id"]);
    assert_eq!(second["reservation_number"], "T1P-000001");

    let stored = api.db().fetch_reservations_for_tenant(&TenantId::from("T1")).await.unwrap();
    assert_eq!(stored.len(), 1);
    tear_down(&url).await;
}

#[actix_web::test]
async fn pending_payment_is_accepted_but_not_booked() {
    let db = test_database().await;
    let url = db.url().to_string();
    let pending = VerifiedPayment { status: PaymentStatus::Pending, ..succeeded_payment("pi_123", "T1") };
    let api = test_api(db, gateway_with(pending), offline_sequence());
    let (status, body) = post(api.clone(), immediate(), CONFIRM, &confirm_body("pi_123", "T1")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "payment_pending");
    assert!(api.db().fetch_reservations_for_tenant(&TenantId::from("T1")).await.unwrap().is_empty());
    tear_down(&url).await;
}

#[actix_web::test]
async fn another_tenant_cannot_claim_the_payment() {
    let db = test_database().await;
    let url = db.url().to_string();
    let api = test_api(db, gateway_with(succeeded_payment("pi_123", "T1")), offline_sequence());
    let (status, body) = post(api.clone(), immediate(), CONFIRM, &confirm_body("pi_123", "T2")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "payment_rejected");
    assert!(api.db().fetch_reservations_for_tenant(&TenantId::from("T1")).await.unwrap().is_empty());
    assert!(api.db().fetch_reservations_for_tenant(&TenantId::from("T2")).await.unwrap().is_empty());
    tear_down(&url).await;
}

#[actix_web::test]
async fn unknown_payment() {
    let db = test_database().await;
    let url = db.url().to_string();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().returning(|r| Err(GatewayError::PaymentNotFound(r.clone())));
    let api = test_api(db, gateway, offline_sequence());
    let (status, body) = post(api, immediate(), CONFIRM, &confirm_body("pi_nope", "T1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "payment_not_found");
    tear_down(&url).await;
}

#[actix_web::test]
async fn gateway_outage_does_not_leak_details() {
    let db = test_database().await;
    let url = db.url().to_string();
    let mut gateway = MockGateway::new();
    gateway
        .expect_fetch_payment()
        .returning(|_| Err(GatewayError::GatewayUnreachable("connect to 10.1.2.3:443 refused".into())));
    let api = test_api(db, gateway, offline_sequence());
    let (status, body) = post(api, immediate(), CONFIRM, &confirm_body("pi_123", "T1")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "processing");
    assert!(!body.contains("10.1.2.3"));
    tear_down(&url).await;
}

#[actix_web::test]
async fn malformed_requests_are_refused() {
    let db = test_database().await;
    let url = db.url().to_string();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().never();
    let api = test_api(db, gateway, offline_sequence());
    let (status, body) = post(api.clone(), immediate(), CONFIRM, r#"{"payment_reference": "pi_123"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "invalid_request");
    let (status, _) = post(api.clone(), immediate(), CONFIRM, &confirm_body("  ", "T1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post(api, immediate(), CONFIRM, "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    tear_down(&url).await;
}
