use std::time::Duration;

use booking_engine::{booking_objects::CreatedBy, ReservationStore, SequenceCounters};
use cucumber::{then, when};

use crate::cucumber::{
    booking_world::{error_code, patient_schedule, reference, tenant, test_schedule},
    BookingWorld,
};

#[when(expr = "the webhook reports {word} for tenant {word}")]
async fn webhook_reports(world: &mut BookingWorld, payment: String, tenant_id: String) {
    let response = world.api().reconcile(&reference(&payment), &tenant(&tenant_id)).await;
    world.responses.push(response);
}

#[when(expr = "the webhook reports {word} for tenant {word} {int} times")]
async fn webhook_reports_repeatedly(world: &mut BookingWorld, payment: String, tenant_id: String, n: usize) {
    for _ in 0..n {
        webhook_reports(world, payment.clone(), tenant_id.clone()).await;
    }
}

#[when(expr = "the browser confirms {word} for tenant {word}")]
async fn browser_confirms(world: &mut BookingWorld, payment: String, tenant_id: String) {
    let schedule = test_schedule();
    let response = world.api().confirm_payment(&reference(&payment), &tenant(&tenant_id), &schedule).await;
    world.responses.push(response);
}

#[when(expr = "the browser and the webhook both report {word} for tenant {word} within {int}ms")]
async fn race(world: &mut BookingWorld, payment: String, tenant_id: String, ms: u64) {
    let reference = reference(&payment);
    let tenant = tenant(&tenant_id);
    let api = world.api();
    let schedule = patient_schedule();
    let browser = api.confirm_payment(&reference, &tenant, &schedule);
    let webhook = async {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        api.reconcile(&reference, &tenant).await
    };
    let (browser, webhook) = tokio::join!(browser, webhook);
    world.responses.push(browser);
    world.responses.push(webhook);
}

#[when(expr = "{int} concurrent webhook deliveries report {word} for tenant {word}")]
async fn concurrent_webhooks(world: &mut BookingWorld, n: usize, payment: String, tenant_id: String) {
    let reference = reference(&payment);
    let tenant = tenant(&tenant_id);
    let api = world.api();
    let calls = (0..n).map(|_| api.reconcile(&reference, &tenant));
    let responses = futures_util::future::join_all(calls).await;
    world.responses.extend(responses);
}

#[then(expr = "there is/are {int} reservation(s) for tenant {word}")]
async fn reservation_count(world: &mut BookingWorld, n: usize, tenant_id: String) {
    let reservations =
        world.api().db().fetch_reservations_for_tenant(&tenant(&tenant_id)).await.expect("Error fetching reservations");
    assert_eq!(reservations.len(), n);
}

#[then(expr = "the reservation for {word} has number {word}")]
async fn reservation_number(world: &mut BookingWorld, payment: String, number: String) {
    let reservation = world
        .api()
        .db()
        .fetch_reservation_by_payment_reference(&reference(&payment))
        .await
        .expect("Error fetching reservation")
        .expect("No reservation for this payment");
    assert_eq!(reservation.reservation_number.as_str(), number);
}

#[then(expr = "the reservation for {word} is for {int} adult(s) and {int} child(ren)")]
async fn reservation_guests(world: &mut BookingWorld, payment: String, adults: i64, children: i64) {
    let reservation = world
        .api()
        .db()
        .fetch_reservation_by_payment_reference(&reference(&payment))
        .await
        .expect("Error fetching reservation")
        .expect("No reservation for this payment");
    assert_eq!((reservation.adults, reservation.children), (adults, children));
}

#[then(expr = "{int} response(s) said {string}")]
async fn responses_said(world: &mut BookingWorld, n: usize, created_by: String) {
    let expected = match created_by.as_str() {
        "created" => CreatedBy::Created,
        "existing" => CreatedBy::Existing,
        s => panic!("Unknown outcome {s}"),
    };
    let count = world.responses.iter().filter(|r| matches!(r, Ok(o) if o.created_by == expected)).count();
    assert_eq!(count, n, "Responses: {:?}", world.responses);
}

#[then("all responses carry the same reservation number")]
async fn same_number(world: &mut BookingWorld) {
    let numbers = world
        .responses
        .iter()
        .map(|r| r.as_ref().expect("Unexpected failure").reservation.reservation_number.clone())
        .collect::<Vec<_>>();
    assert!(!numbers.is_empty());
    assert!(numbers.iter().all(|n| n == &numbers[0]), "Numbers: {numbers:?}");
}

#[then(expr = "every response was rejected as {string}")]
async fn all_rejected(world: &mut BookingWorld, code: String) {
    assert!(!world.responses.is_empty());
    for response in &world.responses {
        match response {
            Ok(o) => panic!("Expected a rejection, got {o:?}"),
            Err(e) => assert_eq!(error_code(e), code, "{e}"),
        }
    }
}

#[then(expr = "the local counter for tenant {word} is at {int}")]
async fn local_counter(world: &mut BookingWorld, tenant_id: String, value: i64) {
    let counter = world.api().db().fetch_sequence(&tenant(&tenant_id)).await.expect("Error fetching counter");
    assert_eq!(counter.map(|c| c.value), Some(value));
}

#[then(expr = "exactly {int} confirmation(s) is/are sent")]
async fn confirmations_sent(world: &mut BookingWorld, n: usize) {
    let events = world.created_events().await;
    assert_eq!(events.len(), n);
}
