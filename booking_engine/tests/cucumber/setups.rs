use booking_engine::{traits::PaymentStatus, test_utils::fakes::succeeded_payment};
use cucumber::given;

use crate::{cucumber::BookingWorld, support::TestSystem};

#[given("a fresh install")]
async fn fresh_install(world: &mut BookingWorld) {
    world.system = Some(TestSystem::new().await);
}

#[given(expr = "a succeeded payment {word} for tenant {word} with {int} adult(s) and {int} child(ren)")]
async fn succeeded(world: &mut BookingWorld, reference: String, tenant: String, adults: i64, children: i64) {
    let mut payment = succeeded_payment(&reference, &tenant);
    payment.metadata.insert("adults".into(), adults.to_string());
    payment.metadata.insert("children".into(), children.to_string());
    world.sys().gateway.set_payment(payment);
}

#[given(expr = "a {word} payment {word} for tenant {word}")]
async fn payment_with_status(world: &mut BookingWorld, status: String, reference: String, tenant: String) {
    let mut payment = succeeded_payment(&reference, &tenant);
    payment.status = match status.as_str() {
        "succeeded" => PaymentStatus::Succeeded,
        "pending" => PaymentStatus::Pending,
        "failed" => PaymentStatus::Failed,
        s => panic!("Unknown payment status {s}"),
    };
    world.sys().gateway.set_payment(payment);
}

#[given(expr = "the remote sequence service answers {string}")]
async fn remote_answers(world: &mut BookingWorld, answer: String) {
    world.sys().remote.push_response(Ok(answer));
}

#[given("the payment gateway is down")]
async fn gateway_down(world: &mut BookingWorld) {
    world.sys().gateway.set_unreachable(true);
}
