//! In-memory stand-ins for the external collaborators of the booking engine.
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
};

use crate::{
    db_types::{PaymentReference, TenantId},
    traits::{GatewayError, PaymentGateway, PaymentStatus, RemoteSequence, SequenceError, VerifiedPayment},
};

/// A succeeded payment for 2 adults and 1 child, owned by `tenant`.
pub fn succeeded_payment(reference: &str, tenant: &str) -> VerifiedPayment {
    let metadata = [
        ("tenant_id", tenant),
        ("activity_date", "2024-07-01"),
        ("activity", "Sunset cruise"),
        ("adults", "2"),
        ("children", "1"),
        ("customer_name", "Ana Silva"),
        ("customer_email", "ana@example.com"),
        ("customer_phone", "+351 912 345 678"),
        ("pickup_location", "Hotel Mar"),
        ("pickup_time", "17:30"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    VerifiedPayment {
        reference: PaymentReference::from(reference),
        status: PaymentStatus::Succeeded,
        amount: 12_500,
        currency: "eur".into(),
        metadata,
    }
}

/// A payment gateway backed by a map of payments. Unknown references are reported as not found.
#[derive(Clone, Default)]
pub struct FakeGateway {
    payments: Arc<Mutex<HashMap<PaymentReference, VerifiedPayment>>>,
    unreachable: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl FakeGateway {
    pub fn with_payment(self, payment: VerifiedPayment) -> Self {
        self.set_payment(payment);
        self
    }

    pub fn set_payment(&self, payment: VerifiedPayment) {
        if let Ok(mut payments) = self.payments.lock() {
            payments.insert(payment.reference.clone(), payment);
        }
    }

    pub fn set_status(&self, reference: &str, status: PaymentStatus) {
        if let Ok(mut payments) = self.payments.lock() {
            if let Some(p) = payments.get_mut(&PaymentReference::from(reference)) {
                p.status = status;
            }
        }
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for FakeGateway {
    async fn fetch_payment(&self, reference: &PaymentReference) -> Result<VerifiedPayment, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(GatewayError::GatewayUnreachable("connection refused".into()));
        }
        let payment = self.payments.lock().ok().and_then(|p| p.get(reference).cloned());
        payment.ok_or_else(|| GatewayError::PaymentNotFound(reference.clone()))
    }
}

/// A remote sequence that replays queued responses. Once the queue is empty, every call fails as unavailable.
#[derive(Clone, Default)]
pub struct FakeRemoteSequence {
    responses: Arc<Mutex<VecDeque<Result<String, SequenceError>>>>,
    calls: Arc<AtomicUsize>,
}

impl FakeRemoteSequence {
    pub fn push_response(&self, response: Result<String, SequenceError>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(response);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RemoteSequence for FakeRemoteSequence {
    async fn next_reservation_number(&self, _tenant: &TenantId) -> Result<String, SequenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().ok().and_then(|mut r| r.pop_front());
        next.unwrap_or_else(|| Err(SequenceError::RemoteUnavailable("timed out".into())))
    }
}
