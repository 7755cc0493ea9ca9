use booking_engine::{
    db_types::{PaymentReference, TenantId},
    traits::VerifiedPayment,
    GatewayError,
    PaymentGateway,
    RemoteSequence,
    SequenceError,
};
use mockall::mock;

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn fetch_payment(&self, reference: &PaymentReference) -> Result<VerifiedPayment, GatewayError>;
    }
}

mock! {
    pub Sequence {}
    impl RemoteSequence for Sequence {
        async fn next_reservation_number(&self, tenant: &TenantId) -> Result<String, SequenceError>;
    }
}

/// A remote sequence that is always down, so numbers come from the local counters.
pub fn offline_sequence() -> MockSequence {
    let mut seq = MockSequence::new();
    seq.expect_next_reservation_number()
        .returning(|_| Err(SequenceError::RemoteUnavailable("connection refused".into())));
    seq
}
