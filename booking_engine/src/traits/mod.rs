//! Backend traits for the booking engine.
//!
//! A backend needs to provide [`ReservationStore`], [`TenantManagement`] and [`SequenceCounters`]; anything that does
//! is a [`BookingDatabase`]. The external collaborators, the payment gateway and the remote sequence service, sit
//! behind [`PaymentGateway`] and [`RemoteSequence`] so that the server can plug in real clients and tests can plug in
//! fakes.
mod payment_gateway;
mod reservation_store;
mod sequence_counters;
mod tenant_management;

pub use payment_gateway::{GatewayError, PaymentGateway, PaymentStatus, VerifiedPayment, TENANT_MARKER_KEY};
pub use reservation_store::{ReservationStore, ReservationStoreError};
pub use sequence_counters::{NoRemoteSequence, RemoteSequence, SequenceCounters, SequenceError};
pub use tenant_management::TenantManagement;

/// Everything the reconciliation flow needs from storage.
pub trait BookingDatabase: ReservationStore + TenantManagement + SequenceCounters {}

impl<T> BookingDatabase for T where T: ReservationStore + TenantManagement + SequenceCounters {}
