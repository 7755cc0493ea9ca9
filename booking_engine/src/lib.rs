//! Booking Engine
//!
//! The booking engine turns verified payments into confirmed reservations. A payment can be reported through two
//! uncoordinated entry points (the gateway's webhook and the payer's browser returning from checkout), and both end up
//! in the same place: [`ReconciliationApi::reconcile`].
//!
//! The library is divided into these sections:
//! 1. Backend traits ([`mod@traits`]) and the SQLite backend ([`SqliteDatabase`]). The uniqueness constraint on a
//!    reservation's payment reference lives in the schema and is what ultimately decides whether a payment has already
//!    produced a reservation.
//! 2. The public API ([`ReconciliationApi`]), which verifies a payment with the gateway, checks for an existing
//!    reservation, issues a reservation number and stores the reservation. It also offers the bounded wait used by the
//!    browser confirmation flow ([`ReconciliationApi::confirm_payment`]).
//! 3. Events. When, and only when, a reservation is actually created, a [`events::ReservationCreatedEvent`] is
//!    published to any registered hooks. Notifications hang off this hook.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

mod booking_api;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use booking_api::{
    booking_objects,
    confirmation_poller::PollSchedule,
    errors::{ReconciliationError, RejectionReason},
    number_generator::ReservationNumberGenerator,
    reconciliation_api::ReconciliationApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{
    db::capabilities::{OptionalColumnPolicy, WriteCapabilities},
    SqliteDatabase,
};
pub use traits::{
    BookingDatabase,
    GatewayError,
    NoRemoteSequence,
    PaymentGateway,
    RemoteSequence,
    ReservationStore,
    ReservationStoreError,
    SequenceCounters,
    SequenceError,
    TenantManagement,
};
