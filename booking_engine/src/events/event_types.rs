use crate::db_types::{Reservation, Tenant};

/// Published exactly once per reservation, by the call that inserted it. Replays of the same payment never publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationCreatedEvent {
    pub reservation: Reservation,
    pub tenant: Tenant,
}

impl ReservationCreatedEvent {
    pub fn new(reservation: Reservation, tenant: Tenant) -> Self {
        Self { reservation, tenant }
    }
}
