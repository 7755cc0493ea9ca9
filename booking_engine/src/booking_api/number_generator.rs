use log::*;

use crate::{
    db_types::{ReservationNumber, Tenant},
    helpers::derive_prefix,
    traits::{RemoteSequence, SequenceCounters, SequenceError},
};

/// Issues reservation numbers.
///
/// The remote sequence is tried first. If it fails, times out or returns nothing, the number comes from the tenant's
/// local counter instead, which is advanced atomically by the backend. Only when the local path fails as well does
/// issuing fail; a number is never made up.
///
/// Both sources feed one sequence per tenant. Every remote number moves the local counter up to it, so a fallback
/// carries on after the last remote number. A remote number at or below the local counter may already have been issued
/// locally during an outage, and is discarded in favour of the local counter.
pub struct ReservationNumberGenerator<B, R> {
    db: B,
    remote: R,
}

impl<B, R> ReservationNumberGenerator<B, R> {
    pub fn new(db: B, remote: R) -> Self {
        Self { db, remote }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }
}

impl<B, R> ReservationNumberGenerator<B, R>
where
    B: SequenceCounters,
    R: RemoteSequence,
{
    pub async fn next_number(&self, tenant: &Tenant) -> Result<ReservationNumber, SequenceError> {
        if let Some(number) = self.remote_number(tenant).await {
            return Ok(number);
        }
        let value = self.db.increment_sequence(tenant).await.map_err(|e| {
            error!("🔢️ The local sequence counter for tenant {} could not be advanced. {e}", tenant.id);
            e
        })?;
        let number = value.reservation_number();
        info!("🔢️ Local counter issued {number} for tenant {}", tenant.id);
        Ok(number)
    }

    /// A usable number from the remote sequence, already recorded against the local counter.
    async fn remote_number(&self, tenant: &Tenant) -> Option<ReservationNumber> {
        let raw = match self.remote.next_reservation_number(&tenant.id).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("🔢️ Remote sequence failed for tenant {}. {e} Using the local counter.", tenant.id);
                return None;
            },
        };
        let Some((number, value)) = interpret_remote_number(&raw, tenant) else {
            warn!(
                "🔢️ Remote sequence returned an unusable value ('{raw}') for tenant {}. Using the local counter.",
                tenant.id
            );
            return None;
        };
        let Some(value) = value else {
            debug!("🔢️ Remote sequence issued {number} for tenant {}. It has no counter value to record.", tenant.id);
            return Some(number);
        };
        match self.db.advance_sequence(tenant, value).await {
            Ok(Some(_)) => {
                debug!("🔢️ Remote sequence issued {number} for tenant {}", tenant.id);
                Some(number)
            },
            Ok(None) => {
                warn!(
                    "🔢️ Remote sequence issued {number} for tenant {}, but the local counter is already past it. Using \
                     the local counter.",
                    tenant.id
                );
                None
            },
            Err(e) => {
                warn!("🔢️ Could not record remote number {number} for tenant {}. {e} Using the local counter.", tenant.id);
                None
            },
        }
    }
}

/// A remote result is either a bare counter value, which gets the tenant's prefix, or a complete reservation number.
/// Returns the number and, where it can be read, its counter value.
fn interpret_remote_number(raw: &str, tenant: &Tenant) -> Option<(ReservationNumber, Option<i64>)> {
    let raw = raw.trim().trim_matches('"').trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(value) if value > 0 => {
            let prefix = derive_prefix(tenant.initials.as_deref(), &tenant.display_name);
            Some((ReservationNumber::format(&prefix, value), Some(value)))
        },
        Ok(_) => None,
        Err(_) => Some((ReservationNumber(raw.to_string()), counter_suffix(raw))),
    }
}

/// The trailing digits of a complete number, e.g. `42` for `T1P-000042`.
fn counter_suffix(number: &str) -> Option<i64> {
    let digits = number.len() - number.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    number[number.len() - digits..].parse::<i64>().ok().filter(|v| *v > 0)
}
