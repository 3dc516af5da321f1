use crate::error::ReservationError;
use crate::slot::{Booking, Hold, SlotKey, SlotState};
use crate::store::SlotStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Outcome of a release. A release never fails with a state error:
/// anything other than a clean transition back to available is the
/// idempotent `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    NotFound,
}

/// Owns the `Available -> Held -> Booked` lifecycle of every slot.
/// All writes to slot state go through the store's version-guarded
/// compare-and-swap, so concurrent callers on the same slot serialize
/// and callers on different slots never contend here.
pub struct ReservationCoordinator {
    store: Arc<dyn SlotStore>,
    hold_ttl: Duration,
}

impl ReservationCoordinator {
    pub fn new(store: Arc<dyn SlotStore>, hold_ttl: Duration) -> Self {
        Self { store, hold_ttl }
    }

    pub fn hold_ttl(&self) -> Duration {
        self.hold_ttl
    }

    /// Claim an available slot. A held slot whose hold has expired is
    /// reclaimed and re-held in the same swap; the guard version makes
    /// sure the reclaim is never a blind overwrite.
    pub async fn try_hold(&self, key: &SlotKey, now: DateTime<Utc>) -> Result<Hold, ReservationError> {
        let slot = self
            .store
            .load(key)
            .await?
            .ok_or_else(|| ReservationError::SlotNotFound(key.to_string()))?;

        match &slot.state {
            SlotState::Available => {}
            SlotState::Held { hold } if hold.is_expired(now) => {
                debug!(slot = %key, hold_id = %hold.id, "reclaiming expired hold on take");
            }
            _ => return Err(ReservationError::AlreadyTaken),
        }

        let hold = Hold::new(now, self.hold_ttl);
        let next = SlotState::Held { hold: hold.clone() };
        if self.store.compare_and_swap(key, slot.version, next).await? {
            info!(slot = %key, hold_id = %hold.id, expires_at = %hold.expires_at, "slot held");
            Ok(hold)
        } else {
            // Lost the race; exactly one of the contenders got the slot.
            Err(ReservationError::AlreadyTaken)
        }
    }

    /// Give a held slot back. Safe to call any number of times, with
    /// stale ids, or after expiry; only a live matching hold actually
    /// transitions state.
    pub async fn release(
        &self,
        hold_id: Uuid,
        holder_token: Uuid,
    ) -> Result<ReleaseOutcome, ReservationError> {
        let Some((key, slot)) = self.store.find_hold(hold_id).await? else {
            return Ok(ReleaseOutcome::NotFound);
        };
        let SlotState::Held { hold } = &slot.state else {
            return Ok(ReleaseOutcome::NotFound);
        };
        if hold.id != hold_id || hold.holder_token != holder_token {
            // Token mismatch reads the same as an unknown hold, so the
            // API never confirms someone else's hold exists.
            return Ok(ReleaseOutcome::NotFound);
        }

        if self
            .store
            .compare_and_swap(&key, slot.version, SlotState::Available)
            .await?
        {
            info!(slot = %key, hold_id = %hold_id, "hold released");
            Ok(ReleaseOutcome::Released)
        } else {
            Ok(ReleaseOutcome::NotFound)
        }
    }

    /// Promote a live hold into a booking. The only operation that
    /// produces a booking, and it can succeed at most once per hold:
    /// the winning swap consumes the hold.
    pub async fn confirm(
        &self,
        hold_id: Uuid,
        holder_token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Booking, ReservationError> {
        let Some((key, slot)) = self.store.find_hold(hold_id).await? else {
            return Err(ReservationError::HoldNotFound);
        };
        let SlotState::Held { hold } = &slot.state else {
            return Err(ReservationError::HoldNotFound);
        };
        if hold.id != hold_id || hold.holder_token != holder_token {
            return Err(ReservationError::HoldNotFound);
        }

        if hold.is_expired(now) {
            // Lazy reclaim. Losing this swap is fine: whoever beat us
            // already moved the slot on.
            let reclaimed = self
                .store
                .compare_and_swap(&key, slot.version, SlotState::Available)
                .await?;
            debug!(slot = %key, hold_id = %hold_id, reclaimed, "confirm on expired hold");
            return Err(ReservationError::HoldExpired);
        }

        let booking = Booking::issue(hold_id, now);
        if self
            .store
            .compare_and_swap(&key, slot.version, SlotState::Booked { booking: booking.clone() })
            .await?
        {
            self.store.insert_booking(booking.clone()).await?;
            info!(slot = %key, booking_id = %booking.id, ticket_ref = %booking.ticket_ref, "booking confirmed");
            Ok(booking)
        } else {
            Err(ReservationError::HoldNotFound)
        }
    }

    /// Revert every slot whose hold has expired back to available.
    /// Each reclaim is its own guarded swap; a reclaim that loses to a
    /// concurrent transition is simply skipped.
    pub async fn expire_sweep(&self, now: DateTime<Utc>) -> Result<usize, ReservationError> {
        let mut reclaimed = 0;
        for key in self.store.expired_holds(now).await? {
            let Some(slot) = self.store.load(&key).await? else {
                continue;
            };
            let SlotState::Held { hold } = &slot.state else {
                continue;
            };
            if !hold.is_expired(now) {
                continue;
            }
            if self
                .store
                .compare_and_swap(&key, slot.version, SlotState::Available)
                .await?
            {
                reclaimed += 1;
            }
        }
        if reclaimed > 0 {
            info!(reclaimed, "expiry sweep reclaimed stale holds");
        }
        Ok(reclaimed)
    }
}
