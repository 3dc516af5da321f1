use crate::slot::{Booking, SlotKey, SlotState, VersionedSlot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Storage contract for slot state. The only mutation primitive is a
/// version-guarded compare-and-swap, so two writers racing on the same
/// slot produce exactly one winner.
#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn load(&self, key: &SlotKey) -> Result<Option<VersionedSlot>, StoreError>;

    /// Replace the slot's state iff its stored version equals
    /// `expected_version`; on success the version is bumped by one.
    /// Returns false when the guard fails (someone else won the race).
    /// Implementations must keep the hold index consistent with the
    /// state they write, in the same atomic step.
    async fn compare_and_swap(
        &self,
        key: &SlotKey,
        expected_version: u64,
        next: SlotState,
    ) -> Result<bool, StoreError>;

    /// Look up the slot currently held under `hold_id`, if any.
    async fn find_hold(&self, hold_id: Uuid) -> Result<Option<(SlotKey, VersionedSlot)>, StoreError>;

    /// Audit-trail record of a confirmed booking.
    async fn insert_booking(&self, booking: Booking) -> Result<(), StoreError>;

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, StoreError>;

    /// Keys of slots whose hold has `expires_at <= now`, for the sweeper.
    async fn expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<SlotKey>, StoreError>;

    /// Seed-time insert. Writes only when the key is absent and
    /// returns whether it did; existing slot state (live holds,
    /// bookings) is never overwritten. Never used on the reservation
    /// path.
    async fn insert_slot(&self, key: SlotKey, slot: VersionedSlot) -> Result<bool, StoreError>;
}
