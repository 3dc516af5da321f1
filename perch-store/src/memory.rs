use async_trait::async_trait;
use chrono::{DateTime, Utc};
use perch_core::{Booking, SlotKey, SlotState, SlotStore, StoreError, VersionedSlot};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// In-process slot store. The default backend, and the one every test
/// runs against. A single mutex guards the slot table, the hold index
/// and the booking log, so a swap and its index updates are one
/// atomic step.
#[derive(Default)]
pub struct MemorySlotStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    slots: HashMap<SlotKey, VersionedSlot>,
    holds: HashMap<Uuid, SlotKey>,
    bookings: HashMap<Uuid, Booking>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("slot table lock poisoned".into()))
    }
}

#[async_trait]
impl SlotStore for MemorySlotStore {
    async fn load(&self, key: &SlotKey) -> Result<Option<VersionedSlot>, StoreError> {
        Ok(self.lock()?.slots.get(key).cloned())
    }

    async fn compare_and_swap(
        &self,
        key: &SlotKey,
        expected_version: u64,
        next: SlotState,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;

        let Some(current) = inner.slots.get(key).cloned() else {
            return Ok(false);
        };
        if current.version != expected_version {
            return Ok(false);
        }

        if let SlotState::Held { hold } = &current.state {
            inner.holds.remove(&hold.id);
        }
        if let SlotState::Held { hold } = &next {
            inner.holds.insert(hold.id, key.clone());
        }
        inner.slots.insert(
            key.clone(),
            VersionedSlot {
                version: expected_version + 1,
                state: next,
            },
        );
        Ok(true)
    }

    async fn find_hold(&self, hold_id: Uuid) -> Result<Option<(SlotKey, VersionedSlot)>, StoreError> {
        let inner = self.lock()?;
        let Some(key) = inner.holds.get(&hold_id) else {
            return Ok(None);
        };
        Ok(inner.slots.get(key).map(|slot| (key.clone(), slot.clone())))
    }

    async fn insert_booking(&self, booking: Booking) -> Result<(), StoreError> {
        self.lock()?.bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.lock()?.bookings.get(&booking_id).cloned())
    }

    async fn expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<SlotKey>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .slots
            .iter()
            .filter_map(|(key, slot)| match &slot.state {
                SlotState::Held { hold } if hold.is_expired(now) => Some(key.clone()),
                _ => None,
            })
            .collect())
    }

    async fn insert_slot(&self, key: SlotKey, slot: VersionedSlot) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        if inner.slots.contains_key(&key) {
            return Ok(false);
        }
        if let SlotState::Held { hold } = &slot.state {
            inner.holds.insert(hold.id, key.clone());
        }
        inner.slots.insert(key, slot);
        Ok(true)
    }
}
