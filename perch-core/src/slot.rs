use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The unit of reservation: one desk, on one date, in one time slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub desk_id: String,
    pub date: NaiveDate,
    pub time_slot_id: String,
}

impl SlotKey {
    pub fn new(desk_id: impl Into<String>, date: NaiveDate, time_slot_id: impl Into<String>) -> Self {
        Self {
            desk_id: desk_id.into(),
            date,
            time_slot_id: time_slot_id.into(),
        }
    }

    /// Key under which the slot is stored in a keyed backend.
    pub fn storage_key(&self) -> String {
        format!("slot:{}:{}:{}", self.desk_id, self.date, self.time_slot_id)
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.desk_id, self.date, self.time_slot_id)
    }
}

/// A time-boxed claim on a slot. Lives only inside `SlotState::Held`,
/// so a hold can never outlive its slot's held status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    pub id: Uuid,
    pub holder_token: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Hold {
    pub fn new(now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            holder_token: Uuid::new_v4(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Expiry is boundary-inclusive: a hold whose deadline equals `now`
    /// is already expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Confirmed reservation. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub hold_id: Uuid,
    pub ticket_ref: String,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn issue(hold_id: Uuid, now: DateTime<Utc>) -> Self {
        let code: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        Self {
            id: Uuid::new_v4(),
            hold_id,
            ticket_ref: format!("PRCH-{}", code.to_uppercase()),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotState {
    Available,
    Held { hold: Hold },
    Booked { booking: Booking },
}

impl SlotState {
    /// Status as the wire reports it, with expired holds already
    /// read as available.
    pub fn effective_label(&self, now: DateTime<Utc>) -> &'static str {
        match self {
            SlotState::Available => "available",
            SlotState::Held { hold } if hold.is_expired(now) => "available",
            SlotState::Held { .. } => "held",
            SlotState::Booked { .. } => "booked",
        }
    }
}

/// Stored slot plus the version its next transition must be keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedSlot {
    pub version: u64,
    pub state: SlotState,
}

impl VersionedSlot {
    pub fn available() -> Self {
        Self {
            version: 0,
            state: SlotState::Available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_expiry_is_boundary_inclusive() {
        let now = Utc::now();
        let hold = Hold::new(now, Duration::seconds(60));
        assert!(!hold.is_expired(now));
        assert!(!hold.is_expired(now + Duration::seconds(59)));
        assert!(hold.is_expired(now + Duration::seconds(60)));
        assert!(hold.is_expired(now + Duration::seconds(61)));
    }

    #[test]
    fn expired_hold_reads_as_available() {
        let now = Utc::now();
        let state = SlotState::Held {
            hold: Hold::new(now, Duration::seconds(30)),
        };
        assert_eq!(state.effective_label(now), "held");
        assert_eq!(state.effective_label(now + Duration::seconds(31)), "available");
    }

    #[test]
    fn ticket_ref_is_prefixed_and_uppercase() {
        let booking = Booking::issue(Uuid::new_v4(), Utc::now());
        assert!(booking.ticket_ref.starts_with("PRCH-"));
        assert_eq!(booking.ticket_ref.len(), 13);
        assert_eq!(booking.ticket_ref, booking.ticket_ref.to_uppercase());
    }

    #[test]
    fn slot_state_round_trips_through_json() {
        let now = Utc::now();
        let state = SlotState::Held {
            hold: Hold::new(now, Duration::seconds(90)),
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"status\":\"HELD\""));
        let back: SlotState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
