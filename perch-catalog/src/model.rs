use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub address: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Desk {
    pub id: String,
    pub location_id: String,
    pub name: String,
    pub floor: String,
    pub seat_type: String,
    pub rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: String,
    pub start_time: String,
    pub end_time: String,
    pub label: String,
    pub price_cents: i64,
}

impl TimeSlot {
    pub fn window(&self) -> String {
        format!("{} - {}", self.start_time, self.end_time)
    }
}

/// Everything the reservation path needs to know about a slot beyond
/// its lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotMeta {
    pub desk_name: String,
    pub location_name: String,
    pub time_slot_label: String,
    pub time_slot_window: String,
    pub price_cents: i64,
    pub rating: f64,
}
