use crate::model::{Desk, Location, SlotMeta, TimeSlot};
use std::collections::HashMap;

/// Read-only catalog of locations, desks and time slots. Built once at
/// startup from seed data; the reservation path only ever reads it.
pub struct Catalog {
    locations: HashMap<String, Location>,
    desks: HashMap<String, Desk>,
    time_slots: HashMap<String, TimeSlot>,
    location_order: Vec<String>,
    time_slot_order: Vec<String>,
}

impl Catalog {
    pub fn new(locations: Vec<Location>, desks: Vec<Desk>, time_slots: Vec<TimeSlot>) -> Self {
        let location_order = locations.iter().map(|l| l.id.clone()).collect();
        let time_slot_order = time_slots.iter().map(|t| t.id.clone()).collect();
        Self {
            locations: locations.into_iter().map(|l| (l.id.clone(), l)).collect(),
            desks: desks.into_iter().map(|d| (d.id.clone(), d)).collect(),
            time_slots: time_slots.into_iter().map(|t| (t.id.clone(), t)).collect(),
            location_order,
            time_slot_order,
        }
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.get(id)
    }

    /// Locations in seed order.
    pub fn locations(&self) -> Vec<&Location> {
        self.location_order
            .iter()
            .filter_map(|id| self.locations.get(id))
            .collect()
    }

    pub fn desk(&self, id: &str) -> Option<&Desk> {
        self.desks.get(id)
    }

    pub fn desks_in(&self, location_id: &str) -> Vec<&Desk> {
        let mut desks: Vec<&Desk> = self
            .desks
            .values()
            .filter(|d| d.location_id == location_id)
            .collect();
        desks.sort_by(|a, b| a.id.cmp(&b.id));
        desks
    }

    pub fn desks(&self) -> impl Iterator<Item = &Desk> {
        self.desks.values()
    }

    pub fn time_slot(&self, id: &str) -> Option<&TimeSlot> {
        self.time_slots.get(id)
    }

    /// Time slots in seed order.
    pub fn time_slots(&self) -> Vec<&TimeSlot> {
        self.time_slot_order
            .iter()
            .filter_map(|id| self.time_slots.get(id))
            .collect()
    }

    /// None when either the desk or the time slot does not exist, which
    /// is how the coordinator's "slot must exist" precondition is
    /// checked before any hold is attempted.
    pub fn slot_meta(&self, desk_id: &str, time_slot_id: &str) -> Option<SlotMeta> {
        let desk = self.desks.get(desk_id)?;
        let slot = self.time_slots.get(time_slot_id)?;
        let location = self.locations.get(&desk.location_id)?;
        Some(SlotMeta {
            desk_name: desk.name.clone(),
            location_name: location.name.clone(),
            time_slot_label: slot.label.clone(),
            time_slot_window: slot.window(),
            price_cents: slot.price_cents,
            rating: desk.rating,
        })
    }
}
