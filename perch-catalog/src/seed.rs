use crate::catalog::Catalog;
use crate::model::{Desk, Location, TimeSlot};
use chrono::{Duration, NaiveDate};
use perch_core::{SlotKey, SlotStore, StoreError, VersionedSlot};
use tracing::info;

const DESKS_PER_LOCATION: u32 = 20;
const SEAT_TYPES: [&str; 3] = ["Hot Desk", "Private Office", "Meeting Room"];

/// The fixed demo inventory: three locations, three daily time slots,
/// twenty desks per location.
pub fn catalog() -> Catalog {
    let locations = vec![
        Location {
            id: "loc1".into(),
            name: "Downtown Innovation Hub".into(),
            address: "123 Business District, Downtown".into(),
            description: "Premium workspace in the heart of the financial district".into(),
        },
        Location {
            id: "loc2".into(),
            name: "Creative Co-Space".into(),
            address: "456 Arts Quarter, Midtown".into(),
            description: "Inspiring environment for creative professionals".into(),
        },
        Location {
            id: "loc3".into(),
            name: "Tech Innovation Center".into(),
            address: "789 Silicon Valley, Tech District".into(),
            description: "State-of-the-art facility for tech companies".into(),
        },
    ];

    let time_slots = vec![
        TimeSlot {
            id: "ts1".into(),
            start_time: "09:00".into(),
            end_time: "13:00".into(),
            label: "Morning (9AM - 1PM)".into(),
            price_cents: 2400,
        },
        TimeSlot {
            id: "ts2".into(),
            start_time: "13:00".into(),
            end_time: "17:00".into(),
            label: "Afternoon (1PM - 5PM)".into(),
            price_cents: 2400,
        },
        TimeSlot {
            id: "ts3".into(),
            start_time: "17:00".into(),
            end_time: "21:00".into(),
            label: "Evening (5PM - 9PM)".into(),
            price_cents: 1800,
        },
    ];

    let mut desks = Vec::new();
    for location in &locations {
        for i in 1..=DESKS_PER_LOCATION {
            let seat_type = SEAT_TYPES[((i - 1) % 3) as usize];
            desks.push(Desk {
                id: format!("{}-desk{}", location.id, i),
                location_id: location.id.clone(),
                name: format!("Desk {}", i),
                floor: format!("Floor {}", (i - 1) / 10 + 1),
                seat_type: seat_type.into(),
                rating: 3.5 + f64::from((i - 1) % 4) * 0.4,
            });
        }
    }

    Catalog::new(locations, desks, time_slots)
}

/// Load one available slot per desk x date x time-slot into the store.
/// Insert-if-absent per key, so re-running at startup never clobbers
/// live holds or bookings already in the store; returns how many slots
/// were newly created.
pub async fn seed_slots(
    store: &dyn SlotStore,
    catalog: &Catalog,
    start: NaiveDate,
    days: u32,
) -> Result<usize, StoreError> {
    let mut seeded = 0;
    for offset in 0..days {
        let date = start + Duration::days(i64::from(offset));
        for desk in catalog.desks() {
            for slot in catalog.time_slots() {
                let key = SlotKey::new(desk.id.clone(), date, slot.id.clone());
                if store.insert_slot(key, VersionedSlot::available()).await? {
                    seeded += 1;
                }
            }
        }
    }
    info!(seeded, days, "slot inventory seeded");
    Ok(seeded)
}
