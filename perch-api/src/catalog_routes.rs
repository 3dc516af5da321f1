use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use perch_core::SlotKey;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/locations", get(list_locations))
        .route("/api/desks/location/{location_id}", get(list_desks))
        .route("/api/time-slots", get(list_time_slots))
        .route("/api/desks/{desk_id}/availability", get(desk_availability))
}

async fn list_locations(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.catalog.locations()))
}

async fn list_desks(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if state.catalog.location(&location_id).is_none() {
        return Err(AppError::NotFoundError(format!("Unknown location: {}", location_id)));
    }
    Ok(Json(json!(state.catalog.desks_in(&location_id))))
}

async fn list_time_slots(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.catalog.time_slots()))
}

#[derive(Debug, Deserialize)]
struct AvailabilityParams {
    date: NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SlotAvailability {
    time_slot_id: String,
    label: String,
    window: String,
    price_cents: i64,
    status: &'static str,
}

/// Availability for one desk on one date, one row per time slot. A
/// held slot whose hold has already expired is reported available;
/// the reclaim itself happens on the next hold attempt or sweep.
async fn desk_availability(
    State(state): State<AppState>,
    Path(desk_id): Path<String>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<Vec<SlotAvailability>>, AppError> {
    if state.catalog.desk(&desk_id).is_none() {
        return Err(AppError::NotFoundError(format!("Unknown desk: {}", desk_id)));
    }

    let now = Utc::now();
    let mut rows = Vec::new();
    for slot in state.catalog.time_slots() {
        let key = SlotKey::new(desk_id.clone(), params.date, slot.id.clone());
        let status = match state
            .store
            .load(&key)
            .await
            .map_err(|e| AppError::ServiceUnavailableError(e.to_string()))?
        {
            Some(stored) => stored.state.effective_label(now),
            // Not seeded for this date.
            None => "unavailable",
        };
        rows.push(SlotAvailability {
            time_slot_id: slot.id.clone(),
            label: slot.label.clone(),
            window: slot.window(),
            price_cents: slot.price_cents,
            status,
        });
    }

    Ok(Json(rows))
}
