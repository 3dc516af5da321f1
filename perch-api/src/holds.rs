use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{delete, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use perch_core::{ReleaseOutcome, SlotKey};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{reservation_error, AppError};
use crate::state::AppState;

pub const HOLDER_TOKEN_HEADER: &str = "x-holder-token";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HoldRequest {
    desk_id: String,
    time_slot_id: String,
    date: NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HoldResponse {
    hold_id: Uuid,
    holder_token: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseResponse {
    ok: bool,
    released: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookRequest {
    hold_id: Uuid,
    holder_token: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookResponse {
    booking_id: Uuid,
    ticket_ref: String,
    desk_name: String,
    location_name: String,
    date: NaiveDate,
    time_slot: String,
    price_cents: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/desks/hold", post(hold_desk))
        .route("/api/desks/hold/{hold_id}", delete(release_hold))
        .route("/api/desks/book", post(book_desk))
}

async fn hold_desk(
    State(state): State<AppState>,
    Json(req): Json<HoldRequest>,
) -> Result<Json<HoldResponse>, AppError> {
    // Existence check against the catalog before touching slot state.
    if state.catalog.slot_meta(&req.desk_id, &req.time_slot_id).is_none() {
        return Err(AppError::NotFoundError(format!(
            "Unknown desk or time slot: {}/{}",
            req.desk_id, req.time_slot_id
        )));
    }

    let key = SlotKey::new(req.desk_id, req.date, req.time_slot_id);
    let hold = state
        .coordinator
        .try_hold(&key, Utc::now())
        .await
        .map_err(reservation_error)?;

    Ok(Json(HoldResponse {
        hold_id: hold.id,
        holder_token: hold.holder_token,
        expires_at: hold.expires_at,
    }))
}

async fn release_hold(
    State(state): State<AppState>,
    Path(hold_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<ReleaseResponse>, AppError> {
    let holder_token = holder_token(&headers)?;

    let outcome = state
        .coordinator
        .release(hold_id, holder_token)
        .await
        .map_err(reservation_error)?;

    // A missing hold releases as a no-op success: the caller's goal
    // (the hold no longer blocks the slot) is already met.
    Ok(Json(ReleaseResponse {
        ok: true,
        released: outcome == ReleaseOutcome::Released,
    }))
}

async fn book_desk(
    State(state): State<AppState>,
    Json(req): Json<BookRequest>,
) -> Result<Json<BookResponse>, AppError> {
    // Snapshot the slot key for the response body; confirm consumes the hold.
    let held = state
        .store
        .find_hold(req.hold_id)
        .await
        .map_err(|e| AppError::ServiceUnavailableError(e.to_string()))?;
    let Some((key, _)) = held else {
        return Err(AppError::NotFoundError("Hold not found or already used".to_string()));
    };

    let booking = state
        .coordinator
        .confirm(req.hold_id, req.holder_token, Utc::now())
        .await
        .map_err(reservation_error)?;

    let meta = state
        .catalog
        .slot_meta(&key.desk_id, &key.time_slot_id)
        .ok_or_else(|| {
            AppError::InternalServerError(format!("Booked slot missing from catalog: {}", key))
        })?;

    info!(booking_id = %booking.id, slot = %key, "booking issued");

    Ok(Json(BookResponse {
        booking_id: booking.id,
        ticket_ref: booking.ticket_ref,
        desk_name: meta.desk_name,
        location_name: meta.location_name,
        date: key.date,
        time_slot: meta.time_slot_window,
        price_cents: meta.price_cents,
    }))
}

fn holder_token(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let raw = headers
        .get(HOLDER_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::ValidationError(format!("Missing {} header", HOLDER_TOKEN_HEADER))
        })?;
    raw.parse()
        .map_err(|_| AppError::ValidationError(format!("Invalid {} header", HOLDER_TOKEN_HEADER)))
}
