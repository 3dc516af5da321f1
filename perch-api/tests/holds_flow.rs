use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use perch_api::{app, AppState};
use perch_core::{
    Booking, ReservationCoordinator, SlotKey, SlotState, SlotStore, StoreError, VersionedSlot,
};
use perch_store::MemorySlotStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const DATE: &str = "2025-06-14";

async fn test_app(ttl_seconds: i64) -> Router {
    let store = Arc::new(MemorySlotStore::new());
    let catalog = Arc::new(perch_catalog::seed::catalog());
    let start: NaiveDate = DATE.parse().unwrap();
    perch_catalog::seed::seed_slots(store.as_ref(), &catalog, start, 1)
        .await
        .unwrap();

    let coordinator = Arc::new(ReservationCoordinator::new(
        store.clone(),
        Duration::seconds(ttl_seconds),
    ));

    app(AppState {
        coordinator,
        store,
        catalog,
    })
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read_json(response).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_json(response).await
}

async fn delete_with_token(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .header("x-holder-token", token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    read_json(response).await
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn hold_body(desk: &str, slot: &str) -> Value {
    json!({ "deskId": desk, "timeSlotId": slot, "date": DATE })
}

#[tokio::test]
async fn hold_then_book_happy_path() {
    let app = test_app(60).await;

    let (status, hold) = post_json(&app, "/api/desks/hold", hold_body("loc1-desk1", "ts1")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(hold["holdId"].is_string());
    assert!(hold["expiresAt"].is_string());

    let (status, booking) = post_json(
        &app,
        "/api/desks/book",
        json!({ "holdId": hold["holdId"], "holderToken": hold["holderToken"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(booking["ticketRef"].as_str().unwrap().starts_with("PRCH-"));
    assert_eq!(booking["deskName"], "Desk 1");
    assert_eq!(booking["locationName"], "Downtown Innovation Hub");
    assert_eq!(booking["timeSlot"], "09:00 - 13:00");
    assert_eq!(booking["priceCents"], 2400);

    // The hold was consumed by the booking.
    let (status, body) = post_json(
        &app,
        "/api/desks/book",
        json!({ "holdId": hold["holdId"], "holderToken": hold["holderToken"] }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn second_hold_conflicts() {
    let app = test_app(60).await;

    let (status, _) = post_json(&app, "/api/desks/hold", hold_body("loc1-desk1", "ts1")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(&app, "/api/desks/hold", hold_body("loc1-desk1", "ts1")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "This seat was just taken");

    // Sibling slot on the same desk is unaffected.
    let (status, _) = post_json(&app, "/api/desks/hold", hold_body("loc1-desk1", "ts2")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn release_is_idempotent() {
    let app = test_app(60).await;

    let (_, hold) = post_json(&app, "/api/desks/hold", hold_body("loc1-desk1", "ts1")).await;
    let uri = format!("/api/desks/hold/{}", hold["holdId"].as_str().unwrap());
    let token = hold["holderToken"].as_str().unwrap();

    let (status, body) = delete_with_token(&app, &uri, token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "released": true }));

    let (status, body) = delete_with_token(&app, &uri, token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "released": false }));

    // The slot is takeable again.
    let (status, _) = post_json(&app, "/api/desks/hold", hold_body("loc1-desk1", "ts1")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn release_requires_the_token_header() {
    let app = test_app(60).await;

    let (_, hold) = post_json(&app, "/api/desks/hold", hold_body("loc1-desk1", "ts1")).await;
    let uri = format!("/api/desks/hold/{}", hold["holdId"].as_str().unwrap());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(uri.as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Wrong token: idempotent not-found, slot stays held.
    let (status, body) =
        delete_with_token(&app, &uri, "00000000-0000-0000-0000-000000000000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["released"], false);
    let (status, _) = post_json(&app, "/api/desks/hold", hold_body("loc1-desk1", "ts1")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn expired_hold_cannot_book_but_slot_recovers() {
    // TTL of zero: the hold is expired the moment it is read back.
    let app = test_app(0).await;

    let (status, hold) = post_json(&app, "/api/desks/hold", hold_body("loc2-desk3", "ts2")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(
        &app,
        "/api/desks/book",
        json!({ "holdId": hold["holdId"], "holderToken": hold["holderToken"] }),
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], "Your hold expired, please select again");

    // The failed confirm reclaimed the slot for the next taker.
    let (status, _) = post_json(&app, "/api/desks/hold", hold_body("loc2-desk3", "ts2")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_desk_or_slot_is_not_found() {
    let app = test_app(60).await;

    let (status, _) = post_json(&app, "/api/desks/hold", hold_body("loc9-desk1", "ts1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post_json(&app, "/api/desks/hold", hold_body("loc1-desk1", "ts9")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn availability_reflects_holds_and_expiry() {
    let app = test_app(0).await;
    let uri = format!("/api/desks/loc1-desk1/availability?date={}", DATE);

    let (status, rows) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().unwrap().clone();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r["status"] == "available"));

    // With a zero TTL the hold is already expired on the next read, so
    // the listing reports the slot available again without any release.
    let (_, _hold) = post_json(&app, "/api/desks/hold", hold_body("loc1-desk1", "ts1")).await;
    let (_, rows) = get(&app, &uri).await;
    assert!(rows.as_array().unwrap().iter().all(|r| r["status"] == "available"));
}

#[tokio::test]
async fn availability_shows_live_holds_and_bookings() {
    let app = test_app(600).await;
    let uri = format!("/api/desks/loc1-desk2/availability?date={}", DATE);

    let (_, hold) = post_json(&app, "/api/desks/hold", hold_body("loc1-desk2", "ts1")).await;
    let (_, rows) = get(&app, &uri).await;
    let rows = rows.as_array().unwrap().clone();
    assert_eq!(rows[0]["status"], "held");
    assert_eq!(rows[1]["status"], "available");

    post_json(
        &app,
        "/api/desks/book",
        json!({ "holdId": hold["holdId"], "holderToken": hold["holderToken"] }),
    )
    .await;
    let (_, rows) = get(&app, &uri).await;
    assert_eq!(rows.as_array().unwrap()[0]["status"], "booked");
}

#[tokio::test]
async fn availability_requires_a_date() {
    let app = test_app(60).await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/desks/loc1-desk1/availability")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Store whose backend is down, for checking the outage mapping end
/// to end.
struct UnreachableStore;

#[async_trait]
impl SlotStore for UnreachableStore {
    async fn load(&self, _key: &SlotKey) -> Result<Option<VersionedSlot>, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    async fn compare_and_swap(
        &self,
        _key: &SlotKey,
        _expected_version: u64,
        _next: SlotState,
    ) -> Result<bool, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    async fn find_hold(&self, _hold_id: Uuid) -> Result<Option<(SlotKey, VersionedSlot)>, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    async fn insert_booking(&self, _booking: Booking) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    async fn get_booking(&self, _booking_id: Uuid) -> Result<Option<Booking>, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    async fn expired_holds(&self, _now: DateTime<Utc>) -> Result<Vec<SlotKey>, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    async fn insert_slot(&self, _key: SlotKey, _slot: VersionedSlot) -> Result<bool, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }
}

#[tokio::test]
async fn storage_outage_maps_to_service_unavailable() {
    let store: Arc<dyn SlotStore> = Arc::new(UnreachableStore);
    let coordinator = Arc::new(ReservationCoordinator::new(
        store.clone(),
        Duration::seconds(60),
    ));
    let app = app(AppState {
        coordinator,
        store,
        catalog: Arc::new(perch_catalog::seed::catalog()),
    });

    // Hold: the catalog check passes, the store read does not.
    let (status, body) = post_json(&app, "/api/desks/hold", hold_body("loc1-desk1", "ts1")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));

    let (status, body) = post_json(
        &app,
        "/api/desks/book",
        json!({ "holdId": Uuid::new_v4(), "holderToken": Uuid::new_v4() }),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());

    let (status, _) =
        delete_with_token(&app, &format!("/api/desks/hold/{}", Uuid::new_v4()), &Uuid::new_v4().to_string()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let uri = format!("/api/desks/loc1-desk1/availability?date={}", DATE);
    let (status, _) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn catalog_listings_serve_the_seeded_inventory() {
    let app = test_app(60).await;

    let (status, locations) = get(&app, "/api/locations").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(locations.as_array().unwrap().len(), 3);

    let (status, desks) = get(&app, "/api/desks/location/loc1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(desks.as_array().unwrap().len(), 20);

    let (status, _) = get(&app, "/api/desks/location/loc9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, slots) = get(&app, "/api/time-slots").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(slots.as_array().unwrap().len(), 3);
}
