use crate::store::StoreError;

/// Every rejection the coordinator can hand back. All of these are
/// recoverable by the caller; `StorageUnavailable` is the only one
/// that is safe to retry without a fresh search.
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("slot is already held or booked")]
    AlreadyTaken,

    #[error("no such slot: {0}")]
    SlotNotFound(String),

    #[error("hold not found or already consumed")]
    HoldNotFound,

    #[error("hold has expired")]
    HoldExpired,

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),
}
