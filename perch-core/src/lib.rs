pub mod coordinator;
pub mod error;
pub mod slot;
pub mod store;

pub use coordinator::{ReleaseOutcome, ReservationCoordinator};
pub use error::ReservationError;
pub use slot::{Booking, Hold, SlotKey, SlotState, VersionedSlot};
pub use store::{SlotStore, StoreError};
