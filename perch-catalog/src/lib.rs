pub mod catalog;
pub mod model;
pub mod seed;

pub use catalog::Catalog;
pub use model::{Desk, Location, SlotMeta, TimeSlot};
