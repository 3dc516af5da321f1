use perch_catalog::Catalog;
use perch_core::{ReservationCoordinator, SlotStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ReservationCoordinator>,
    pub store: Arc<dyn SlotStore>,
    pub catalog: Arc<Catalog>,
}
