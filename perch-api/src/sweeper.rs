use chrono::Utc;
use perch_core::ReservationCoordinator;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};

/// Periodic reclaim of abandoned holds. Correctness never depends on
/// this loop (holds are also reclaimed lazily on read), but it keeps
/// slots from sitting in stale held state when nobody is looking at
/// them. Interval should be well under the hold TTL.
pub async fn run(coordinator: Arc<ReservationCoordinator>, interval: Duration) {
    info!(interval_secs = interval.as_secs(), "expiry sweeper started");

    loop {
        sleep(interval).await;
        match coordinator.expire_sweep(Utc::now()).await {
            Ok(0) => {}
            Ok(reclaimed) => info!(reclaimed, "sweep pass reclaimed stale holds"),
            Err(e) => error!("Sweep pass failed: {}", e),
        }
    }
}
