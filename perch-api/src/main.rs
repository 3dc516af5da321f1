use chrono::Utc;
use perch_api::{app, AppState};
use perch_core::{ReservationCoordinator, SlotStore};
use perch_store::{MemorySlotStore, RedisSlotStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "perch_api=debug,perch_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = perch_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Perch API on port {}", config.server.port);

    let store: Arc<dyn SlotStore> = match config.store.backend.as_str() {
        "redis" => {
            let redis = RedisSlotStore::new(&config.store.redis_url)
                .await
                .expect("Failed to connect to Redis");
            tracing::info!("Using Redis slot store at {}", config.store.redis_url);
            Arc::new(redis)
        }
        _ => {
            tracing::info!("Using in-process slot store");
            Arc::new(MemorySlotStore::new())
        }
    };

    let catalog = Arc::new(perch_catalog::seed::catalog());
    perch_catalog::seed::seed_slots(
        store.as_ref(),
        &catalog,
        Utc::now().date_naive(),
        config.seed.days,
    )
    .await
    .expect("Failed to seed slot inventory");

    let hold_ttl_seconds =
        i64::try_from(config.hold_rules.hold_ttl_seconds).expect("hold_ttl_seconds out of range");
    let coordinator = Arc::new(ReservationCoordinator::new(
        store.clone(),
        chrono::Duration::seconds(hold_ttl_seconds),
    ));

    tokio::spawn(perch_api::sweeper::run(
        coordinator.clone(),
        std::time::Duration::from_secs(config.hold_rules.sweep_interval_seconds),
    ));

    let app_state = AppState {
        coordinator,
        store,
        catalog,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
