use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use covoit_api::{app, AppState, AuthConfig};
use covoit_booking::BookingService;
use covoit_catalog::RideCatalog;
use covoit_core::repository::{ReservationRepository, RideRepository};
use covoit_store::app_config::{Config, StorageBackend};
use covoit_store::{DbClient, InMemoryStore, PgReservationRepository, PgRideRepository, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "covoit_api=debug,covoit_catalog=debug,covoit_booking=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Covoit API on port {}", config.server.port);

    let (rides, reservations) = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = DbClient::new(&config.database.url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            let rides: Arc<dyn RideRepository> = Arc::new(PgRideRepository::new(db.pool.clone()));
            let reservations: Arc<dyn ReservationRepository> =
                Arc::new(PgReservationRepository::new(db.pool));
            (rides, reservations)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            let store = InMemoryStore::new();
            let rides: Arc<dyn RideRepository> = Arc::new(store.clone());
            let reservations: Arc<dyn ReservationRepository> = Arc::new(store);
            (rides, reservations)
        }
    };

    let rules = config.business_rules.clone();
    let redis = match &config.redis.url {
        Some(url) => Some(Arc::new(
            RedisClient::new(url, rules.availability_cache_seconds)
                .await
                .context("Failed to connect to Redis")?,
        )),
        None => None,
    };

    let catalog = RideCatalog::new(rides.clone(), reservations.clone(), rules.search_limit);
    let mut booking = BookingService::new(rides, reservations);
    if let Some(redis) = &redis {
        if rules.availability_cache_seconds > 0 {
            booking = booking.with_usage_cache(redis.clone());
        }
    }

    let state = AppState {
        catalog: Arc::new(catalog),
        booking: Arc::new(booking),
        redis,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            max_age_seconds: config.auth.jwt_expiration_seconds,
        },
        business_rules: rules,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
