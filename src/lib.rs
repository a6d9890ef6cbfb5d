pub mod config;
pub mod database;
pub mod redis_client;
pub mod models;
pub mod store;
pub mod confirmation;
pub mod reservation;
pub mod cache;
pub mod controllers;
pub mod seed;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use confirmation::RandomCodeGenerator;
use reservation::ReservationEngine;
use store::CatalogStore;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub engine: ReservationEngine,
    pub cache: cache::CacheService,
    pub config: config::Config,
}

impl AppState {
    /// Wires the engine and the cache around one store handle.
    pub fn new(
        store: Arc<dyn CatalogStore>,
        redis: Option<redis_client::RedisClient>,
        config: config::Config,
    ) -> Arc<Self> {
        let codes = Arc::new(RandomCodeGenerator::new(
            config.reservation.confirmation_code_length,
        ));
        let engine = ReservationEngine::new(store.clone(), codes)
            .with_timeout(config.reservation.timeout());
        let cache = cache::CacheService::new(redis, store.clone());

        Arc::new(Self {
            store,
            engine,
            cache,
            config,
        })
    }
}

/// Full HTTP application: banner, health check and the `/api` routes.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Movie Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
