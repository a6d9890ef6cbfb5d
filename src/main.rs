use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use mimalloc::MiMalloc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movie_booking::{
    app,
    config::Config,
    database::Database,
    redis_client::RedisClient,
    seed::seed_demo_catalog,
    store::PgCatalogStore,
    AppState,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Movie Booking API ({})", config.app.environment);

    // Connect to the database
    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected");

    db.run_migrations()
        .await
        .context("Failed to run migrations")?;

    let store = PgCatalogStore::new(db.pool.clone());

    if config.app.seed_demo_data {
        let summary = seed_demo_catalog(&store)
            .await
            .context("Failed to seed demo catalog")?;
        info!("Seed summary: {:?}", summary);
    }

    // Redis is optional, the service keeps working without the cache
    let redis = match config.redis.url.as_deref() {
        Some(url) => match RedisClient::new(url).await {
            Ok(client) => {
                info!("Redis connected");
                Some(client)
            }
            Err(e) => {
                warn!("Redis unavailable, running without cache: {}", e);
                None
            }
        },
        None => None,
    };

    let app_state = AppState::new(Arc::new(store), redis, config.clone());
    app_state.cache.warmup_cache().await;

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port)
        .parse()
        .context("HOST/PORT do not form a socket address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;
    axum::serve(listener, app(app_state).into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
