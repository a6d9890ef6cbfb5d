//! Read-through Redis cache for the catalog views.
//!
//! Cached data may be stale for a moment after a reservation. Seat maps are
//! keyed by a per-showtime generation that every successful booking bumps, so
//! a map read before the booking can never be served after it. Reservations
//! themselves never read from the cache.

use std::sync::Arc;

use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{info, warn};

use crate::redis_client::RedisClient;
use crate::store::CatalogStore;

pub mod movies;
pub mod seats;

pub const MOVIES_TTL_SECS: u64 = 3600;
// Bounds how long entries of superseded seat map generations linger.
pub const SEATS_TTL_SECS: u64 = 300;

#[derive(Clone)]
pub struct CacheService {
    redis: Option<RedisClient>,
    store: Arc<dyn CatalogStore>,
}

impl CacheService {
    /// Without a Redis client every read goes to the store.
    pub fn new(redis: Option<RedisClient>, store: Arc<dyn CatalogStore>) -> Self {
        Self { redis, store }
    }

    pub fn is_enabled(&self) -> bool {
        self.redis.is_some()
    }

    // Прогрев кеша при старте
    pub async fn warmup_cache(&self) {
        if !self.is_enabled() {
            return;
        }
        info!("Starting cache warmup...");

        match self.get_movies().await {
            Ok(movies) => info!("Loaded {} movies", movies.len()),
            Err(e) => warn!("Cache warmup failed for movies: {}", e),
        }

        info!("Cache warmup done");
    }

    // === Работа с кешем ===
    // Redis errors are logged and treated as a miss.

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let redis = self.redis.as_ref()?;
        let mut conn = redis.conn.clone();
        let data: Option<String> = match conn.get(key).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Redis GET {} failed: {}", key, e);
                return None;
            }
        };
        let data = data?;
        match serde_json::from_str(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Dropping unreadable cache entry {}: {}", key, e);
                self.delete(key).await;
                None
            }
        }
    }

    async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_secs: u64) {
        let Some(redis) = self.redis.as_ref() else {
            return;
        };
        let data = match serde_json::to_string(value) {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };
        let mut conn = redis.conn.clone();
        let result: Result<(), _> = conn.set_ex(key, data, ttl_secs).await;
        if let Err(e) = result {
            warn!("Redis SET {} failed: {}", key, e);
        }
    }

    async fn delete(&self, key: &str) {
        let Some(redis) = self.redis.as_ref() else {
            return;
        };
        let mut conn = redis.conn.clone();
        let result: Result<(), _> = conn.del(key).await;
        if let Err(e) = result {
            warn!("Redis DEL {} failed: {}", key, e);
        }
    }
}
