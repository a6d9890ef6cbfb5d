use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::cache::{CacheService, SEATS_TTL_SECS};
use crate::models::Seat;
use crate::store::StoreError;

fn generation_key(showtime_id: i64) -> String {
    format!("seats:{}:generation", showtime_id)
}

fn seats_key(showtime_id: i64, generation: u64) -> String {
    format!("seats:{}:v{}", showtime_id, generation)
}

impl CacheService {
    /// Seat map of a showtime, ordered by row and number.
    pub async fn get_seats(&self, showtime_id: i64) -> Result<Vec<Seat>, StoreError> {
        // The generation is read before the store: a booking that commits
        // while we load bumps it, and our copy lands under a dead key.
        let Some(generation) = self.seats_generation(showtime_id).await else {
            return self.store.list_seats(showtime_id).await;
        };
        let key = seats_key(showtime_id, generation);
        if let Some(seats) = self.get_json::<Vec<Seat>>(&key).await {
            return Ok(seats);
        }

        let seats = self.store.list_seats(showtime_id).await?;
        if !seats.is_empty() {
            self.set_json(&key, &seats, SEATS_TTL_SECS).await;
        }
        Ok(seats)
    }

    // Инвалидировать кеш мест
    pub async fn invalidate_seats(&self, showtime_id: i64) {
        let Some(redis) = self.redis.as_ref() else {
            return;
        };
        let mut conn = redis.conn.clone();
        let bumped: redis::RedisResult<u64> = conn.incr(generation_key(showtime_id), 1u64).await;
        match bumped {
            Ok(generation) => {
                self.delete(&seats_key(showtime_id, generation.saturating_sub(1)))
                    .await;
                debug!(
                    "Invalidated seats cache for showtime {} (generation {})",
                    showtime_id, generation
                );
            }
            Err(e) => warn!("Redis INCR for showtime {} failed: {}", showtime_id, e),
        }
    }

    /// `None` when the cache is off or Redis cannot answer; callers then skip
    /// the cache altogether.
    async fn seats_generation(&self, showtime_id: i64) -> Option<u64> {
        let redis = self.redis.as_ref()?;
        let mut conn = redis.conn.clone();
        let generation: redis::RedisResult<Option<u64>> = conn.get(generation_key(showtime_id)).await;
        match generation {
            Ok(generation) => Some(generation.unwrap_or(0)),
            Err(e) => {
                warn!("Redis GET seats generation {} failed: {}", showtime_id, e);
                None
            }
        }
    }
}
