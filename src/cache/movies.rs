use crate::cache::{CacheService, MOVIES_TTL_SECS};
use crate::models::Movie;
use crate::store::StoreError;

const MOVIES_KEY: &str = "movies";

impl CacheService {
    // Получить фильмы: сначала кеш, потом БД
    pub async fn get_movies(&self) -> Result<Vec<Movie>, StoreError> {
        if let Some(movies) = self.get_json::<Vec<Movie>>(MOVIES_KEY).await {
            return Ok(movies);
        }

        let movies = self.store.list_movies().await?;
        self.set_json(MOVIES_KEY, &movies, MOVIES_TTL_SECS).await;
        Ok(movies)
    }
}
