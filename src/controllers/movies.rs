use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::store_error;
use crate::models::{Movie, Showtime};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/{id}", get(get_movie))
}

// GET /api/movies
async fn list_movies(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let movies = state
        .cache
        .get_movies()
        .await
        .map_err(|e| store_error("list_movies", e))?;

    Ok((StatusCode::OK, Json(movies)))
}

// GET /api/movies/{id}
#[derive(Debug, Serialize)]
struct MovieDetailResponse {
    movie: Movie,
    showtimes: Vec<Showtime>,
}

async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let movie = state
        .store
        .find_movie(movie_id)
        .await
        .map_err(|e| store_error("get_movie", e))?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Movie not found".to_string()))?;

    let showtimes = state
        .store
        .list_showtimes(movie_id)
        .await
        .map_err(|e| store_error("get_movie", e))?;

    Ok((StatusCode::OK, Json(MovieDetailResponse { movie, showtimes })))
}
