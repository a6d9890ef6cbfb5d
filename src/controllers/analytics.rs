//! analytics.rs
//!
//! Seat occupancy per showtime: total, booked, available and the booked
//! percentage. Reads committed state without locking, so numbers may lag a
//! reservation that is still in flight.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;

use super::store_error;
use crate::models::ShowtimeOccupancy;
use crate::AppState;

/// Определяет маршруты, связанные с аналитикой.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/analytics", get(get_analytics))
}

#[derive(Debug, Serialize)]
struct AnalyticsRow {
    showtime_id: i64,
    start_time: NaiveDateTime,
    movie_title: String,
    total_seats: i64,
    booked: i64,
    available: i64,
    occupancy_rate: f64,
}

impl From<ShowtimeOccupancy> for AnalyticsRow {
    fn from(o: ShowtimeOccupancy) -> Self {
        AnalyticsRow {
            available: o.available(),
            occupancy_rate: o.occupancy_rate(),
            showtime_id: o.showtime_id,
            start_time: o.start_time,
            movie_title: o.movie_title,
            total_seats: o.total_seats,
            booked: o.booked,
        }
    }
}

// GET /api/analytics
async fn get_analytics(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let rows = state
        .store
        .occupancy()
        .await
        .map_err(|e| store_error("get_analytics", e))?;

    let total_booked: i64 = rows.iter().map(|r| r.booked).sum();
    tracing::info!("Analytics: {} showtimes, {} seats booked", rows.len(), total_booked);

    let payload: Vec<AnalyticsRow> = rows.into_iter().map(AnalyticsRow::from).collect();
    Ok((StatusCode::OK, Json(payload)))
}
