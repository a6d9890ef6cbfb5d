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
use crate::models::{Movie, Seat, Showtime};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/showtimes/{id}/seats", get(get_seat_map))
}

#[derive(Debug, Serialize)]
struct SeatView {
    id: i64,
    seat_number: i32,
    booked: bool,
}

#[derive(Debug, Serialize)]
struct SeatRow {
    row_label: String,
    seats: Vec<SeatView>,
}

#[derive(Debug, Serialize)]
struct SeatMapResponse {
    showtime: Showtime,
    movie: Option<Movie>,
    rows: Vec<SeatRow>,
}

/// Groups seats already ordered by (row, number) into rows.
fn group_by_row(seats: Vec<Seat>) -> Vec<SeatRow> {
    let mut rows: Vec<SeatRow> = Vec::new();
    for seat in seats {
        let view = SeatView {
            id: seat.id,
            seat_number: seat.seat_number,
            booked: seat.booked,
        };
        match rows.last_mut() {
            Some(row) if row.row_label == seat.row_label => {
                row.seats.push(view);
                continue;
            }
            _ => {}
        }
        rows.push(SeatRow {
            row_label: seat.row_label,
            seats: vec![view],
        });
    }
    rows
}

// GET /api/showtimes/{id}/seats
async fn get_seat_map(
    State(state): State<Arc<AppState>>,
    Path(showtime_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let showtime = state
        .store
        .find_showtime(showtime_id)
        .await
        .map_err(|e| store_error("get_seat_map", e))?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Showtime not found".to_string()))?;

    let movie = state
        .store
        .find_movie(showtime.movie_id)
        .await
        .map_err(|e| store_error("get_seat_map", e))?;

    let seats = state
        .cache
        .get_seats(showtime_id)
        .await
        .map_err(|e| store_error("get_seat_map", e))?;

    Ok((
        StatusCode::OK,
        Json(SeatMapResponse {
            showtime,
            movie,
            rows: group_by_row(seats),
        }),
    ))
}
