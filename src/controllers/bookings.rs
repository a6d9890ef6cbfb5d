use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;

use super::store_error;
use crate::models::BookingDetail;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/bookings/{code}", get(get_booking))
}

#[derive(Debug, Serialize)]
struct BookedSeat {
    seat_id: i64,
    row_label: String,
    seat_number: i32,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    confirmation_code: String,
    customer_name: String,
    movie_title: String,
    showtime_id: i64,
    start_time: NaiveDateTime,
    screen_name: Option<String>,
    seats: Vec<BookedSeat>,
}

// All rows of a confirmation share customer and showtime, the header comes from the first one.
fn to_response(rows: Vec<BookingDetail>) -> Option<BookingResponse> {
    let header = rows.first()?.clone();
    Some(BookingResponse {
        confirmation_code: header.confirmation_code,
        customer_name: header.customer_name,
        movie_title: header.movie_title,
        showtime_id: header.showtime_id,
        start_time: header.start_time,
        screen_name: header.screen_name,
        seats: rows
            .into_iter()
            .map(|r| BookedSeat {
                seat_id: r.seat_id,
                row_label: r.row_label,
                seat_number: r.seat_number,
            })
            .collect(),
    })
}

// GET /api/bookings/{code}
async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let rows = state
        .store
        .bookings_by_code(code.trim())
        .await
        .map_err(|e| store_error("get_booking", e))?;

    let response = to_response(rows)
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Booking not found".to_string()))?;

    Ok((StatusCode::OK, Json(response)))
}
