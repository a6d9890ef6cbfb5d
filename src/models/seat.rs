use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A bookable seat of one showtime. `booked` only ever goes from false to true.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub showtime_id: i64,
    pub row_label: String,
    pub seat_number: i32,
    pub booked: bool,
}

/// Locked view of a seat inside a reservation transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct SeatState {
    pub id: i64,
    pub booked: bool,
}
