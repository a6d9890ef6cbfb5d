use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row per booked seat. Rows created by the same reservation share
/// `confirmation_code`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub showtime_id: i64,
    pub seat_id: i64,
    pub customer_name: String,
    pub confirmation_code: String,
}

// Строка для страницы подтверждения: бронь + место + сеанс + фильм
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct BookingDetail {
    pub confirmation_code: String,
    pub customer_name: String,
    pub seat_id: i64,
    pub row_label: String,
    pub seat_number: i32,
    pub showtime_id: i64,
    pub start_time: NaiveDateTime,
    pub screen_name: Option<String>,
    pub movie_title: String,
}
