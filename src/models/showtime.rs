use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Showtime {
    pub id: i64,
    pub movie_id: i64,
    pub start_time: NaiveDateTime,
    pub screen_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewShowtime {
    pub movie_id: i64,
    pub start_time: NaiveDateTime,
    pub screen_name: String,
}
