use chrono::NaiveDateTime;
use serde::Serialize;

/// Seat counts for one showtime, as read from committed state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowtimeOccupancy {
    pub showtime_id: i64,
    pub start_time: NaiveDateTime,
    pub movie_title: String,
    pub total_seats: i64,
    pub booked: i64,
}

impl ShowtimeOccupancy {
    pub fn available(&self) -> i64 {
        self.total_seats - self.booked
    }

    /// Percentage of booked seats, rounded to two decimals. Zero seats gives 0.0.
    pub fn occupancy_rate(&self) -> f64 {
        if self.total_seats <= 0 {
            return 0.0;
        }
        let rate = self.booked as f64 / self.total_seats as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }
}
