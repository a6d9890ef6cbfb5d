//! Catalog store: persistent movies, showtimes, seats and bookings.
//!
//! The reservation engine talks to storage only through [`SeatTransaction`].
//! Everything else on [`CatalogStore`] is a read of committed state used by
//! the listing, seat map, confirmation and analytics views.

pub mod memory;
pub mod postgres;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    BookingDetail, Movie, NewMovie, NewShowtime, Seat, SeatState, Showtime, ShowtimeOccupancy,
};

pub use memory::InMemoryCatalogStore;
pub use postgres::PgCatalogStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage cannot be reached (connect failure, pool timeout, IO).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The database aborted the transaction to keep it serializable.
    #[error("serialization failure: {0}")]
    SerializationFailure(String),

    /// A foreign key or uniqueness rule was violated.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
                classify_sqlstate(&code, err.to_string())
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}

/// Maps a PostgreSQL SQLSTATE onto the store error taxonomy.
fn classify_sqlstate(code: &str, message: String) -> StoreError {
    match code {
        // serialization_failure, deadlock_detected
        "40001" | "40P01" => StoreError::SerializationFailure(message),
        // class 23: integrity constraint violation
        c if c.starts_with("23") => StoreError::ConstraintViolation(message),
        // class 08: connection exception, 57P01..03: admin shutdown / cannot connect now
        c if c.starts_with("08") || c.starts_with("57P") => StoreError::Unavailable(message),
        _ => StoreError::Query(message),
    }
}

/// An open read-modify-write unit against the seat inventory.
///
/// Rows returned by [`fetch_seats_for_update`](SeatTransaction::fetch_seats_for_update)
/// stay locked against other transactions until `commit` or `rollback`.
/// Dropping the transaction without finishing it discards every staged write.
#[async_trait]
pub trait SeatTransaction: Send {
    async fn showtime_exists(&mut self, showtime_id: i64) -> Result<bool, StoreError>;

    /// Locks and returns the requested seats that belong to `showtime_id`,
    /// ordered by seat id. Ids of other showtimes (or unknown ids) are absent.
    async fn fetch_seats_for_update(
        &mut self,
        showtime_id: i64,
        seat_ids: &[i64],
    ) -> Result<Vec<SeatState>, StoreError>;

    async fn confirmation_code_in_use(&mut self, code: &str) -> Result<bool, StoreError>;

    async fn mark_seats_booked(&mut self, seat_ids: &[i64]) -> Result<(), StoreError>;

    async fn insert_booking_rows(
        &mut self,
        showtime_id: i64,
        seat_ids: &[i64],
        customer_name: &str,
        confirmation_code: &str,
    ) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn SeatTransaction>, StoreError>;

    /// Movies ordered by title.
    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError>;

    async fn find_movie(&self, movie_id: i64) -> Result<Option<Movie>, StoreError>;

    /// Showtimes of one movie ordered by start time.
    async fn list_showtimes(&self, movie_id: i64) -> Result<Vec<Showtime>, StoreError>;

    async fn find_showtime(&self, showtime_id: i64) -> Result<Option<Showtime>, StoreError>;

    /// Seats of one showtime ordered by row label, then seat number.
    async fn list_seats(&self, showtime_id: i64) -> Result<Vec<Seat>, StoreError>;

    /// Booking rows grouped under one confirmation code, ordered by seat.
    async fn bookings_by_code(&self, code: &str) -> Result<Vec<BookingDetail>, StoreError>;

    /// Per-showtime seat counts ordered by start time. Showtimes without
    /// seats are left out.
    async fn occupancy(&self) -> Result<Vec<ShowtimeOccupancy>, StoreError>;
}

/// Bulk setup of the catalog. Not used by the reservation path.
#[async_trait]
pub trait CatalogSeeder: Send + Sync {
    async fn is_empty(&self) -> Result<bool, StoreError>;

    async fn insert_movie(&self, movie: NewMovie) -> Result<i64, StoreError>;

    async fn insert_showtime(&self, showtime: NewShowtime) -> Result<i64, StoreError>;

    /// Creates `rows × seats_per_row` unbooked seats numbered from 1.
    async fn insert_seat_grid(
        &self,
        showtime_id: i64,
        rows: &[&str],
        seats_per_row: i32,
    ) -> Result<(), StoreError>;
}
