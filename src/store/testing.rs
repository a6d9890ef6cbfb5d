//! Fault injection around [`InMemoryCatalogStore`] for tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{CatalogStore, InMemoryCatalogStore, SeatTransaction, StoreError};
use crate::models::{BookingDetail, Movie, Seat, SeatState, Showtime, ShowtimeOccupancy};

/// Pauses `list_seats` after it has read the catalog, until released.
#[derive(Default)]
pub struct ListSeatsGate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Clone, Default)]
pub struct FaultyStore {
    inner: InMemoryCatalogStore,
    fetch_delay: Option<Duration>,
    fail_commit: bool,
    list_gate: Option<Arc<ListSeatsGate>>,
}

impl FaultyStore {
    pub fn new(inner: InMemoryCatalogStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Sleeps inside `fetch_seats_for_update`, after the seats are locked.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Rolls the transaction back and reports a serialization failure on commit.
    pub fn with_failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn with_list_gate(mut self, gate: Arc<ListSeatsGate>) -> Self {
        self.list_gate = Some(gate);
        self
    }
}

struct FaultyTransaction {
    inner: Box<dyn SeatTransaction>,
    fetch_delay: Option<Duration>,
    fail_commit: bool,
}

#[async_trait]
impl SeatTransaction for FaultyTransaction {
    async fn showtime_exists(&mut self, showtime_id: i64) -> Result<bool, StoreError> {
        self.inner.showtime_exists(showtime_id).await
    }

    async fn fetch_seats_for_update(
        &mut self,
        showtime_id: i64,
        seat_ids: &[i64],
    ) -> Result<Vec<SeatState>, StoreError> {
        let seats = self.inner.fetch_seats_for_update(showtime_id, seat_ids).await?;
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(seats)
    }

    async fn confirmation_code_in_use(&mut self, code: &str) -> Result<bool, StoreError> {
        self.inner.confirmation_code_in_use(code).await
    }

    async fn mark_seats_booked(&mut self, seat_ids: &[i64]) -> Result<(), StoreError> {
        self.inner.mark_seats_booked(seat_ids).await
    }

    async fn insert_booking_rows(
        &mut self,
        showtime_id: i64,
        seat_ids: &[i64],
        customer_name: &str,
        confirmation_code: &str,
    ) -> Result<(), StoreError> {
        self.inner
            .insert_booking_rows(showtime_id, seat_ids, customer_name, confirmation_code)
            .await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if self.fail_commit {
            self.inner.rollback().await?;
            return Err(StoreError::SerializationFailure(
                "could not serialize access due to concurrent update".to_string(),
            ));
        }
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.rollback().await
    }
}

#[async_trait]
impl CatalogStore for FaultyStore {
    async fn begin(&self) -> Result<Box<dyn SeatTransaction>, StoreError> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(FaultyTransaction {
            inner,
            fetch_delay: self.fetch_delay,
            fail_commit: self.fail_commit,
        }))
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        self.inner.list_movies().await
    }

    async fn find_movie(&self, movie_id: i64) -> Result<Option<Movie>, StoreError> {
        self.inner.find_movie(movie_id).await
    }

    async fn list_showtimes(&self, movie_id: i64) -> Result<Vec<Showtime>, StoreError> {
        self.inner.list_showtimes(movie_id).await
    }

    async fn find_showtime(&self, showtime_id: i64) -> Result<Option<Showtime>, StoreError> {
        self.inner.find_showtime(showtime_id).await
    }

    async fn list_seats(&self, showtime_id: i64) -> Result<Vec<Seat>, StoreError> {
        let seats = self.inner.list_seats(showtime_id).await?;
        if let Some(gate) = &self.list_gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        Ok(seats)
    }

    async fn bookings_by_code(&self, code: &str) -> Result<Vec<BookingDetail>, StoreError> {
        self.inner.bookings_by_code(code).await
    }

    async fn occupancy(&self) -> Result<Vec<ShowtimeOccupancy>, StoreError> {
        self.inner.occupancy().await
    }
}
