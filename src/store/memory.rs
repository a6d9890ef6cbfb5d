//! In-process catalog store.
//!
//! A single mutex guards the whole catalog and a transaction holds the guard
//! from `begin` until it finishes, so reservations are fully serialized.
//! Writes are staged on the transaction and applied only on commit.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::{CatalogSeeder, CatalogStore, SeatTransaction, StoreError};
use crate::models::{
    Booking, BookingDetail, Movie, NewMovie, NewShowtime, Seat, SeatState, Showtime,
    ShowtimeOccupancy,
};

#[derive(Debug, Default)]
struct Catalog {
    movies: BTreeMap<i64, Movie>,
    showtimes: BTreeMap<i64, Showtime>,
    seats: BTreeMap<i64, Seat>,
    bookings: Vec<Booking>,
    // seat_id -> booking id, mirrors UNIQUE (seat_id) on bookings
    booking_by_seat: HashMap<i64, i64>,
    next_movie_id: i64,
    next_showtime_id: i64,
    next_seat_id: i64,
    next_booking_id: i64,
}

impl Catalog {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

#[derive(Clone, Default)]
pub struct InMemoryCatalogStore {
    catalog: Arc<Mutex<Catalog>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an outage: every call fails with `StoreError::Unavailable`
    /// while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store switched off".to_string()));
        }
        Ok(())
    }

    /// All booking rows, in insertion order.
    pub async fn bookings(&self) -> Vec<Booking> {
        self.catalog.lock().await.bookings.clone()
    }

    pub async fn seat(&self, seat_id: i64) -> Option<Seat> {
        self.catalog.lock().await.seats.get(&seat_id).cloned()
    }
}

#[derive(Debug)]
struct StagedBooking {
    showtime_id: i64,
    seat_id: i64,
    customer_name: String,
    confirmation_code: String,
}

pub struct InMemorySeatTransaction {
    guard: OwnedMutexGuard<Catalog>,
    booked: Vec<i64>,
    inserted: Vec<StagedBooking>,
}

#[async_trait]
impl SeatTransaction for InMemorySeatTransaction {
    async fn showtime_exists(&mut self, showtime_id: i64) -> Result<bool, StoreError> {
        Ok(self.guard.showtimes.contains_key(&showtime_id))
    }

    async fn fetch_seats_for_update(
        &mut self,
        showtime_id: i64,
        seat_ids: &[i64],
    ) -> Result<Vec<SeatState>, StoreError> {
        let wanted: HashSet<i64> = seat_ids.iter().copied().collect();
        Ok(self
            .guard
            .seats
            .values()
            .filter(|s| s.showtime_id == showtime_id && wanted.contains(&s.id))
            .map(|s| SeatState {
                id: s.id,
                booked: s.booked || self.booked.contains(&s.id),
            })
            .collect())
    }

    async fn confirmation_code_in_use(&mut self, code: &str) -> Result<bool, StoreError> {
        Ok(self
            .guard
            .bookings
            .iter()
            .any(|b| b.confirmation_code == code))
    }

    async fn mark_seats_booked(&mut self, seat_ids: &[i64]) -> Result<(), StoreError> {
        for id in seat_ids {
            match self.guard.seats.get(id) {
                Some(seat) if !seat.booked && !self.booked.contains(id) => self.booked.push(*id),
                Some(_) => {
                    return Err(StoreError::ConstraintViolation(format!(
                        "seat {} is already booked",
                        id
                    )))
                }
                None => {
                    return Err(StoreError::ConstraintViolation(format!(
                        "seat {} does not exist",
                        id
                    )))
                }
            }
        }
        Ok(())
    }

    async fn insert_booking_rows(
        &mut self,
        showtime_id: i64,
        seat_ids: &[i64],
        customer_name: &str,
        confirmation_code: &str,
    ) -> Result<(), StoreError> {
        if !self.guard.showtimes.contains_key(&showtime_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "showtime {} does not exist",
                showtime_id
            )));
        }
        for seat_id in seat_ids {
            let taken = self.guard.booking_by_seat.contains_key(seat_id)
                || self.inserted.iter().any(|b| b.seat_id == *seat_id);
            if taken {
                return Err(StoreError::ConstraintViolation(format!(
                    "seat {} already has a booking",
                    seat_id
                )));
            }
            if !self.guard.seats.contains_key(seat_id) {
                return Err(StoreError::ConstraintViolation(format!(
                    "seat {} does not exist",
                    seat_id
                )));
            }
            self.inserted.push(StagedBooking {
                showtime_id,
                seat_id: *seat_id,
                customer_name: customer_name.to_string(),
                confirmation_code: confirmation_code.to_string(),
            });
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemorySeatTransaction {
            mut guard,
            booked,
            inserted,
        } = *self;

        for id in &booked {
            if let Some(seat) = guard.seats.get_mut(id) {
                seat.booked = true;
            }
        }
        for staged in inserted {
            let id = Catalog::next_id(&mut guard.next_booking_id);
            guard.booking_by_seat.insert(staged.seat_id, id);
            guard.bookings.push(Booking {
                id,
                showtime_id: staged.showtime_id,
                seat_id: staged.seat_id,
                customer_name: staged.customer_name,
                confirmation_code: staged.confirmation_code,
            });
        }
        debug!("in-memory commit: {} seats booked", booked.len());
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // Staged writes are dropped together with the guard.
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn begin(&self) -> Result<Box<dyn SeatTransaction>, StoreError> {
        self.ensure_available()?;
        let guard = self.catalog.clone().lock_owned().await;
        Ok(Box::new(InMemorySeatTransaction {
            guard,
            booked: Vec::new(),
            inserted: Vec::new(),
        }))
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        self.ensure_available()?;
        let catalog = self.catalog.lock().await;
        let mut movies: Vec<Movie> = catalog.movies.values().cloned().collect();
        movies.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(movies)
    }

    async fn find_movie(&self, movie_id: i64) -> Result<Option<Movie>, StoreError> {
        self.ensure_available()?;
        Ok(self.catalog.lock().await.movies.get(&movie_id).cloned())
    }

    async fn list_showtimes(&self, movie_id: i64) -> Result<Vec<Showtime>, StoreError> {
        self.ensure_available()?;
        let catalog = self.catalog.lock().await;
        let mut showtimes: Vec<Showtime> = catalog
            .showtimes
            .values()
            .filter(|s| s.movie_id == movie_id)
            .cloned()
            .collect();
        showtimes.sort_by_key(|s| s.start_time);
        Ok(showtimes)
    }

    async fn find_showtime(&self, showtime_id: i64) -> Result<Option<Showtime>, StoreError> {
        self.ensure_available()?;
        Ok(self.catalog.lock().await.showtimes.get(&showtime_id).cloned())
    }

    async fn list_seats(&self, showtime_id: i64) -> Result<Vec<Seat>, StoreError> {
        self.ensure_available()?;
        let catalog = self.catalog.lock().await;
        let mut seats: Vec<Seat> = catalog
            .seats
            .values()
            .filter(|s| s.showtime_id == showtime_id)
            .cloned()
            .collect();
        seats.sort_by(|a, b| {
            a.row_label
                .cmp(&b.row_label)
                .then(a.seat_number.cmp(&b.seat_number))
        });
        Ok(seats)
    }

    async fn bookings_by_code(&self, code: &str) -> Result<Vec<BookingDetail>, StoreError> {
        self.ensure_available()?;
        let catalog = self.catalog.lock().await;
        let mut rows: Vec<BookingDetail> = catalog
            .bookings
            .iter()
            .filter(|b| b.confirmation_code == code)
            .filter_map(|b| {
                let seat = catalog.seats.get(&b.seat_id)?;
                let showtime = catalog.showtimes.get(&b.showtime_id)?;
                let movie = catalog.movies.get(&showtime.movie_id)?;
                Some(BookingDetail {
                    confirmation_code: b.confirmation_code.clone(),
                    customer_name: b.customer_name.clone(),
                    seat_id: seat.id,
                    row_label: seat.row_label.clone(),
                    seat_number: seat.seat_number,
                    showtime_id: showtime.id,
                    start_time: showtime.start_time,
                    screen_name: showtime.screen_name.clone(),
                    movie_title: movie.title.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            a.row_label
                .cmp(&b.row_label)
                .then(a.seat_number.cmp(&b.seat_number))
        });
        Ok(rows)
    }

    async fn occupancy(&self) -> Result<Vec<ShowtimeOccupancy>, StoreError> {
        self.ensure_available()?;
        let catalog = self.catalog.lock().await;
        let mut counts: BTreeMap<i64, (i64, i64)> = BTreeMap::new();
        for seat in catalog.seats.values() {
            let entry = counts.entry(seat.showtime_id).or_insert((0, 0));
            entry.0 += 1;
            if seat.booked {
                entry.1 += 1;
            }
        }

        let mut rows: Vec<ShowtimeOccupancy> = counts
            .into_iter()
            .filter_map(|(showtime_id, (total_seats, booked))| {
                let showtime = catalog.showtimes.get(&showtime_id)?;
                let movie = catalog.movies.get(&showtime.movie_id)?;
                Some(ShowtimeOccupancy {
                    showtime_id,
                    start_time: showtime.start_time,
                    movie_title: movie.title.clone(),
                    total_seats,
                    booked,
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then(a.showtime_id.cmp(&b.showtime_id))
        });
        Ok(rows)
    }
}

#[async_trait]
impl CatalogSeeder for InMemoryCatalogStore {
    async fn is_empty(&self) -> Result<bool, StoreError> {
        self.ensure_available()?;
        Ok(self.catalog.lock().await.movies.is_empty())
    }

    async fn insert_movie(&self, movie: NewMovie) -> Result<i64, StoreError> {
        self.ensure_available()?;
        let mut catalog = self.catalog.lock().await;
        let id = Catalog::next_id(&mut catalog.next_movie_id);
        catalog.movies.insert(
            id,
            Movie {
                id,
                title: movie.title,
                description: Some(movie.description),
                rating: Some(movie.rating),
                duration_minutes: Some(movie.duration_minutes),
            },
        );
        Ok(id)
    }

    async fn insert_showtime(&self, showtime: NewShowtime) -> Result<i64, StoreError> {
        self.ensure_available()?;
        let mut catalog = self.catalog.lock().await;
        if !catalog.movies.contains_key(&showtime.movie_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "movie {} does not exist",
                showtime.movie_id
            )));
        }
        let id = Catalog::next_id(&mut catalog.next_showtime_id);
        catalog.showtimes.insert(
            id,
            Showtime {
                id,
                movie_id: showtime.movie_id,
                start_time: showtime.start_time,
                screen_name: Some(showtime.screen_name),
            },
        );
        Ok(id)
    }

    async fn insert_seat_grid(
        &self,
        showtime_id: i64,
        rows: &[&str],
        seats_per_row: i32,
    ) -> Result<(), StoreError> {
        self.ensure_available()?;
        let mut catalog = self.catalog.lock().await;
        if !catalog.showtimes.contains_key(&showtime_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "showtime {} does not exist",
                showtime_id
            )));
        }
        // All-or-nothing like the single INSERT on Postgres: every position is
        // checked before the first seat is created.
        let mut taken: HashSet<(String, i32)> = catalog
            .seats
            .values()
            .filter(|s| s.showtime_id == showtime_id)
            .map(|s| (s.row_label.clone(), s.seat_number))
            .collect();
        let mut grid = Vec::with_capacity(rows.len() * seats_per_row.max(0) as usize);
        for row_label in rows {
            for seat_number in 1..=seats_per_row {
                if !taken.insert((row_label.to_string(), seat_number)) {
                    return Err(StoreError::ConstraintViolation(format!(
                        "seat {}{} already exists for showtime {}",
                        row_label, seat_number, showtime_id
                    )));
                }
                grid.push((row_label.to_string(), seat_number));
            }
        }
        for (row_label, seat_number) in grid {
            let id = Catalog::next_id(&mut catalog.next_seat_id);
            catalog.seats.insert(
                id,
                Seat {
                    id,
                    showtime_id,
                    row_label,
                    seat_number,
                    booked: false,
                },
            );
        }
        Ok(())
    }
}
