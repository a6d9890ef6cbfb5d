use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{CatalogSeeder, CatalogStore, SeatTransaction, StoreError};
use crate::models::{
    BookingDetail, Movie, NewMovie, NewShowtime, Seat, SeatState, Showtime, ShowtimeOccupancy,
};

/// Catalog store backed by PostgreSQL.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Reservation transaction on one pooled connection.
///
/// Seat rows are locked with `SELECT ... FOR UPDATE`, so a second transaction
/// touching any of the same seats blocks until this one commits or rolls back.
/// Locks are taken in ascending seat id order to keep overlapping requests
/// from deadlocking each other.
pub struct PgSeatTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SeatTransaction for PgSeatTransaction {
    async fn showtime_exists(&mut self, showtime_id: i64) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM showtimes WHERE id = $1)"
        )
        .bind(showtime_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn fetch_seats_for_update(
        &mut self,
        showtime_id: i64,
        seat_ids: &[i64],
    ) -> Result<Vec<SeatState>, StoreError> {
        let seats = sqlx::query_as::<_, SeatState>(
            r#"
            SELECT id, booked
            FROM seats
            WHERE showtime_id = $1 AND id = ANY($2)
            ORDER BY id
            FOR UPDATE
            "#
        )
        .bind(showtime_id)
        .bind(seat_ids)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(seats)
    }

    async fn confirmation_code_in_use(&mut self, code: &str) -> Result<bool, StoreError> {
        let in_use = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE confirmation_code = $1)"
        )
        .bind(code)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(in_use)
    }

    async fn mark_seats_booked(&mut self, seat_ids: &[i64]) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE seats SET booked = TRUE WHERE id = ANY($1) AND booked = FALSE"
        )
        .bind(seat_ids)
        .execute(&mut *self.tx)
        .await?;

        // Rows are locked, so anything short of a full update means the lock
        // did not hold.
        if result.rows_affected() != seat_ids.len() as u64 {
            return Err(StoreError::ConstraintViolation(format!(
                "expected to book {} seats, updated {}",
                seat_ids.len(),
                result.rows_affected()
            )));
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
        sqlx::query(
            r#"
            INSERT INTO bookings (showtime_id, seat_id, customer_name, confirmation_code)
            SELECT $1, seat_id, $3, $4
            FROM UNNEST($2::BIGINT[]) AS seat_id
            "#
        )
        .bind(showtime_id)
        .bind(seat_ids)
        .bind(customer_name)
        .bind(confirmation_code)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn begin(&self) -> Result<Box<dyn SeatTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSeatTransaction { tx }))
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT id, title, description, rating, duration_minutes FROM movies ORDER BY title"
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn find_movie(&self, movie_id: i64) -> Result<Option<Movie>, StoreError> {
        let movie = sqlx::query_as::<_, Movie>(
            "SELECT id, title, description, rating, duration_minutes FROM movies WHERE id = $1"
        )
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(movie)
    }

    async fn list_showtimes(&self, movie_id: i64) -> Result<Vec<Showtime>, StoreError> {
        let showtimes = sqlx::query_as::<_, Showtime>(
            r#"
            SELECT id, movie_id, start_time, screen_name
            FROM showtimes
            WHERE movie_id = $1
            ORDER BY start_time
            "#
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(showtimes)
    }

    async fn find_showtime(&self, showtime_id: i64) -> Result<Option<Showtime>, StoreError> {
        let showtime = sqlx::query_as::<_, Showtime>(
            "SELECT id, movie_id, start_time, screen_name FROM showtimes WHERE id = $1"
        )
        .bind(showtime_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(showtime)
    }

    async fn list_seats(&self, showtime_id: i64) -> Result<Vec<Seat>, StoreError> {
        let seats = sqlx::query_as::<_, Seat>(
            r#"
            SELECT id, showtime_id, row_label, seat_number, booked
            FROM seats
            WHERE showtime_id = $1
            ORDER BY row_label, seat_number
            "#
        )
        .bind(showtime_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(seats)
    }

    async fn bookings_by_code(&self, code: &str) -> Result<Vec<BookingDetail>, StoreError> {
        let rows = sqlx::query_as::<_, BookingDetail>(
            r#"
            SELECT b.confirmation_code,
                   b.customer_name,
                   s.id AS seat_id,
                   s.row_label,
                   s.seat_number,
                   st.id AS showtime_id,
                   st.start_time,
                   st.screen_name,
                   m.title AS movie_title
            FROM bookings b
            JOIN seats s ON b.seat_id = s.id
            JOIN showtimes st ON b.showtime_id = st.id
            JOIN movies m ON st.movie_id = m.id
            WHERE b.confirmation_code = $1
            ORDER BY s.row_label, s.seat_number
            "#
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn occupancy(&self) -> Result<Vec<ShowtimeOccupancy>, StoreError> {
        let rows = sqlx::query_as::<_, (i64, chrono::NaiveDateTime, String, i64, i64)>(
            r#"
            SELECT st.id,
                   st.start_time,
                   m.title,
                   COUNT(s.id) AS total_seats,
                   COUNT(s.id) FILTER (WHERE s.booked) AS booked_seats
            FROM showtimes st
            JOIN movies m ON st.movie_id = m.id
            JOIN seats s ON s.showtime_id = st.id
            GROUP BY st.id, st.start_time, m.title
            ORDER BY st.start_time, st.id
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(showtime_id, start_time, movie_title, total_seats, booked)| ShowtimeOccupancy {
                showtime_id,
                start_time,
                movie_title,
                total_seats,
                booked,
            })
            .collect())
    }
}

#[async_trait]
impl CatalogSeeder for PgCatalogStore {
    async fn is_empty(&self) -> Result<bool, StoreError> {
        let has_movies = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM movies)")
            .fetch_one(&self.pool)
            .await?;
        Ok(!has_movies)
    }

    async fn insert_movie(&self, movie: NewMovie) -> Result<i64, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO movies (title, description, rating, duration_minutes)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#
        )
        .bind(movie.title)
        .bind(movie.description)
        .bind(movie.rating)
        .bind(movie.duration_minutes)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_showtime(&self, showtime: NewShowtime) -> Result<i64, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO showtimes (movie_id, start_time, screen_name)
            VALUES ($1, $2, $3)
            RETURNING id
            "#
        )
        .bind(showtime.movie_id)
        .bind(showtime.start_time)
        .bind(showtime.screen_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_seat_grid(
        &self,
        showtime_id: i64,
        rows: &[&str],
        seats_per_row: i32,
    ) -> Result<(), StoreError> {
        let rows: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
        sqlx::query(
            r#"
            INSERT INTO seats (showtime_id, row_label, seat_number, booked)
            SELECT $1, row_label, seat_number, FALSE
            FROM UNNEST($2::TEXT[]) AS row_label,
                 generate_series(1, $3) AS seat_number
            "#
        )
        .bind(showtime_id)
        .bind(&rows)
        .bind(seats_per_row)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
