//! Reservation engine: atomic check-and-commit of a seat selection.
//!
//! One call to [`ReservationEngine::reserve_seats`] opens a transaction, locks
//! the requested seats of the showtime, verifies that every one of them exists
//! and is free, and then books all of them under a single confirmation code.
//! Any failure rolls the transaction back, so a request either books the whole
//! selection or nothing.

mod error;

pub use error::{ErrorKind, ReservationError};

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

use crate::confirmation::ConfirmationCodeGenerator;
use crate::store::{CatalogStore, SeatTransaction, StoreError};

pub const GUEST_NAME: &str = "Guest";

/// Attempts at drawing a confirmation code that no booking uses yet.
pub const MAX_CODE_ATTEMPTS: usize = 5;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRequest {
    pub showtime_id: i64,
    pub seat_ids: Vec<i64>,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub confirmation_code: String,
    pub showtime_id: i64,
    pub seat_ids: Vec<i64>,
    pub customer_name: String,
}

/// Blank or missing names fall back to [`GUEST_NAME`].
pub fn normalize_customer_name(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => GUEST_NAME.to_string(),
    }
}

/// Distinct seat ids in ascending order, the order rows get locked in.
pub fn normalize_seat_ids(seat_ids: &[i64]) -> Vec<i64> {
    seat_ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Clone)]
pub struct ReservationEngine {
    store: Arc<dyn CatalogStore>,
    codes: Arc<dyn ConfirmationCodeGenerator>,
    timeout: Duration,
}

impl ReservationEngine {
    pub fn new(store: Arc<dyn CatalogStore>, codes: Arc<dyn ConfirmationCodeGenerator>) -> Self {
        Self {
            store,
            codes,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Books every requested seat of the showtime or none of them.
    ///
    /// Blocks on store I/O and on row locks held by concurrent reservations
    /// for the same seats. The configured timeout covers opening the
    /// transaction, the locked read and the writes; on expiry the transaction
    /// is rolled back before `Timeout` is returned.
    pub async fn reserve_seats(
        &self,
        request: ReservationRequest,
    ) -> Result<Confirmation, ReservationError> {
        let seat_ids = normalize_seat_ids(&request.seat_ids);
        if seat_ids.is_empty() {
            return Err(ReservationError::NoSeatsSelected);
        }
        let customer_name = normalize_customer_name(request.customer_name.as_deref());
        let showtime_id = request.showtime_id;

        debug!(
            "reservation started: showtime={} seats={:?} customer={}",
            showtime_id, seat_ids, customer_name
        );

        let deadline = Instant::now() + self.timeout;

        let mut tx = match timeout_at(deadline, self.store.begin()).await {
            Ok(Ok(tx)) => tx,
            Ok(Err(e)) => return Err(self.store_failure(showtime_id, &seat_ids, e)),
            Err(_) => {
                warn!("reservation timed out opening a transaction: showtime={}", showtime_id);
                return Err(ReservationError::Timeout);
            }
        };

        let checked = timeout_at(
            deadline,
            self.check_and_write(tx.as_mut(), showtime_id, &seat_ids, &customer_name),
        )
        .await;

        let code = match checked {
            Ok(Ok(code)) => code,
            Ok(Err(e)) => {
                rollback(tx, showtime_id).await;
                return Err(e);
            }
            Err(_) => {
                rollback(tx, showtime_id).await;
                warn!(
                    "reservation timed out: showtime={} seats={:?}",
                    showtime_id, seat_ids
                );
                return Err(ReservationError::Timeout);
            }
        };

        // Commit runs to completion: cutting it short would leave its outcome unknown.
        if let Err(e) = tx.commit().await {
            return Err(self.store_failure(showtime_id, &seat_ids, e));
        }

        info!(
            "reservation confirmed: showtime={} seats={:?} code={}",
            showtime_id, seat_ids, code
        );

        Ok(Confirmation {
            confirmation_code: code,
            showtime_id,
            seat_ids,
            customer_name,
        })
    }

    async fn check_and_write(
        &self,
        tx: &mut dyn SeatTransaction,
        showtime_id: i64,
        seat_ids: &[i64],
        customer_name: &str,
    ) -> Result<String, ReservationError> {
        let exists = tx
            .showtime_exists(showtime_id)
            .await
            .map_err(|e| self.store_failure(showtime_id, seat_ids, e))?;
        if !exists {
            return Err(ReservationError::ShowtimeNotFound(showtime_id));
        }

        let seats = tx
            .fetch_seats_for_update(showtime_id, seat_ids)
            .await
            .map_err(|e| self.store_failure(showtime_id, seat_ids, e))?;

        // Missing ids (wrong showtime or unknown) and already booked seats are
        // reported together; nothing is booked if either list is non-empty.
        let found: BTreeSet<i64> = seats.iter().map(|s| s.id).collect();
        let mut unavailable: Vec<i64> = seat_ids
            .iter()
            .copied()
            .filter(|id| !found.contains(id))
            .collect();
        unavailable.extend(seats.iter().filter(|s| s.booked).map(|s| s.id));
        unavailable.sort_unstable();

        if !unavailable.is_empty() {
            info!(
                "reservation aborted: showtime={} unavailable seats={:?}",
                showtime_id, unavailable
            );
            return Err(ReservationError::SeatsUnavailable(unavailable));
        }

        let code = self.fresh_code(tx, showtime_id, seat_ids).await?;

        tx.mark_seats_booked(seat_ids)
            .await
            .map_err(|e| self.store_failure(showtime_id, seat_ids, e))?;
        tx.insert_booking_rows(showtime_id, seat_ids, customer_name, &code)
            .await
            .map_err(|e| self.store_failure(showtime_id, seat_ids, e))?;

        Ok(code)
    }

    async fn fresh_code(
        &self,
        tx: &mut dyn SeatTransaction,
        showtime_id: i64,
        seat_ids: &[i64],
    ) -> Result<String, ReservationError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = self.codes.generate();
            let in_use = tx
                .confirmation_code_in_use(&code)
                .await
                .map_err(|e| self.store_failure(showtime_id, seat_ids, e))?;
            if !in_use {
                return Ok(code);
            }
            warn!("confirmation code collision on attempt {}: {}", attempt, code);
        }

        error!(
            "no unused confirmation code after {} attempts: showtime={}",
            MAX_CODE_ATTEMPTS, showtime_id
        );
        Err(ReservationError::ConstraintViolation(format!(
            "no unused confirmation code after {} attempts",
            MAX_CODE_ATTEMPTS
        )))
    }

    fn store_failure(&self, showtime_id: i64, seat_ids: &[i64], err: StoreError) -> ReservationError {
        match err {
            StoreError::Unavailable(msg) | StoreError::Query(msg) => {
                error!(
                    "store failure during reservation: showtime={} seats={:?}: {}",
                    showtime_id, seat_ids, msg
                );
                ReservationError::StoreUnavailable(msg)
            }
            StoreError::SerializationFailure(msg) => {
                warn!(
                    "reservation lost a serialization race: showtime={} seats={:?}: {}",
                    showtime_id, seat_ids, msg
                );
                ReservationError::SeatsUnavailable(seat_ids.to_vec())
            }
            StoreError::ConstraintViolation(msg) => {
                // Row locks should make this unreachable.
                error!(
                    "ANOMALY: constraint violation during reservation: showtime={} seats={:?}: {}",
                    showtime_id, seat_ids, msg
                );
                ReservationError::ConstraintViolation(msg)
            }
        }
    }
}

async fn rollback(tx: Box<dyn SeatTransaction>, showtime_id: i64) {
    if let Err(e) = tx.rollback().await {
        // The connection drops the transaction anyway once returned to the pool.
        warn!("rollback failed for showtime {}: {}", showtime_id, e);
    }
}
