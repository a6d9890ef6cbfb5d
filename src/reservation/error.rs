use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationError {
    #[error("no seats selected")]
    NoSeatsSelected,

    #[error("showtime {0} not found")]
    ShowtimeNotFound(i64),

    /// Seats that are already booked or do not belong to the showtime.
    #[error("seats unavailable: {0:?}")]
    SeatsUnavailable(Vec<i64>),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("reservation timed out")]
    Timeout,

    /// A storage rule fired at write or commit time. Reported to users like
    /// `SeatsUnavailable`.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Wire name of each error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    NoSeatsSelected,
    ShowtimeNotFound,
    SeatsUnavailable,
    StoreUnavailable,
    Timeout,
    ConstraintViolation,
}

impl ReservationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReservationError::NoSeatsSelected => ErrorKind::NoSeatsSelected,
            ReservationError::ShowtimeNotFound(_) => ErrorKind::ShowtimeNotFound,
            ReservationError::SeatsUnavailable(_) => ErrorKind::SeatsUnavailable,
            ReservationError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            ReservationError::Timeout => ErrorKind::Timeout,
            ReservationError::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
        }
    }

    /// Structured context for the caller. Infrastructure messages stay in the
    /// logs.
    pub fn detail(&self) -> Value {
        match self {
            ReservationError::NoSeatsSelected => {
                json!({ "message": "Please select at least one seat." })
            }
            ReservationError::ShowtimeNotFound(id) => {
                json!({ "showtime_id": id, "message": "Showtime not found." })
            }
            ReservationError::SeatsUnavailable(ids) => json!({
                "seat_ids": ids,
                "message": "One or more selected seats were just booked. Please try again.",
            }),
            ReservationError::ConstraintViolation(_) => json!({
                "message": "One or more selected seats were just booked. Please try again.",
            }),
            ReservationError::StoreUnavailable(_) | ReservationError::Timeout => {
                json!({ "message": "Booking is temporarily unavailable. Please retry later." })
            }
        }
    }

    /// Whether the user may simply resubmit after changing nothing but time.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ReservationError::StoreUnavailable(_) | ReservationError::Timeout
        )
    }
}
