//! POST /api/showtimes/{id}/reservations
//!
//! Thin HTTP wrapper around the reservation engine: validates the body,
//! runs the check-and-commit and maps failures to `{error_kind, detail, retryable}`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

use crate::reservation::{ReservationError, ReservationRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/showtimes/{id}/reservations", post(reserve_seats))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReserveSeatsRequest {
    #[serde(default)]
    pub seat_ids: Vec<i64>,
    #[validate(length(max = 100, message = "customer_name must be at most 100 characters"))]
    pub customer_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReserveSeatsResponse {
    confirmation_code: String,
    seat_ids: Vec<i64>,
    customer_name: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error_kind: String,
    pub detail: Value,
    /// The same request may succeed later without changes.
    pub retryable: bool,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn status_for(err: &ReservationError) -> StatusCode {
    match err {
        ReservationError::NoSeatsSelected => StatusCode::BAD_REQUEST,
        ReservationError::ShowtimeNotFound(_) => StatusCode::NOT_FOUND,
        ReservationError::SeatsUnavailable(_) | ReservationError::ConstraintViolation(_) => {
            StatusCode::CONFLICT
        }
        ReservationError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ReservationError::Timeout => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn reservation_error(err: ReservationError) -> ApiError {
    let body = ErrorBody {
        error_kind: format!("{:?}", err.kind()),
        detail: err.detail(),
        retryable: err.is_transient(),
    };
    (status_for(&err), Json(body))
}

async fn reserve_seats(
    State(state): State<Arc<AppState>>,
    Path(showtime_id): Path<i64>,
    Json(req): Json<ReserveSeatsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorBody {
                error_kind: "InvalidRequest".to_string(),
                detail: json!({ "message": e.to_string() }),
                retryable: false,
            }),
        ));
    }

    let confirmation = state
        .engine
        .reserve_seats(ReservationRequest {
            showtime_id,
            seat_ids: req.seat_ids,
            customer_name: req.customer_name,
        })
        .await
        .map_err(reservation_error)?;

    state.cache.invalidate_seats(showtime_id).await;

    Ok((
        StatusCode::CREATED,
        Json(ReserveSeatsResponse {
            confirmation_code: confirmation.confirmation_code,
            seat_ids: confirmation.seat_ids,
            customer_name: confirmation.customer_name,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_share_a_status() {
        assert_eq!(
            status_for(&ReservationError::SeatsUnavailable(vec![1])),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&ReservationError::ConstraintViolation("dup".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(status_for(&ReservationError::Timeout), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn long_names_fail_validation() {
        let req = ReserveSeatsRequest {
            seat_ids: vec![1],
            customer_name: Some("x".repeat(101)),
        };
        assert!(req.validate().is_err());

        let req = ReserveSeatsRequest {
            seat_ids: vec![1],
            customer_name: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn error_body_uses_kind_name() {
        let (status, Json(body)) = reservation_error(ReservationError::SeatsUnavailable(vec![4]));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error_kind, "SeatsUnavailable");
        assert_eq!(body.detail["seat_ids"], json!([4]));
        assert!(!body.retryable);
    }

    #[test]
    fn infrastructure_failures_are_retryable() {
        let (status, Json(body)) = reservation_error(ReservationError::Timeout);
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body.retryable);

        let (status, Json(body)) =
            reservation_error(ReservationError::StoreUnavailable("down".to_string()));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.retryable);
    }
}
