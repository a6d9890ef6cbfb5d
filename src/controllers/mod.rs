pub mod movies;
pub mod showtimes;
pub mod reservations;
pub mod bookings;
#[cfg(feature = "analytics")]
pub mod analytics;

use axum::{http::StatusCode, Router};
use std::sync::Arc;

use crate::store::StoreError;

pub fn routes() -> Router<Arc<crate::AppState>> {
    let router = Router::new()
        .merge(movies::routes())
        .merge(showtimes::routes())
        .merge(reservations::routes())
        .merge(bookings::routes());

    #[cfg(feature = "analytics")]
    let router = router.merge(analytics::routes());

    router
}

/* ---------- helpers ---------- */

/// Read-path store failures: 503 when storage is down, 500 otherwise.
pub(crate) fn store_error(context: &str, err: StoreError) -> (StatusCode, String) {
    tracing::error!("{} store error: {}", context, err);
    match err {
        StoreError::Unavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Storage is temporarily unavailable".to_string(),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load data".to_string(),
        ),
    }
}
