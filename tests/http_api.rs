//! HTTP surface tests against the in-memory catalog store.
//!
//! Run with: `cargo test --test http_api`

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use movie_booking::{
    app, config::Config, seed::seed_demo_catalog, store::InMemoryCatalogStore, AppState,
};

async fn test_app() -> (Router, InMemoryCatalogStore) {
    let store = InMemoryCatalogStore::new();
    seed_demo_catalog(&store).await.unwrap();

    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://unused/movies".to_string()),
        _ => None,
    })
    .unwrap();

    let state = AppState::new(Arc::new(store.clone()), None, config);
    (app(state), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn reserve(app: &Router, showtime_id: i64, body: Value) -> (StatusCode, Value) {
    let request = Request::post(format!("/api/showtimes/{}/reservations", showtime_id))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn health_and_banner() {
    let (app, _) = test_app().await;
    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn movies_are_listed_by_title() {
    let (app, _) = test_app().await;
    let (status, body) = get(&app, "/api/movies").await;

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        vec![
            "Avatar",
            "Black Panther",
            "Jurassic World Rebirth",
            "Twilight",
            "Wicked: For Good"
        ]
    );
}

#[tokio::test]
async fn movie_detail_with_showtimes() {
    let (app, _) = test_app().await;

    let (status, body) = get(&app, "/api/movies/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movie"]["title"], "Avatar");
    assert_eq!(body["showtimes"].as_array().unwrap().len(), 3);

    let (status, _) = get(&app, "/api/movies/404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn seat_map_is_grouped_by_row() {
    let (app, _) = test_app().await;
    let (status, body) = get(&app, "/api/showtimes/1/seats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movie"]["title"], "Avatar");
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["row_label"], "A");
    assert_eq!(rows[0]["seats"].as_array().unwrap().len(), 10);

    let (status, _) = get(&app, "/api/showtimes/999999/seats").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reservation_flow() {
    let (app, store) = test_app().await;

    let (status, body) = reserve(&app, 1, json!({ "seat_ids": [1, 2], "customer_name": "Alice" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let code = body["confirmation_code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 8);

    let (status, body) = reserve(&app, 1, json!({ "seat_ids": [2, 3], "customer_name": "Bob" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_kind"], "SeatsUnavailable");
    assert_eq!(body["detail"]["seat_ids"], json!([2]));

    let (status, body) = get(&app, &format!("/api/bookings/{}", code)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customer_name"], "Alice");
    assert_eq!(body["movie_title"], "Avatar");
    let seats = body["seats"].as_array().unwrap();
    assert_eq!(seats.len(), 2);
    assert_eq!(seats[0]["row_label"], "A");
    assert_eq!(seats[1]["seat_number"], 2);

    // seat map reflects the booking
    let (_, body) = get(&app, "/api/showtimes/1/seats").await;
    let row_a = body["rows"][0]["seats"].as_array().unwrap();
    assert_eq!(row_a[0]["booked"], true);
    assert_eq!(row_a[2]["booked"], false);

    assert!(!store.seat(3).await.unwrap().booked);
}

#[tokio::test]
async fn missing_name_books_as_guest() {
    let (app, _) = test_app().await;
    let (status, body) = reserve(&app, 2, json!({ "seat_ids": [41] })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["customer_name"], "Guest");
}

#[tokio::test]
async fn reservation_errors_are_structured() {
    let (app, _) = test_app().await;

    let (status, body) = reserve(&app, 1, json!({ "seat_ids": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_kind"], "NoSeatsSelected");

    let (status, body) = reserve(&app, 999999, json!({ "seat_ids": [1] })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_kind"], "ShowtimeNotFound");

    let (status, body) = reserve(
        &app,
        1,
        json!({ "seat_ids": [1], "customer_name": "x".repeat(101) }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_kind"], "InvalidRequest");
}

#[tokio::test]
async fn outage_maps_to_service_unavailable() {
    let (app, store) = test_app().await;
    store.set_unavailable(true);

    let (status, body) = reserve(&app, 1, json!({ "seat_ids": [1] })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error_kind"], "StoreUnavailable");
    assert_eq!(body["retryable"], true);

    let (status, _) = get(&app, "/api/movies").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unknown_booking_code() {
    let (app, _) = test_app().await;
    let (status, _) = get(&app, "/api/bookings/NOPE0000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[cfg(feature = "analytics")]
#[tokio::test]
async fn analytics_counts_booked_seats() {
    let (app, _) = test_app().await;
    let (status, _) = reserve(&app, 1, json!({ "seat_ids": [1, 2, 3, 4] })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = get(&app, "/api/analytics").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 15);

    let first = rows
        .iter()
        .find(|r| r["showtime_id"] == 1)
        .unwrap();
    assert_eq!(first["total_seats"], 40);
    assert_eq!(first["booked"], 4);
    assert_eq!(first["available"], 36);
    assert_eq!(first["occupancy_rate"], 10.0);
}
