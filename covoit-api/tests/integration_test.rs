use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use covoit_api::{app, AppState, AuthConfig};
use covoit_api::middleware::Claims;
use covoit_booking::BookingService;
use covoit_catalog::RideCatalog;
use covoit_store::app_config::BusinessRules;
use covoit_store::InMemoryStore;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret";

fn test_app() -> Router {
    test_app_with_max_age(3600)
}

fn test_app_with_max_age(max_age_seconds: u64) -> Router {
    let store = InMemoryStore::new();
    let catalog = RideCatalog::new(Arc::new(store.clone()), Arc::new(store.clone()), 20);
    let booking = BookingService::new(Arc::new(store.clone()), Arc::new(store));

    app(AppState {
        catalog: Arc::new(catalog),
        booking: Arc::new(booking),
        redis: None,
        auth: AuthConfig {
            secret: SECRET.to_string(),
            max_age_seconds,
        },
        business_rules: BusinessRules::default(),
    })
}

fn token_issued_at(user: Uuid, iat: i64) -> String {
    let claims = Claims {
        sub: user.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        iat: Some(iat),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn token_for(user: Uuid) -> String {
    token_issued_at(user, Utc::now().timestamp())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn call(app: &Router, method: Method, uri: &str, user: Option<Uuid>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(user)));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(app, request).await
}

async fn publish_ride(app: &Router, driver: Uuid) -> Value {
    let departure = Utc::now() + Duration::days(2);
    let (status, ride) = call(
        app,
        Method::POST,
        "/v1/rides",
        Some(driver),
        Some(json!({
            "departure_city": "paris",
            "arrival_city": "madrid",
            "departure_time": departure,
            "total_seats": 3,
            "price_per_seat": 100,
            "stops": "Poitiers\nBordeaux",
            "leg_prices": [40, 30, 30]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    ride
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app();
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_routes_require_token() {
    let app = test_app();
    let (status, _) = call(&app, Method::GET, "/v1/reservations", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/v1/reservations")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_publish_and_read_ride() {
    let app = test_app();
    let driver = Uuid::new_v4();
    let ride = publish_ride(&app, driver).await;

    assert_eq!(ride["route"], "Paris -> Poitiers -> Bordeaux -> Madrid");
    assert_eq!(ride["intermediate_stops"], 2);
    assert_eq!(ride["leg_prices"], json!([40, 30, 30]));

    let id = ride["id"].as_str().unwrap();
    let (status, detail) = call(&app, Method::GET, &format!("/v1/rides/{}", id), Some(driver), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["remaining_seats"], 3);

    let (status, quote) = call(
        &app,
        Method::GET,
        &format!("/v1/rides/{}/quote?from=poitiers&to=madrid", id),
        Some(Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["unit_price"], 60);
    assert_eq!(quote["is_sub_ride"], true);

    let (status, latest) = call(&app, Method::GET, "/v1/rides", Some(driver), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest.as_array().map(Vec::len), Some(1));

    let (status, own) = call(&app, Method::GET, "/v1/driver/rides", Some(driver), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(own[0]["id"], ride["id"]);
    assert_eq!(own[0]["route"], "Paris -> Poitiers -> Bordeaux -> Madrid");

    let (status, none) = call(&app, Method::GET, "/v1/driver/rides", Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(none.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_invalid_ride_is_bad_request() {
    let app = test_app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/v1/rides",
        Some(Uuid::new_v4()),
        Some(json!({
            "departure_city": "paris",
            "arrival_city": "madrid",
            "departure_time": Utc::now() - Duration::hours(1),
            "total_seats": 3,
            "price_per_seat": 100
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_search_by_segment() {
    let app = test_app();
    let ride = publish_ride(&app, Uuid::new_v4()).await;
    let date = ride["departure_time"].as_str().unwrap()[..10].to_string();

    let (status, hits) = call(
        &app,
        Method::GET,
        &format!("/v1/rides?from=Bordeaux&to=Madrid&date={}", date),
        Some(Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits[0]["from_index"], 2);
    assert_eq!(hits[0]["to_index"], 3);
    assert_eq!(hits[0]["unit_price"], 30);

    let (status, _) = call(&app, Method::GET, "/v1/rides?from=Bordeaux&to=Madrid", Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_booking_flow() {
    let app = test_app();
    let driver = Uuid::new_v4();
    let ride = publish_ride(&app, driver).await;
    let ride_id = ride["id"].as_str().unwrap().to_string();

    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    let (status, a) = call(
        &app,
        Method::POST,
        &format!("/v1/rides/{}/reservations", ride_id),
        Some(first),
        Some(json!({ "from_index": 0, "to_index": 2, "seats": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(a["status"], "PENDING");
    assert_eq!(a["total_price"], 140);

    let (status, b) = call(
        &app,
        Method::POST,
        &format!("/v1/rides/{}/reservations", ride_id),
        Some(second),
        Some(json!({ "from_index": 1, "to_index": 3, "seats": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let a_id = a["id"].as_str().unwrap();
    let b_id = b["id"].as_str().unwrap();

    // Only the driver may decide.
    let (status, _) = call(&app, Method::POST, &format!("/v1/reservations/{}/confirm", a_id), Some(first), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, confirmed) = call(
        &app,
        Method::POST,
        &format!("/v1/reservations/{}/confirm", a_id),
        Some(driver),
        Some(json!({ "message": "See you at the station" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "CONFIRMED");
    assert!(confirmed["ticket_code"].is_string());

    // Leg 1 is now the bottleneck for the second request.
    let (status, _) = call(&app, Method::POST, &format!("/v1/reservations/{}/confirm", b_id), Some(driver), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, availability) = call(
        &app,
        Method::GET,
        &format!("/v1/rides/{}/availability?from_index=1&to_index=3", ride_id),
        Some(second),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(availability["remaining_seats"], 1);

    let (status, rejected) = call(&app, Method::POST, &format!("/v1/reservations/{}/reject", b_id), Some(driver), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "REJECTED");
    assert_eq!(rejected["driver_message"], "Your reservation has been declined.");

    let (status, _) = call(&app, Method::POST, &format!("/v1/reservations/{}/reject", b_id), Some(driver), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, ticket) = call(&app, Method::GET, &format!("/v1/reservations/{}", a_id), Some(first), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ticket["reservation"]["ticket_code"], confirmed["ticket_code"]);
    assert_eq!(ticket["ride"]["id"], ride["id"]);

    let (status, _) = call(&app, Method::GET, &format!("/v1/reservations/{}", a_id), Some(second), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, mine) = call(&app, Method::GET, "/v1/reservations", Some(second), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().map(Vec::len), Some(1));

    let (status, inbox) = call(&app, Method::GET, "/v1/driver/reservations", Some(driver), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_driver_cannot_book_own_ride() {
    let app = test_app();
    let driver = Uuid::new_v4();
    let ride = publish_ride(&app, driver).await;

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/v1/rides/{}/reservations", ride["id"].as_str().unwrap()),
        Some(driver),
        Some(json!({ "from_index": 0, "to_index": 1, "seats": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_ride_is_not_found() {
    let app = test_app();
    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/v1/rides/{}", Uuid::new_v4()),
        Some(Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_bodies_are_json_bad_requests() {
    let app = test_app();
    let driver = Uuid::new_v4();

    let (status, body) = call(
        &app,
        Method::POST,
        "/v1/rides",
        Some(driver),
        Some(json!({
            "departure_city": "paris",
            "arrival_city": "madrid",
            "departure_time": Utc::now() + Duration::days(1),
            "price_per_seat": 100
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let ride = publish_ride(&app, driver).await;
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/v1/rides/{}/reservations", ride["id"].as_str().unwrap()),
        Some(Uuid::new_v4()),
        Some(json!({ "from_index": 0, "to_index": 1, "seats": "two" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/v1/reservations/{}/confirm", Uuid::new_v4()))
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(driver)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/v1/rides/{}/availability?from_index=zero&to_index=1", ride["id"].as_str().unwrap()),
        Some(driver),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_token_age_limit() {
    let user = Uuid::new_v4();
    let two_hours_ago = (Utc::now() - Duration::hours(2)).timestamp();

    let request = |token: String| {
        Request::builder()
            .uri("/v1/reservations")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    };

    let strict = test_app_with_max_age(3600);
    let (status, body) = send(&strict, request(token_issued_at(user, two_hours_ago))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    // A limit beyond i64 range means no limit, not a negative one.
    let unbounded = test_app_with_max_age(u64::MAX);
    let (status, _) = send(&unbounded, request(token_issued_at(user, two_hours_ago))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&unbounded, request(token_for(user))).await;
    assert_eq!(status, StatusCode::OK);
}
