use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use covoit_booking::{Booking, SegmentRequest};
use covoit_core::Reservation;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/rides/{id}/reservations", post(request_segment))
        .route("/v1/reservations", get(my_bookings))
        .route("/v1/reservations/{id}", get(get_reservation))
        .route("/v1/reservations/{id}/confirm", post(confirm))
        .route("/v1/reservations/{id}/reject", post(reject))
        .route("/v1/driver/reservations", get(driver_inbox))
}

#[derive(Debug, Deserialize)]
pub struct SegmentBody {
    pub from_index: i32,
    pub to_index: i32,
    pub seats: i32,
    pub unit_price: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DecisionBody {
    pub message: Option<String>,
}

async fn request_segment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ride_id): Path<Uuid>,
    payload: Result<Json<SegmentBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    let Json(body) = payload?;
    let req = SegmentRequest {
        passenger_id: user.id,
        from_index: body.from_index,
        to_index: body.to_index,
        seats: body.seats,
        unit_price: body.unit_price,
    };

    let reservation = state.booking.request_segment(ride_id, req, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

async fn my_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.booking.my_bookings(user.id).await?))
}

async fn get_reservation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.booking.reservation_for_passenger(user.id, id).await?))
}

async fn confirm(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    body: Result<Option<Json<DecisionBody>>, JsonRejection>,
) -> Result<Json<Reservation>, AppError> {
    let body = body?.map(|Json(b)| b).unwrap_or_default();
    let reservation = state
        .booking
        .confirm(user.id, id, body.message.as_deref(), Utc::now())
        .await?;
    Ok(Json(reservation))
}

async fn reject(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    body: Result<Option<Json<DecisionBody>>, JsonRejection>,
) -> Result<Json<Reservation>, AppError> {
    let body = body?.map(|Json(b)| b).unwrap_or_default();
    let reservation = state
        .booking
        .reject(user.id, id, body.message.as_deref())
        .await?;
    Ok(Json(reservation))
}

async fn driver_inbox(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.booking.driver_inbox(user.id).await?))
}
