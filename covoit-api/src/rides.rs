use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use covoit_catalog::{parse_stops, RideDraft};
use covoit_core::Ride;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/rides", get(list_rides).post(create_ride))
        .route("/v1/rides/{id}", get(get_ride))
        .route("/v1/rides/{id}/availability", get(availability))
        .route("/v1/rides/{id}/quote", get(quote))
        .route("/v1/driver/rides", get(my_rides))
}

/// Stops as typed in a text area, or already split
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StopsInput {
    Text(String),
    List(Vec<String>),
}

impl Default for StopsInput {
    fn default() -> Self {
        StopsInput::List(Vec::new())
    }
}

impl StopsInput {
    fn into_list(self) -> Vec<String> {
        match self {
            StopsInput::Text(raw) => parse_stops(&raw),
            StopsInput::List(list) => list,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRideRequest {
    pub departure_city: String,
    pub arrival_city: String,
    pub departure_time: Option<DateTime<Utc>>,
    pub total_seats: i32,
    pub price_per_seat: i32,
    pub description: Option<String>,
    #[serde(default)]
    pub stops: StopsInput,
    #[serde(default)]
    pub leg_prices: Vec<Option<i32>>,
}

#[derive(Debug, Serialize)]
pub struct RideView {
    #[serde(flatten)]
    pub ride: Ride,
    pub route: String,
    pub intermediate_stops: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seats: Option<i32>,
}

impl RideView {
    fn new(ride: Ride, remaining_seats: Option<i32>) -> Self {
        Self {
            route: ride.route_display(),
            intermediate_stops: ride.intermediate_stop_count(),
            remaining_seats,
            ride,
        }
    }
}

async fn create_ride(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateRideRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RideView>), AppError> {
    let Json(req) = payload?;
    let draft = RideDraft {
        driver_id: user.id,
        departure_city: req.departure_city,
        arrival_city: req.arrival_city,
        departure_time: req.departure_time,
        total_seats: req.total_seats,
        price_per_seat: req.price_per_seat,
        description: req.description,
        stops: req.stops.into_list(),
        leg_prices: req.leg_prices,
    };

    let ride = state.catalog.create_ride(draft, Utc::now()).await?;
    let seats = ride.total_seats;
    Ok((StatusCode::CREATED, Json(RideView::new(ride, Some(seats)))))
}

async fn my_rides(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<RideView>>, AppError> {
    let rides = state.catalog.rides_for_driver(user.id).await?;
    Ok(Json(rides.into_iter().map(|r| RideView::new(r, None)).collect()))
}

#[derive(Debug, Deserialize)]
pub struct RideListQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

/// Search when any of `from`, `to`, `date` is given, latest rides otherwise.
async fn list_rides(
    State(state): State<AppState>,
    query: Result<Query<RideListQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    if query.from.is_none() && query.to.is_none() && query.date.is_none() {
        let rides = state
            .catalog
            .latest_rides(query.limit.unwrap_or(0), Utc::now())
            .await?;
        let views: Vec<RideView> = rides.into_iter().map(|r| RideView::new(r, None)).collect();
        return Ok(Json(views).into_response());
    }

    let date = query
        .date
        .ok_or_else(|| AppError::ValidationError("A travel date is required".to_string()))?;
    let hits = state
        .catalog
        .search_rides(
            query.from.as_deref().unwrap_or_default(),
            query.to.as_deref().unwrap_or_default(),
            date,
        )
        .await?;
    Ok(Json(hits).into_response())
}

async fn get_ride(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RideView>, AppError> {
    let ride = state.catalog.get_ride(id).await?;
    let remaining = state.booking.remaining_seats_full(id).await?;
    Ok(Json(RideView::new(ride, Some(remaining))))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub from_index: i32,
    pub to_index: i32,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub ride_id: Uuid,
    pub from_index: i32,
    pub to_index: i32,
    pub remaining_seats: i32,
}

async fn availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let Query(query) = query?;
    let remaining_seats = state
        .booking
        .remaining_seats(id, query.from_index, query.to_index)
        .await?;

    Ok(Json(AvailabilityResponse {
        ride_id: id,
        from_index: query.from_index,
        to_index: query.to_index,
        remaining_seats,
    }))
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub from: String,
    pub to: String,
}

async fn quote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    query: Result<Query<QuoteQuery>, QueryRejection>,
) -> Result<Json<covoit_catalog::SegmentQuote>, AppError> {
    let Query(query) = query?;
    let quote = state.catalog.quote_segment(id, &query.from, &query.to).await?;
    Ok(Json(quote))
}
