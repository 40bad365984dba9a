use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::reservation::{Reservation, ReservationStatus};
use crate::ride::Ride;

pub type RepoResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Outcome of a conditional status write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Applied,
    /// No reservation with that id
    Missing,
    /// Someone else decided first; carries the status found
    NotPending(ReservationStatus),
}

/// Repository trait for ride data access
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn insert_ride(&self, ride: &Ride) -> RepoResult<Uuid>;

    async fn find_ride(&self, id: Uuid) -> RepoResult<Option<Ride>>;

    /// Rides departing in `[start, end)`, earliest first.
    async fn find_rides_departing_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepoResult<Vec<Ride>>;

    /// Rides departing after `after`, earliest first.
    async fn find_upcoming_rides(&self, after: DateTime<Utc>, limit: i64) -> RepoResult<Vec<Ride>>;

    async fn find_rides_by_driver(&self, driver_id: Uuid) -> RepoResult<Vec<Ride>>;
}

/// Repository trait for reservation data access
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn insert_reservation(&self, reservation: &Reservation) -> RepoResult<Uuid>;

    async fn find_reservation(&self, id: Uuid) -> RepoResult<Option<Reservation>>;

    async fn find_confirmed_reservations_for_ride(&self, ride_id: Uuid) -> RepoResult<Vec<Reservation>>;

    async fn find_reservations_for_ride(&self, ride_id: Uuid) -> RepoResult<Vec<Reservation>>;

    /// Newest first.
    async fn find_reservations_for_passenger(&self, passenger_id: Uuid) -> RepoResult<Vec<Reservation>>;

    /// Writes the decision only if the row is still PENDING.
    async fn update_reservation_status(
        &self,
        id: Uuid,
        status: ReservationStatus,
        driver_message: &str,
        ticket_code: Option<&str>,
    ) -> RepoResult<StatusUpdate>;
}

/// Optional cache of per-leg confirmed seat usage for a ride.
///
/// Any change to a ride's confirmed set must call `invalidate_leg_usage`.
#[async_trait]
pub trait LegUsageCache: Send + Sync {
    async fn get_leg_usage(&self, ride_id: Uuid) -> RepoResult<Option<Vec<i32>>>;

    async fn set_leg_usage(&self, ride_id: Uuid, usage: &[i32]) -> RepoResult<()>;

    async fn invalidate_leg_usage(&self, ride_id: Uuid) -> RepoResult<()>;
}
