use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use covoit_core::repository::{RepoResult, ReservationRepository, RideRepository, StatusUpdate};
use covoit_core::{Reservation, ReservationStatus, Ride};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    rides: HashMap<Uuid, Ride>,
    reservations: HashMap<Uuid, Reservation>,
}

/// Process-local store backing both repositories.
///
/// Clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_departure(mut rides: Vec<Ride>) -> Vec<Ride> {
    rides.sort_by(|a, b| a.departure_time.cmp(&b.departure_time).then(a.id.cmp(&b.id)));
    rides
}

#[async_trait]
impl RideRepository for InMemoryStore {
    async fn insert_ride(&self, ride: &Ride) -> RepoResult<Uuid> {
        let mut tables = self.tables.write().await;
        if tables.rides.contains_key(&ride.id) {
            return Err(format!("ride {} already exists", ride.id).into());
        }
        tables.rides.insert(ride.id, ride.clone());
        Ok(ride.id)
    }

    async fn find_ride(&self, id: Uuid) -> RepoResult<Option<Ride>> {
        Ok(self.tables.read().await.rides.get(&id).cloned())
    }

    async fn find_rides_departing_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepoResult<Vec<Ride>> {
        let tables = self.tables.read().await;
        let rides = tables
            .rides
            .values()
            .filter(|r| r.departure_time >= start && r.departure_time < end)
            .cloned()
            .collect();
        Ok(by_departure(rides))
    }

    async fn find_upcoming_rides(&self, after: DateTime<Utc>, limit: i64) -> RepoResult<Vec<Ride>> {
        let tables = self.tables.read().await;
        let rides = tables
            .rides
            .values()
            .filter(|r| r.departure_time > after)
            .cloned()
            .collect();
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(by_departure(rides).into_iter().take(limit).collect())
    }

    async fn find_rides_by_driver(&self, driver_id: Uuid) -> RepoResult<Vec<Ride>> {
        let tables = self.tables.read().await;
        let rides = tables
            .rides
            .values()
            .filter(|r| r.driver_id == driver_id)
            .cloned()
            .collect();
        Ok(by_departure(rides))
    }
}

#[async_trait]
impl ReservationRepository for InMemoryStore {
    async fn insert_reservation(&self, reservation: &Reservation) -> RepoResult<Uuid> {
        let mut tables = self.tables.write().await;
        if !tables.rides.contains_key(&reservation.ride_id) {
            return Err(format!("ride {} does not exist", reservation.ride_id).into());
        }
        tables.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation.id)
    }

    async fn find_reservation(&self, id: Uuid) -> RepoResult<Option<Reservation>> {
        Ok(self.tables.read().await.reservations.get(&id).cloned())
    }

    async fn find_confirmed_reservations_for_ride(&self, ride_id: Uuid) -> RepoResult<Vec<Reservation>> {
        let all = self.find_reservations_for_ride(ride_id).await?;
        Ok(all.into_iter().filter(Reservation::is_confirmed).collect())
    }

    async fn find_reservations_for_ride(&self, ride_id: Uuid) -> RepoResult<Vec<Reservation>> {
        let tables = self.tables.read().await;
        let mut found: Vec<Reservation> = tables
            .reservations
            .values()
            .filter(|r| r.ride_id == ride_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(found)
    }

    async fn find_reservations_for_passenger(&self, passenger_id: Uuid) -> RepoResult<Vec<Reservation>> {
        let tables = self.tables.read().await;
        let mut found: Vec<Reservation> = tables
            .reservations
            .values()
            .filter(|r| r.passenger_id == passenger_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn update_reservation_status(
        &self,
        id: Uuid,
        status: ReservationStatus,
        driver_message: &str,
        ticket_code: Option<&str>,
    ) -> RepoResult<StatusUpdate> {
        let mut tables = self.tables.write().await;
        let Some(reservation) = tables.reservations.get_mut(&id) else {
            return Ok(StatusUpdate::Missing);
        };
        if reservation.status.is_terminal() {
            return Ok(StatusUpdate::NotPending(reservation.status));
        }
        reservation.status = status;
        reservation.driver_message = Some(driver_message.to_string());
        reservation.ticket_code = ticket_code.map(str::to_string);
        Ok(StatusUpdate::Applied)
    }
}
