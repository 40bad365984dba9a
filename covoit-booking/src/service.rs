use std::sync::Arc;

use chrono::{DateTime, Utc};
use covoit_catalog::LegUsage;
use covoit_core::repository::{LegUsageCache, ReservationRepository, RideRepository, StatusUpdate};
use covoit_core::{CoreError, CoreResult, LegRange, Reservation, Ride};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::lifecycle::{self, SegmentRequest, StatusChange};
use crate::locks::RideLocks;

/// A reservation shown together with its ride
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub reservation: Reservation,
    /// Absent if the ride has since been removed
    pub ride: Option<Ride>,
}

/// Seat requests and driver decisions on rides.
pub struct BookingService {
    rides: Arc<dyn RideRepository>,
    reservations: Arc<dyn ReservationRepository>,
    usage_cache: Option<Arc<dyn LegUsageCache>>,
    locks: RideLocks,
}

impl BookingService {
    pub fn new(rides: Arc<dyn RideRepository>, reservations: Arc<dyn ReservationRepository>) -> Self {
        Self {
            rides,
            reservations,
            usage_cache: None,
            locks: RideLocks::new(),
        }
    }

    pub fn with_usage_cache(mut self, cache: Arc<dyn LegUsageCache>) -> Self {
        self.usage_cache = Some(cache);
        self
    }

    async fn load_ride(&self, ride_id: Uuid) -> CoreResult<Ride> {
        self.rides
            .find_ride(ride_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Ride {}", ride_id)))
    }

    async fn load_reservation(&self, reservation_id: Uuid) -> CoreResult<Reservation> {
        self.reservations
            .find_reservation(reservation_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Reservation {}", reservation_id)))
    }

    /// Creates a PENDING reservation on `[from_index, to_index)`.
    pub async fn request_segment(
        &self,
        ride_id: Uuid,
        req: SegmentRequest,
        now: DateTime<Utc>,
    ) -> CoreResult<Reservation> {
        let _guard = self.locks.acquire(ride_id).await;

        let ride = self.load_ride(ride_id).await?;
        let confirmed = self
            .reservations
            .find_confirmed_reservations_for_ride(ride.id)
            .await?;

        let reservation = lifecycle::request(&ride, &confirmed, &req, now).inspect_err(|e| {
            warn!("Segment request on ride {} refused: {}", ride.id, e);
        })?;
        self.reservations.insert_reservation(&reservation).await?;

        info!(
            "Reservation {} requested by {} on ride {} [{}, {}) x{}",
            reservation.id, reservation.passenger_id, ride.id, req.from_index, req.to_index, req.seats
        );
        Ok(reservation)
    }

    /// Driver accepts a PENDING reservation. Capacity is checked again here.
    pub async fn confirm(
        &self,
        driver_id: Uuid,
        reservation_id: Uuid,
        message: Option<&str>,
        now: DateTime<Utc>,
    ) -> CoreResult<Reservation> {
        let ride_id = self.load_reservation(reservation_id).await?.ride_id;
        let _guard = self.locks.acquire(ride_id).await;

        // Re-read under the lock; the status may have moved while waiting.
        let reservation = self.load_reservation(reservation_id).await?;
        let ride = self.load_ride(ride_id).await?;
        let confirmed = self
            .reservations
            .find_confirmed_reservations_for_ride(ride.id)
            .await?;

        let change = lifecycle::confirm(&ride, &reservation, &confirmed, driver_id, message, now)
            .inspect_err(|e| warn!("Confirmation of {} refused: {}", reservation.id, e))?;
        let updated = self.apply(reservation, change).await?;
        self.invalidate_usage(ride.id).await;

        info!("Reservation {} confirmed on ride {}", updated.id, ride.id);
        Ok(updated)
    }

    /// Driver declines a PENDING reservation.
    pub async fn reject(
        &self,
        driver_id: Uuid,
        reservation_id: Uuid,
        message: Option<&str>,
    ) -> CoreResult<Reservation> {
        let ride_id = self.load_reservation(reservation_id).await?.ride_id;
        let _guard = self.locks.acquire(ride_id).await;

        let reservation = self.load_reservation(reservation_id).await?;
        let ride = self.load_ride(ride_id).await?;

        let change = lifecycle::reject(&ride, &reservation, driver_id, message)
            .inspect_err(|e| warn!("Rejection of {} refused: {}", reservation.id, e))?;
        let updated = self.apply(reservation, change).await?;

        info!("Reservation {} rejected on ride {}", updated.id, ride.id);
        Ok(updated)
    }

    /// The write only lands on a PENDING row, so a decision taken elsewhere
    /// in the meantime surfaces as `InvalidTransition`.
    async fn apply(&self, mut reservation: Reservation, change: StatusChange) -> CoreResult<Reservation> {
        let outcome = self
            .reservations
            .update_reservation_status(
                reservation.id,
                change.status,
                &change.driver_message,
                change.ticket_code.as_deref(),
            )
            .await?;

        match outcome {
            StatusUpdate::Applied => {}
            StatusUpdate::Missing => {
                return Err(CoreError::NotFound(format!("Reservation {}", reservation.id)));
            }
            StatusUpdate::NotPending(current) => {
                warn!(
                    "Reservation {} was already {} when writing {}",
                    reservation.id, current, change.status
                );
                return Err(CoreError::InvalidTransition {
                    from: current.to_string(),
                    to: change.status.to_string(),
                });
            }
        }

        reservation.status = change.status;
        reservation.driver_message = Some(change.driver_message);
        reservation.ticket_code = change.ticket_code;
        Ok(reservation)
    }

    /// Free seats on `[from_index, to_index)`, for display.
    ///
    /// May be served from the usage cache; booking decisions never are.
    pub async fn remaining_seats(&self, ride_id: Uuid, from_index: i32, to_index: i32) -> CoreResult<i32> {
        let ride = self.load_ride(ride_id).await?;
        let range = ride.leg_range(from_index, to_index)?;
        self.remaining_for(&ride, range).await
    }

    /// Free seats over the whole path.
    pub async fn remaining_seats_full(&self, ride_id: Uuid) -> CoreResult<i32> {
        let ride = self.load_ride(ride_id).await?;
        let range = ride
            .full_range()
            .ok_or(CoreError::InvalidRange {
                from: 0,
                to: 0,
                leg_count: ride.leg_count(),
            })?;
        self.remaining_for(&ride, range).await
    }

    async fn remaining_for(&self, ride: &Ride, range: LegRange) -> CoreResult<i32> {
        let usage = self.cached_usage(ride).await?;
        Ok(usage.remaining(ride.total_seats, range))
    }

    async fn cached_usage(&self, ride: &Ride) -> CoreResult<LegUsage> {
        let leg_count = ride.leg_count();
        let Some(cache) = &self.usage_cache else {
            return self.fresh_usage(ride).await;
        };

        match cache.get_leg_usage(ride.id).await {
            Ok(Some(legs)) if legs.len() == leg_count => return Ok(LegUsage::from_legs(legs)),
            Ok(_) => {}
            Err(e) => warn!("Leg usage cache read failed for ride {}: {}", ride.id, e),
        }

        // Populated under the lock so a concurrent confirm cannot be overwritten
        // by a stale computation.
        let _guard = self.locks.acquire(ride.id).await;
        let usage = self.fresh_usage(ride).await?;
        if let Err(e) = cache.set_leg_usage(ride.id, usage.legs()).await {
            warn!("Leg usage cache write failed for ride {}: {}", ride.id, e);
        }
        Ok(usage)
    }

    async fn fresh_usage(&self, ride: &Ride) -> CoreResult<LegUsage> {
        let confirmed = self
            .reservations
            .find_confirmed_reservations_for_ride(ride.id)
            .await?;
        Ok(LegUsage::from_reservations(ride.leg_count(), &confirmed))
    }

    async fn invalidate_usage(&self, ride_id: Uuid) {
        if let Some(cache) = &self.usage_cache {
            if let Err(e) = cache.invalidate_leg_usage(ride_id).await {
                warn!("Leg usage cache invalidation failed for ride {}: {}", ride_id, e);
            }
        }
    }

    /// A passenger's reservations, newest first.
    pub async fn my_bookings(&self, passenger_id: Uuid) -> CoreResult<Vec<Booking>> {
        let reservations = self
            .reservations
            .find_reservations_for_passenger(passenger_id)
            .await?;

        let mut bookings = Vec::with_capacity(reservations.len());
        for reservation in reservations {
            let ride = self.rides.find_ride(reservation.ride_id).await?;
            bookings.push(Booking { reservation, ride });
        }
        Ok(bookings)
    }

    /// Every reservation on every ride the driver owns.
    pub async fn driver_inbox(&self, driver_id: Uuid) -> CoreResult<Vec<Booking>> {
        let rides = self.rides.find_rides_by_driver(driver_id).await?;

        let mut bookings = Vec::new();
        for ride in rides {
            let reservations = self.reservations.find_reservations_for_ride(ride.id).await?;
            bookings.extend(reservations.into_iter().map(|reservation| Booking {
                reservation,
                ride: Some(ride.clone()),
            }));
        }
        Ok(bookings)
    }

    /// One of the passenger's own reservations with its ride.
    pub async fn reservation_for_passenger(
        &self,
        passenger_id: Uuid,
        reservation_id: Uuid,
    ) -> CoreResult<Booking> {
        let mut reservation = self.load_reservation(reservation_id).await?;
        if !reservation.belongs_to(passenger_id) {
            return Err(CoreError::Unauthorized(
                "This reservation belongs to another passenger".to_string(),
            ));
        }
        if !reservation.is_confirmed() {
            reservation.ticket_code = None;
        }
        let ride = self.rides.find_ride(reservation.ride_id).await?;
        Ok(Booking { reservation, ride })
    }
}
