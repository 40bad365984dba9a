use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use covoit_core::repository::{ReservationRepository, RideRepository};
use covoit_core::{CityName, CoreError, CoreResult, LegRange, Ride};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::inventory::LegUsage;
use crate::path::locate_segment;
use crate::pricing::SegmentPricer;
use crate::validation::{validate_ride, RideDraft};

/// A ride matching a search, with the segment the passenger asked for
#[derive(Debug, Clone, Serialize)]
pub struct RideMatch {
    pub ride: Ride,
    pub from_index: usize,
    pub to_index: usize,
    pub unit_price: i32,
    pub remaining_seats: i32,
}

/// What a passenger would get by booking `from_city` -> `to_city` on a ride
#[derive(Debug, Clone, Serialize)]
pub struct SegmentQuote {
    pub ride_id: Uuid,
    pub from_city: CityName,
    pub to_city: CityName,
    pub from_index: usize,
    pub to_index: usize,
    pub intermediate_stops: usize,
    pub is_sub_ride: bool,
    pub remaining_seats: i32,
    pub unit_price: i32,
}

/// Publishing and browsing rides
pub struct RideCatalog {
    rides: Arc<dyn RideRepository>,
    reservations: Arc<dyn ReservationRepository>,
    default_limit: i64,
}

impl RideCatalog {
    pub fn new(
        rides: Arc<dyn RideRepository>,
        reservations: Arc<dyn ReservationRepository>,
        default_limit: i64,
    ) -> Self {
        Self {
            rides,
            reservations,
            default_limit,
        }
    }

    pub async fn create_ride(&self, draft: RideDraft, now: DateTime<Utc>) -> CoreResult<Ride> {
        let ride = validate_ride(draft, now)?;
        self.rides.insert_ride(&ride).await?;
        info!(
            "Ride {} published by {}: {} ({} seats)",
            ride.id,
            ride.driver_id,
            ride.route_display(),
            ride.total_seats
        );
        Ok(ride)
    }

    pub async fn get_ride(&self, ride_id: Uuid) -> CoreResult<Ride> {
        self.rides
            .find_ride(ride_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Ride {}", ride_id)))
    }

    /// Rides departing on `date` (UTC) that pass through `from_city` and then `to_city`.
    pub async fn search_rides(
        &self,
        from_city: &str,
        to_city: &str,
        date: NaiveDate,
    ) -> CoreResult<Vec<RideMatch>> {
        if from_city.trim().is_empty() || to_city.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Both departure and arrival cities are required".to_string(),
            ));
        }

        let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);
        let candidates = self.rides.find_rides_departing_between(start, end).await?;

        let mut matches = Vec::new();
        for ride in candidates {
            let Some((from, to)) = locate_segment(&ride.path, from_city, to_city) else {
                continue;
            };
            let range = LegRange::new(from as i32, to as i32, ride.leg_count())?;
            let usage = self.leg_usage(&ride).await?;
            let unit_price = SegmentPricer::for_ride(&ride).unit_price_for_segment(from as i32, to as i32);

            matches.push(RideMatch {
                remaining_seats: usage.remaining(ride.total_seats, range),
                unit_price,
                from_index: from,
                to_index: to,
                ride,
            });
        }

        debug!(
            "Search {} -> {} on {}: {} ride(s)",
            from_city,
            to_city,
            date,
            matches.len()
        );
        Ok(matches)
    }

    /// Upcoming rides, soonest first. A non-positive `limit` uses the configured default.
    pub async fn latest_rides(&self, limit: i64, now: DateTime<Utc>) -> CoreResult<Vec<Ride>> {
        let limit = if limit > 0 { limit } else { self.default_limit };
        Ok(self.rides.find_upcoming_rides(now, limit).await?)
    }

    /// Rides published by `driver_id`, soonest departure first.
    pub async fn rides_for_driver(&self, driver_id: Uuid) -> CoreResult<Vec<Ride>> {
        Ok(self.rides.find_rides_by_driver(driver_id).await?)
    }

    pub async fn quote_segment(
        &self,
        ride_id: Uuid,
        from_city: &str,
        to_city: &str,
    ) -> CoreResult<SegmentQuote> {
        let ride = self.get_ride(ride_id).await?;
        let leg_count = ride.leg_count();

        let (from, to) = locate_segment(&ride.path, from_city, to_city).ok_or(
            CoreError::InvalidRange {
                from: -1,
                to: -1,
                leg_count,
            },
        )?;
        let range = LegRange::new(from as i32, to as i32, leg_count)?;
        let usage = self.leg_usage(&ride).await?;

        Ok(SegmentQuote {
            ride_id: ride.id,
            from_city: ride.path[from].clone(),
            to_city: ride.path[to].clone(),
            from_index: from,
            to_index: to,
            intermediate_stops: to - from - 1,
            is_sub_ride: !range.is_full(leg_count),
            remaining_seats: usage.remaining(ride.total_seats, range),
            unit_price: SegmentPricer::for_ride(&ride).unit_price_for_segment(from as i32, to as i32),
        })
    }

    async fn leg_usage(&self, ride: &Ride) -> CoreResult<LegUsage> {
        let confirmed = self
            .reservations
            .find_confirmed_reservations_for_ride(ride.id)
            .await?;
        Ok(LegUsage::from_reservations(ride.leg_count(), &confirmed))
    }
}
