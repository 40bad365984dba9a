use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::city::CityName;
use crate::range::LegRange;
use crate::CoreResult;

/// A published multi-stop ride. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub driver_id: Uuid,
    /// Departure first, arrival last, intermediate stops in between.
    pub path: Vec<CityName>,
    pub departure_time: DateTime<Utc>,
    pub total_seats: i32,
    /// Flat per-seat price, used for any leg without its own price.
    pub price_per_seat: i32,
    /// One entry per leg; `None` means "use `price_per_seat`".
    pub leg_prices: Vec<Option<i32>>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Ride {
    pub fn leg_count(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Cities strictly between departure and arrival.
    pub fn intermediate_stops(&self) -> &[CityName] {
        if self.path.len() <= 2 {
            &[]
        } else {
            &self.path[1..self.path.len() - 1]
        }
    }

    pub fn intermediate_stop_count(&self) -> usize {
        self.intermediate_stops().len()
    }

    /// "Paris -> Poitiers -> Madrid"
    pub fn route_display(&self) -> String {
        self.path
            .iter()
            .map(CityName::display)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Validates `[from, to)` against this ride's path.
    pub fn leg_range(&self, from: i32, to: i32) -> CoreResult<LegRange> {
        LegRange::new(from, to, self.leg_count())
    }

    pub fn full_range(&self) -> Option<LegRange> {
        LegRange::full(self.leg_count())
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.driver_id == user_id
    }

    pub fn has_departed(&self, now: DateTime<Utc>) -> bool {
        self.departure_time <= now
    }
}
