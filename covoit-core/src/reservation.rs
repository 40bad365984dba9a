use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::city::CityName;
use crate::range::LegRange;

/// Reservation status in the request/confirm lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Rejected,
    /// Terminal; no operation currently leads here.
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Rejected => "REJECTED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Pending)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown reservation status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ReservationStatus {
    type Err = UnknownStatus;

    /// Case-insensitive, so rows written by older clients still load.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ReservationStatus::Pending),
            "CONFIRMED" => Ok(ReservationStatus::Confirmed),
            "REJECTED" => Ok(ReservationStatus::Rejected),
            "CANCELLED" => Ok(ReservationStatus::Cancelled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// A passenger's request for seats on `[from_index, to_index)` of a ride.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub passenger_id: Uuid,
    pub seats: i32,
    /// Absent only on rows written before segment booking existed.
    pub from_index: Option<i32>,
    pub to_index: Option<i32>,
    pub from_city: Option<CityName>,
    pub to_city: Option<CityName>,
    pub price_per_seat: i32,
    pub total_price: i32,
    pub status: ReservationStatus,
    pub driver_message: Option<String>,
    pub ticket_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// The stored range, if present and valid for a path with `leg_count` legs.
    pub fn leg_range(&self, leg_count: usize) -> Option<LegRange> {
        match (self.from_index, self.to_index) {
            (Some(from), Some(to)) => LegRange::new(from, to, leg_count).ok(),
            _ => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == ReservationStatus::Confirmed
    }

    pub fn belongs_to(&self, passenger_id: Uuid) -> bool {
        self.passenger_id == passenger_id
    }
}
