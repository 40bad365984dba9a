//! Reservation state machine.
//!
//! Every transition here is a pure decision over already loaded state: it
//! either returns the new state to persist or an error, never both. Callers
//! are responsible for holding the ride lock between loading that state and
//! writing the result back.

use chrono::{DateTime, Utc};
use covoit_catalog::{LegUsage, SegmentPricer};
use covoit_core::{CoreError, CoreResult, LegRange, Reservation, ReservationStatus, Ride};
use uuid::Uuid;

use crate::ticket::generate_ticket_code;

pub const DEFAULT_CONFIRM_MESSAGE: &str = "Your reservation is confirmed. Please be on time.";
pub const DEFAULT_REJECT_MESSAGE: &str = "Your reservation has been declined.";

/// A passenger asking for seats on `[from_index, to_index)` of a ride
#[derive(Debug, Clone)]
pub struct SegmentRequest {
    pub passenger_id: Uuid,
    pub from_index: i32,
    pub to_index: i32,
    pub seats: i32,
    /// Wins over the computed price when positive
    pub unit_price: Option<i32>,
}

/// Outcome of a driver decision, to be written back as one update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: ReservationStatus,
    pub driver_message: String,
    pub ticket_code: Option<String>,
}

/// Builds a PENDING reservation, checking capacity against `confirmed`.
pub fn request(
    ride: &Ride,
    confirmed: &[Reservation],
    req: &SegmentRequest,
    now: DateTime<Utc>,
) -> CoreResult<Reservation> {
    if req.passenger_id.is_nil() {
        return Err(CoreError::Unauthorized(
            "You must be signed in to book a ride".to_string(),
        ));
    }
    if ride.is_owned_by(req.passenger_id) {
        return Err(CoreError::ValidationError(
            "You cannot book your own ride".to_string(),
        ));
    }
    if ride.has_departed(now) {
        return Err(CoreError::ValidationError(
            "This ride can no longer be booked (departure has passed)".to_string(),
        ));
    }

    let leg_count = ride.leg_count();
    let range = LegRange::new(req.from_index, req.to_index, leg_count)?;

    if req.seats <= 0 {
        return Err(CoreError::ValidationError(
            "Seat count must be greater than zero".to_string(),
        ));
    }

    let remaining = LegUsage::from_reservations(leg_count, confirmed).remaining(ride.total_seats, range);
    if remaining < req.seats {
        return Err(CoreError::CapacityExceeded {
            requested: req.seats,
            remaining,
        });
    }

    let unit_price = match req.unit_price {
        Some(price) if price > 0 => price,
        _ => SegmentPricer::for_ride(ride).unit_price_for_segment(req.from_index, req.to_index),
    };
    let total_price = unit_price
        .checked_mul(req.seats)
        .ok_or_else(|| CoreError::ValidationError("Total price is too large".to_string()))?;

    Ok(Reservation {
        id: Uuid::new_v4(),
        ride_id: ride.id,
        passenger_id: req.passenger_id,
        seats: req.seats,
        from_index: Some(range.from_index() as i32),
        to_index: Some(range.to_index() as i32),
        from_city: ride.path.get(range.from_index()).cloned(),
        to_city: ride.path.get(range.to_index()).cloned(),
        price_per_seat: unit_price,
        total_price,
        status: ReservationStatus::Pending,
        driver_message: None,
        ticket_code: None,
        created_at: now,
    })
}

/// PENDING -> CONFIRMED, re-checking capacity against every other confirmed
/// reservation of the ride.
pub fn confirm(
    ride: &Ride,
    reservation: &Reservation,
    confirmed: &[Reservation],
    driver_id: Uuid,
    message: Option<&str>,
    now: DateTime<Utc>,
) -> CoreResult<StatusChange> {
    check_decision(ride, reservation, driver_id, ReservationStatus::Confirmed)?;

    let leg_count = ride.leg_count();
    // Rows without a usable range are treated as booking the whole ride.
    let range = reservation
        .leg_range(leg_count)
        .or_else(|| LegRange::full(leg_count))
        .ok_or_else(|| CoreError::InternalError(format!("Ride {} has no legs", ride.id)))?;

    let usage = LegUsage::excluding(leg_count, confirmed, reservation.id);
    let remaining = usage.remaining(ride.total_seats, range);
    if remaining < reservation.seats {
        return Err(CoreError::CapacityExceeded {
            requested: reservation.seats,
            remaining,
        });
    }

    Ok(StatusChange {
        status: ReservationStatus::Confirmed,
        driver_message: message_or(message, DEFAULT_CONFIRM_MESSAGE),
        ticket_code: Some(generate_ticket_code(reservation.id, now)),
    })
}

/// PENDING -> REJECTED. No capacity check, no ticket.
pub fn reject(
    ride: &Ride,
    reservation: &Reservation,
    driver_id: Uuid,
    message: Option<&str>,
) -> CoreResult<StatusChange> {
    check_decision(ride, reservation, driver_id, ReservationStatus::Rejected)?;

    Ok(StatusChange {
        status: ReservationStatus::Rejected,
        driver_message: message_or(message, DEFAULT_REJECT_MESSAGE),
        ticket_code: None,
    })
}

fn check_decision(
    ride: &Ride,
    reservation: &Reservation,
    driver_id: Uuid,
    target: ReservationStatus,
) -> CoreResult<()> {
    if reservation.ride_id != ride.id || !ride.is_owned_by(driver_id) {
        return Err(CoreError::Unauthorized(
            "Only the driver of this ride can decide on its reservations".to_string(),
        ));
    }
    if reservation.status.is_terminal() {
        return Err(CoreError::InvalidTransition {
            from: reservation.status.to_string(),
            to: target.to_string(),
        });
    }
    Ok(())
}

fn message_or(message: Option<&str>, default: &str) -> String {
    match message.map(str::trim) {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => default.to_string(),
    }
}
