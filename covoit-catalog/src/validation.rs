use chrono::{DateTime, Utc};
use covoit_core::{CoreError, CoreResult, Ride};
use serde::Deserialize;
use uuid::Uuid;

use crate::path::{build_path, parse_stops};

/// Raw ride creation input, as typed by the driver
#[derive(Debug, Clone, Deserialize)]
pub struct RideDraft {
    pub driver_id: Uuid,
    pub departure_city: String,
    pub arrival_city: String,
    pub departure_time: Option<DateTime<Utc>>,
    pub total_seats: i32,
    pub price_per_seat: i32,
    pub description: Option<String>,
    /// Each entry may itself hold several cities separated by newlines, `;` or `,`.
    pub stops: Vec<String>,
    /// Positional per-leg prices; `None` or missing entries mean "use the flat price".
    pub leg_prices: Vec<Option<i32>>,
}

/// Validates a draft and turns it into a ride ready to be stored.
pub fn validate_ride(draft: RideDraft, now: DateTime<Utc>) -> CoreResult<Ride> {
    if draft.driver_id.is_nil() {
        return Err(invalid("You must be signed in to publish a ride"));
    }
    if draft.departure_city.trim().is_empty() {
        return Err(invalid("Departure city is required"));
    }
    if draft.arrival_city.trim().is_empty() {
        return Err(invalid("Arrival city is required"));
    }

    let departure_time = draft
        .departure_time
        .ok_or_else(|| invalid("Departure date and time are required"))?;
    if departure_time <= now {
        return Err(invalid("Departure must be in the future"));
    }

    if draft.total_seats <= 0 {
        return Err(invalid("Seat count must be greater than zero"));
    }
    if draft.price_per_seat < 0 {
        return Err(invalid("Price per seat cannot be negative"));
    }
    if draft.leg_prices.iter().flatten().any(|p| *p < 0) {
        return Err(invalid("Leg prices cannot be negative"));
    }

    let stops: Vec<String> = draft.stops.iter().flat_map(|s| parse_stops(s)).collect();
    let path = build_path(&draft.departure_city, &stops, &draft.arrival_city);
    if path.len() < 2 {
        return Err(invalid("A ride needs at least two different cities"));
    }

    let leg_count = path.len() - 1;
    let leg_prices = (0..leg_count)
        .map(|leg| draft.leg_prices.get(leg).copied().flatten())
        .collect();

    let description = draft
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    Ok(Ride {
        id: Uuid::new_v4(),
        driver_id: draft.driver_id,
        path,
        departure_time,
        total_seats: draft.total_seats,
        price_per_seat: draft.price_per_seat,
        leg_prices,
        description,
        created_at: now,
    })
}

fn invalid(msg: &str) -> CoreError {
    CoreError::ValidationError(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft() -> RideDraft {
        RideDraft {
            driver_id: Uuid::new_v4(),
            departure_city: "paris".to_string(),
            arrival_city: "madrid".to_string(),
            departure_time: Some(Utc::now() + Duration::days(2)),
            total_seats: 3,
            price_per_seat: 100,
            description: Some("  No smoking  ".to_string()),
            stops: vec!["poitiers; bordeaux".to_string()],
            leg_prices: vec![Some(40), None],
        }
    }

    fn assert_invalid(result: CoreResult<Ride>) {
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_valid_ride() {
        let ride = validate_ride(draft(), Utc::now()).unwrap();
        assert_eq!(ride.route_display(), "Paris -> Poitiers -> Bordeaux -> Madrid");
        assert_eq!(ride.leg_prices, vec![Some(40), None, None]);
        assert_eq!(ride.description.as_deref(), Some("No smoking"));
    }

    #[test]
    fn test_extra_leg_prices_are_dropped() {
        let mut d = draft();
        d.stops.clear();
        d.leg_prices = vec![Some(90), Some(10), Some(5)];
        let ride = validate_ride(d, Utc::now()).unwrap();
        assert_eq!(ride.leg_prices, vec![Some(90)]);
    }

    #[test]
    fn test_missing_owner() {
        let mut d = draft();
        d.driver_id = Uuid::nil();
        assert_invalid(validate_ride(d, Utc::now()));
    }

    #[test]
    fn test_blank_cities() {
        let mut d = draft();
        d.departure_city = "  ".to_string();
        assert_invalid(validate_ride(d, Utc::now()));

        let mut d = draft();
        d.arrival_city = String::new();
        assert_invalid(validate_ride(d, Utc::now()));
    }

    #[test]
    fn test_departure_must_be_future() {
        let now = Utc::now();
        let mut d = draft();
        d.departure_time = Some(now - Duration::hours(1));
        assert_invalid(validate_ride(d, now));

        let mut d = draft();
        d.departure_time = None;
        assert_invalid(validate_ride(d, now));
    }

    #[test]
    fn test_seats_and_prices() {
        let mut d = draft();
        d.total_seats = 0;
        assert_invalid(validate_ride(d, Utc::now()));

        let mut d = draft();
        d.price_per_seat = -1;
        assert_invalid(validate_ride(d, Utc::now()));

        let mut d = draft();
        d.leg_prices = vec![Some(10), Some(-5)];
        assert_invalid(validate_ride(d, Utc::now()));

        let mut d = draft();
        d.price_per_seat = 0;
        assert!(validate_ride(d, Utc::now()).is_ok());
    }

    #[test]
    fn test_single_city_path_is_rejected() {
        let mut d = draft();
        d.arrival_city = "PARIS".to_string();
        d.stops.clear();
        assert_invalid(validate_ride(d, Utc::now()));
    }
}
