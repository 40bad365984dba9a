use covoit_core::{CoreResult, LegRange, Reservation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Confirmed seats per leg of one ride
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegUsage {
    used: Vec<i32>,
}

impl LegUsage {
    pub fn empty(leg_count: usize) -> Self {
        Self {
            used: vec![0; leg_count],
        }
    }

    /// Sweep over the legs of every CONFIRMED reservation with a valid range.
    pub fn from_reservations<'a, I>(leg_count: usize, reservations: I) -> Self
    where
        I: IntoIterator<Item = &'a Reservation>,
    {
        let mut usage = Self::empty(leg_count);
        for reservation in reservations {
            if !reservation.is_confirmed() {
                continue;
            }
            // Ranges that don't fit this path are ignored.
            if let Some(range) = reservation.leg_range(leg_count) {
                usage.add(range, reservation.seats);
            }
        }
        usage
    }

    /// Same as `from_reservations`, skipping the reservation with id `exclude`.
    pub fn excluding<'a, I>(leg_count: usize, reservations: I, exclude: Uuid) -> Self
    where
        I: IntoIterator<Item = &'a Reservation>,
    {
        Self::from_reservations(
            leg_count,
            reservations.into_iter().filter(move |r| r.id != exclude),
        )
    }

    /// Restores a usage table read back from a cache.
    pub fn from_legs(used: Vec<i32>) -> Self {
        Self { used }
    }

    pub fn add(&mut self, range: LegRange, seats: i32) {
        for leg in range.legs() {
            if let Some(slot) = self.used.get_mut(leg) {
                *slot = slot.saturating_add(seats);
            }
        }
    }

    pub fn leg_count(&self) -> usize {
        self.used.len()
    }

    pub fn legs(&self) -> &[i32] {
        &self.used
    }

    /// Usage of the bottleneck leg in `range`.
    pub fn peak(&self, range: LegRange) -> i32 {
        range
            .legs()
            .filter_map(|leg| self.used.get(leg).copied())
            .max()
            .unwrap_or(0)
    }

    /// Seats still free on every leg of `range`, floored at zero.
    pub fn remaining(&self, total_seats: i32, range: LegRange) -> i32 {
        total_seats.saturating_sub(self.peak(range)).max(0)
    }
}

/// Free seats on `[from, to)` of a ride with `leg_count` legs given its
/// reservations. Only CONFIRMED reservations consume capacity.
pub fn remaining_seats(
    total_seats: i32,
    leg_count: usize,
    reservations: &[Reservation],
    from: i32,
    to: i32,
) -> CoreResult<i32> {
    let range = LegRange::new(from, to, leg_count)?;
    Ok(LegUsage::from_reservations(leg_count, reservations).remaining(total_seats, range))
}
