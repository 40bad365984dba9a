use covoit_core::{CoreResult, LegRange, Ride};

/// Per-seat pricing of any run of legs on a ride path
#[derive(Debug, Clone, Copy)]
pub struct SegmentPricer<'a> {
    leg_count: usize,

    /// Per-leg prices; missing or non-positive entries fall back to `flat_price`
    leg_prices: &'a [Option<i32>],

    /// Flat price charged for each leg without its own price
    flat_price: i32,
}

impl<'a> SegmentPricer<'a> {
    pub fn new(leg_count: usize, leg_prices: &'a [Option<i32>], flat_price: i32) -> Self {
        Self {
            leg_count,
            leg_prices,
            flat_price,
        }
    }

    pub fn for_ride(ride: &'a Ride) -> Self {
        Self::new(ride.leg_count(), &ride.leg_prices, ride.price_per_seat)
    }

    /// Price of one leg
    pub fn leg_price(&self, leg: usize) -> i32 {
        match self.leg_prices.get(leg).copied().flatten() {
            Some(price) if price > 0 => price,
            _ => self.flat_price,
        }
    }

    /// Per-seat price of `[from, to)`; an inconsistent range is an `InvalidRange` error
    pub fn price_for_segment(&self, from: i32, to: i32) -> CoreResult<i32> {
        let range = LegRange::new(from, to, self.leg_count)?;
        Ok(self.price_for_range(range))
    }

    /// Sum of the leg prices over an already validated range
    pub fn price_for_range(&self, range: LegRange) -> i32 {
        range
            .legs()
            .map(|leg| self.leg_price(leg))
            .fold(0i32, i32::saturating_add)
    }

    /// Like `price_for_segment`, but never hands back a missing or
    /// non-positive price: those become the flat price.
    pub fn unit_price_for_segment(&self, from: i32, to: i32) -> i32 {
        match self.price_for_segment(from, to) {
            Ok(price) if price > 0 => price,
            _ => self.flat_price,
        }
    }
}
