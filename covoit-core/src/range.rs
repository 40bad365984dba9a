use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::{CoreError, CoreResult};

/// A validated half-open run of legs `[from, to)` on a path with
/// `leg_count` legs. Index `i` names the leg between path cities `i` and `i + 1`,
/// so `from` and `to` are also the indices of the boarding and drop-off cities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegRange {
    from: usize,
    to: usize,
}

impl LegRange {
    /// Checks `0 <= from < to <= leg_count`.
    pub fn new(from: i32, to: i32, leg_count: usize) -> CoreResult<Self> {
        let invalid = || CoreError::InvalidRange { from, to, leg_count };

        let from_idx = usize::try_from(from).map_err(|_| invalid())?;
        let to_idx = usize::try_from(to).map_err(|_| invalid())?;
        if to_idx <= from_idx || to_idx > leg_count {
            return Err(invalid());
        }

        Ok(Self {
            from: from_idx,
            to: to_idx,
        })
    }

    /// The whole path. `None` when the path has no leg at all.
    pub fn full(leg_count: usize) -> Option<Self> {
        (leg_count > 0).then_some(Self {
            from: 0,
            to: leg_count,
        })
    }

    pub fn from_index(&self) -> usize {
        self.from
    }

    pub fn to_index(&self) -> usize {
        self.to
    }

    pub fn leg_count(&self) -> usize {
        self.to - self.from
    }

    pub fn legs(&self) -> Range<usize> {
        self.from..self.to
    }

    /// True when the range covers every leg of a path with `leg_count` legs.
    pub fn is_full(&self, leg_count: usize) -> bool {
        self.from == 0 && self.to == leg_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_range() {
        let range = LegRange::new(1, 3, 3).unwrap();
        assert_eq!(range.from_index(), 1);
        assert_eq!(range.to_index(), 3);
        assert_eq!(range.leg_count(), 2);
        assert_eq!(range.legs().collect::<Vec<_>>(), vec![1, 2]);
        assert!(!range.is_full(3));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(matches!(LegRange::new(-1, 2, 3), Err(CoreError::InvalidRange { .. })));
        assert!(matches!(LegRange::new(2, 2, 3), Err(CoreError::InvalidRange { .. })));
        assert!(matches!(LegRange::new(2, 1, 3), Err(CoreError::InvalidRange { .. })));
        assert!(matches!(LegRange::new(0, 4, 3), Err(CoreError::InvalidRange { .. })));
    }

    #[test]
    fn test_full_range() {
        assert!(LegRange::full(0).is_none());
        let full = LegRange::full(3).unwrap();
        assert!(full.is_full(3));
        assert_eq!(full, LegRange::new(0, 3, 3).unwrap());
    }
}
