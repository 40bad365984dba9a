pub mod inventory;
pub mod path;
pub mod pricing;
pub mod service;
pub mod validation;

pub use inventory::{remaining_seats, LegUsage};
pub use path::{build_path, locate_segment, parse_stops};
pub use pricing::SegmentPricer;
pub use service::{RideCatalog, RideMatch, SegmentQuote};
pub use validation::{validate_ride, RideDraft};
