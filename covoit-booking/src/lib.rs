pub mod lifecycle;
pub mod locks;
pub mod service;
pub mod ticket;

pub use lifecycle::{SegmentRequest, StatusChange};
pub use locks::RideLocks;
pub use service::{Booking, BookingService};
pub use ticket::generate_ticket_code;
