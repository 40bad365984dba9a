pub mod city;
pub mod range;
pub mod ride;
pub mod reservation;
pub mod repository;

pub use city::CityName;
pub use range::LegRange;
pub use ride::Ride;
pub use reservation::{Reservation, ReservationStatus};

/// Business errors surfaced by every public ride/reservation operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid segment [{from}, {to}) for a path of {leg_count} leg(s)")]
    InvalidRange {
        from: i32,
        to: i32,
        leg_count: usize,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Capacity exceeded: requested {requested} seat(s), {remaining} remaining")]
    CapacityExceeded {
        requested: i32,
        remaining: i32,
    },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: String,
        to: String,
    },

    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::InternalError(err.to_string())
    }
}
