pub mod app_config;
pub mod database;
pub mod memory;
pub mod redis_repo;
pub mod reservation_repo;
pub mod ride_repo;

pub use database::DbClient;
pub use memory::InMemoryStore;
pub use redis_repo::RedisClient;
pub use reservation_repo::PgReservationRepository;
pub use ride_repo::PgRideRepository;
