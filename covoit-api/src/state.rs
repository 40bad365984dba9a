use std::sync::Arc;

use covoit_booking::BookingService;
use covoit_catalog::RideCatalog;
use covoit_store::app_config::BusinessRules;
use covoit_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    /// Tokens issued longer ago than this are refused
    pub max_age_seconds: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<RideCatalog>,
    pub booking: Arc<BookingService>,
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}
