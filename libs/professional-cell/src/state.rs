use std::sync::Arc;

use shared_config::AppConfig;
use shared_utils::clock::{Clock, SystemClock};

use crate::services::catalog::CatalogCache;

/// Process-wide state shared across all routers: configuration plus the
/// catalog cache (which must outlive individual requests).
pub struct AppState {
    pub config: AppConfig,
    pub catalog: Arc<CatalogCache>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            catalog: Arc::new(CatalogCache::new(clock)),
        }
    }
}
