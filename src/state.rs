use crate::config::AppConfig;
use crate::services::cache::TransactionCache;
use crate::services::coordinator::FanOutCoordinator;
use crate::services::metrics::Metrics;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub coordinator: Arc<FanOutCoordinator>,
    pub cache: TransactionCache,
    pub metrics: Arc<Metrics>,
}
