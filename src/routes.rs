use axum::{middleware, routing::get, Router};

use crate::handlers::{aggregate, health, metrics};
use crate::middleware::api_version::api_version_middleware;
use crate::state::AppState;

pub fn create_app_router(state: AppState) -> Router {
    Router::new()
        .route("/aggregate", get(aggregate::aggregate))
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(middleware::from_fn(api_version_middleware))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
