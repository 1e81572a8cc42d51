use axum::{
    extract::State,
    http::HeaderValue,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::CACHE_CONTROL_NO_CACHE;
use crate::services::cache::CacheStats;
use crate::services::metrics::MetricsStats;
use crate::state::AppState;

#[derive(Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub requests: MetricsStats,
    pub cache: CacheStats,
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    let body = MetricsResponse {
        requests: state.metrics.get_stats().await,
        cache: state.cache.stats().await,
    };

    let mut response = Json(body).into_response();
    response.headers_mut().insert(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(CACHE_CONTROL_NO_CACHE),
    );
    response
}
