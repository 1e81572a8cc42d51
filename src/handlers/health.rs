use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use super::CACHE_CONTROL_NO_CACHE;
use crate::state::AppState;

/// Liveness only; backends are not contacted.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let sources: Vec<_> = state
        .coordinator
        .sources()
        .iter()
        .map(|s| json!({ "id": s.id, "url": s.base_url }))
        .collect();

    (
        [(
            axum::http::header::CACHE_CONTROL,
            axum::http::HeaderValue::from_static(CACHE_CONTROL_NO_CACHE),
        )],
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "sources": sources,
            "cache_enabled": state.cache.is_enabled()
        })),
    )
}
