use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::{error::ApiError, models::Transaction, state::AppState};

#[derive(Debug, Deserialize)]
pub struct AggregateParams {
    pub account: Option<String>,
}

/// `GET /aggregate?account=<id>`: every configured source's transactions for
/// the account, newest first. Source failures show up only as missing data.
pub async fn aggregate(
    State(state): State<AppState>,
    query: Result<Query<AggregateParams>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => {
            state.metrics.record_rejected().await;
            return Err(ApiError::InvalidQuery(rejection.body_text()));
        }
    };

    let Some(account) = params.account else {
        state.metrics.record_rejected().await;
        return Err(ApiError::MissingParameter("account"));
    };

    let request_id = Uuid::new_v4().to_string();
    let started = Instant::now();
    info!(
        "Received aggregate request {} for account {} ({} sources)",
        request_id,
        account,
        state.coordinator.sources().len()
    );

    let transactions = state.coordinator.aggregate(&account).await;

    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    state.metrics.record_request(elapsed_ms).await;
    info!(
        "Aggregate request {} returned {} transactions in {}ms",
        request_id,
        transactions.len(),
        elapsed_ms
    );

    Ok(Json(transactions))
}
