// Metrics endpoint reflects per-source outcomes that /aggregate hides
use super::test_utils::{mount_transactions, transactions_mock, txn_json, TestServer};
use axum::http::StatusCode;
use serde_json::json;
use wiremock::{MockServer, ResponseTemplate};

const ACCOUNT: &str = "ACC-001";

#[tokio::test]
async fn test_metrics_distinguish_empty_from_failed() {
    let healthy = MockServer::start().await;
    let empty = MockServer::start().await;
    let flaky = MockServer::start().await;
    mount_transactions(
        &healthy,
        ACCOUNT,
        json!([txn_json("txn-1", "server-1", ACCOUNT, "10.00", "2025-02-15T14:00:00")]),
    )
    .await;
    mount_transactions(&empty, ACCOUNT, json!([])).await;
    transactions_mock(ACCOUNT)
        .respond_with(ResponseTemplate::new(529))
        .mount(&flaky)
        .await;

    let server = TestServer::for_mocks(&[&healthy, &empty, &flaky]);
    server.get("/aggregate?account=ACC-001").await;
    server.get("/aggregate?account=ACC-001").await;
    server.get("/aggregate").await;

    let (status, json) = server.get("/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_requests"], 2);
    assert_eq!(json["rejected_requests"], 1);
    assert_eq!(json["source_fetches_ok"], 1);
    assert_eq!(json["source_fetches_empty"], 1);
    assert_eq!(json["source_fetches_failed"], 1);
    assert_eq!(json["source_retries"], 4);
    assert_eq!(json["cache"]["entries"], 3);
    assert_eq!(json["cache"]["hits"], 3);
    assert_eq!(json["cache"]["misses"], 3);
}
