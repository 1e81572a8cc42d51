// Query endpoint behavior across healthy, empty, and failing sources
use super::test_utils::{
    ids, mount_transactions, request_count, transactions_mock, txn_json, TestServer,
};
use axum::http::StatusCode;
use serde_json::json;
use wiremock::{MockServer, ResponseTemplate};

const ACCOUNT: &str = "ACC-001";

#[tokio::test]
async fn test_merges_two_sources_newest_first() {
    let source_a = MockServer::start().await;
    let source_b = MockServer::start().await;
    mount_transactions(
        &source_a,
        ACCOUNT,
        json!([txn_json("txn-2", "server-1", ACCOUNT, "200.00", "2025-02-15T12:00:00")]),
    )
    .await;
    mount_transactions(
        &source_b,
        ACCOUNT,
        json!([txn_json("txn-3", "server-2", ACCOUNT, "50.00", "2025-02-14T10:00:00")]),
    )
    .await;

    let server = TestServer::for_mocks(&[&source_a, &source_b]);
    let (status, body) = server.get("/aggregate?account=ACC-001").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["txn-2", "txn-3"]);
    assert_eq!(body[0]["serverId"], "server-1");
    assert_eq!(body[1]["amount"], "50.00");
}

#[tokio::test]
async fn test_result_length_is_sum_of_sources_and_sorted() {
    let source_a = MockServer::start().await;
    let source_b = MockServer::start().await;
    mount_transactions(
        &source_a,
        ACCOUNT,
        json!([
            txn_json("txn-1", "server-1", ACCOUNT, "100.00", "2025-02-13T08:00:00"),
            txn_json("txn-2", "server-1", ACCOUNT, "200.00", "2025-02-15T12:00:00")
        ]),
    )
    .await;
    mount_transactions(
        &source_b,
        ACCOUNT,
        json!([
            txn_json("txn-3", "server-2", ACCOUNT, "50.00", "2025-02-14T10:00:00"),
            txn_json("txn-4", "server-2", ACCOUNT, "75.25", "2025-02-16T09:30:00")
        ]),
    )
    .await;

    let server = TestServer::for_mocks(&[&source_a, &source_b]);
    let (status, body) = server.get("/aggregate?account=ACC-001").await;

    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert!(items.windows(2).all(|pair| {
        pair[0]["timestamp"].as_str().unwrap() >= pair[1]["timestamp"].as_str().unwrap()
    }));
    assert_eq!(ids(&body), vec!["txn-4", "txn-2", "txn-3", "txn-1"]);
}

#[tokio::test]
async fn test_one_empty_source_yields_the_other() {
    let source_a = MockServer::start().await;
    let source_b = MockServer::start().await;
    mount_transactions(
        &source_a,
        ACCOUNT,
        json!([txn_json("txn-1", "server-1", ACCOUNT, "300.00", "2025-02-15T14:00:00")]),
    )
    .await;
    mount_transactions(&source_b, ACCOUNT, json!([])).await;

    let server = TestServer::for_mocks(&[&source_a, &source_b]);
    let (status, body) = server.get("/aggregate?account=ACC-001").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["amount"], "300.00");
}

#[tokio::test]
async fn test_failed_sources_still_return_ok() {
    let terminal = MockServer::start().await;
    let overloaded = MockServer::start().await;
    transactions_mock(ACCOUNT)
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&terminal)
        .await;
    transactions_mock(ACCOUNT)
        .respond_with(ResponseTemplate::new(503))
        .expect(5)
        .mount(&overloaded)
        .await;

    let server = TestServer::for_mocks(&[&terminal, &overloaded]);
    let (status, body) = server.get("/aggregate?account=ACC-001").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_unreachable_source_contributes_nothing() {
    let healthy = MockServer::start().await;
    mount_transactions(
        &healthy,
        ACCOUNT,
        json!([txn_json("txn-1", "server-1", ACCOUNT, "10.00", "2025-02-15T14:00:00")]),
    )
    .await;

    let server =
        TestServer::with_sources(vec![healthy.uri(), "http://127.0.0.1:1".to_string()]);
    let (status, body) = server.get("/aggregate?account=ACC-001").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["txn-1"]);
}

#[tokio::test]
async fn test_transient_overload_is_retried_through_endpoint() {
    let source = MockServer::start().await;
    transactions_mock(ACCOUNT)
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&source)
        .await;
    mount_transactions(
        &source,
        ACCOUNT,
        json!([txn_json("txn-1", "server-1", ACCOUNT, "10.00", "2025-02-15T14:00:00")]),
    )
    .await;

    let server = TestServer::for_mocks(&[&source]);
    let (status, body) = server.get("/aggregate?account=ACC-001").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["txn-1"]);
    assert_eq!(request_count(&source).await, 3);
}

#[tokio::test]
async fn test_missing_account_is_rejected_before_fetching() {
    let source_a = MockServer::start().await;
    let source_b = MockServer::start().await;

    let server = TestServer::for_mocks(&[&source_a, &source_b]);
    let (status, body) = server.get("/aggregate").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "missing_parameter");
    assert_eq!(request_count(&source_a).await, 0);
    assert_eq!(request_count(&source_b).await, 0);
}

#[tokio::test]
async fn test_malformed_query_is_rejected_as_json() {
    let source = MockServer::start().await;

    let server = TestServer::for_mocks(&[&source]);
    let (status, body) = server.get("/aggregate?account=a&account=b").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_query");
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert_eq!(request_count(&source).await, 0);

    let (_, metrics) = server.get("/metrics").await;
    assert_eq!(metrics["rejected_requests"], 1);
    assert_eq!(metrics["total_requests"], 0);
}

#[tokio::test]
async fn test_repeat_query_served_from_cache() {
    let source_a = MockServer::start().await;
    let source_b = MockServer::start().await;
    mount_transactions(
        &source_a,
        ACCOUNT,
        json!([txn_json("txn-1", "server-1", ACCOUNT, "10.00", "2025-02-15T14:00:00")]),
    )
    .await;
    transactions_mock(ACCOUNT)
        .respond_with(ResponseTemplate::new(404))
        .mount(&source_b)
        .await;

    let server = TestServer::for_mocks(&[&source_a, &source_b]);
    let (_, first) = server.get("/aggregate?account=ACC-001").await;
    let (_, second) = server.get("/aggregate?account=ACC-001").await;

    assert_eq!(first, second);
    assert_eq!(request_count(&source_a).await, 1);
    // The failed source's empty result is cached as well.
    assert_eq!(request_count(&source_b).await, 1);

    server.state.cache.clear().await;
    server.get("/aggregate?account=ACC-001").await;
    assert_eq!(request_count(&source_a).await, 2);
}

#[tokio::test]
async fn test_accounts_are_cached_independently() {
    let source = MockServer::start().await;
    mount_transactions(
        &source,
        "ACC-001",
        json!([txn_json("txn-1", "server-1", "ACC-001", "10.00", "2025-02-15T14:00:00")]),
    )
    .await;
    mount_transactions(
        &source,
        "ACC-002",
        json!([txn_json("txn-9", "server-1", "ACC-002", "99.00", "2025-02-10T14:00:00")]),
    )
    .await;

    let server = TestServer::for_mocks(&[&source]);
    let (_, first) = server.get("/aggregate?account=ACC-001").await;
    let (_, second) = server.get("/aggregate?account=ACC-002").await;

    assert_eq!(ids(&first), vec!["txn-1"]);
    assert_eq!(ids(&second), vec!["txn-9"]);
    assert_eq!(request_count(&source).await, 2);
}
