use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

/// Stamps every response with the running crate version.
pub async fn api_version_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        "X-API-Version",
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );

    response
}
