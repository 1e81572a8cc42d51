use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub code: Option<String>,
}

/// Errors surfaced to callers of the HTTP API.
///
/// Backend failures never appear here; they are absorbed by the source client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Required query parameter '{0}' is missing")]
    MissingParameter(&'static str),
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) | Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "missing_parameter",
            Self::InvalidQuery(_) => "invalid_query",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!("Rejecting request with {}: {}", status, self);

        let body = ErrorBody {
            error: ErrorDetail {
                message: self.to_string(),
                error_type: "invalid_request_error".to_string(),
                code: Some(self.code().to_string()),
            },
        };

        (status, Json(body)).into_response()
    }
}
