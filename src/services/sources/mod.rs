use async_trait::async_trait;
use reqwest::StatusCode;

use crate::models::Transaction;

pub mod http;

pub use http::SourceClient;

pub type FetchResult = Result<Vec<Transaction>, FetchError>;

/// Why a source contributed nothing. Never crosses the fan-out boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Source returned non-retryable HTTP {status}")]
    Status { status: u16 },
    #[error("Source still returning HTTP {last_status} after {attempts} attempts")]
    RetriesExhausted { attempts: u32, last_status: u16 },
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Where an HTTP status lands in the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Retryable,
    Terminal,
}

/// 503 and 529 are transient overload; every other error status is final.
pub fn classify(status: StatusCode) -> StatusClass {
    if status.is_success() {
        return StatusClass::Success;
    }

    let retryable = if status.is_server_error() {
        matches!(status.as_u16(), 503 | 529)
    } else if status.is_client_error() {
        status.as_u16() == 529
    } else {
        false
    };

    if retryable {
        StatusClass::Retryable
    } else {
        StatusClass::Terminal
    }
}

pub fn transactions_url(base_url: &str, account: &str) -> String {
    format!("{base_url}/transactions?account={account}")
}

/// A backend that can be asked for an account's transactions.
///
/// Implementations swallow every failure and report it as an empty result.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch(&self, base_url: &str, account: &str) -> Vec<Transaction>;
}
