use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::models::Transaction;
use crate::services::metrics::{FetchOutcome, Metrics};
use crate::services::sources::{
    classify, transactions_url, FetchError, FetchResult, StatusClass, TransactionSource,
};

/// HTTP client for one backend's `/transactions` endpoint with a fixed
/// attempt budget. Retries are issued back to back, without delay.
pub struct SourceClient {
    client: reqwest::Client,
    max_attempts: u32,
    metrics: Option<Arc<Metrics>>,
}

impl SourceClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            max_attempts: config.max_attempts.max(1),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fetches with the retry policy applied and keeps the failure reason.
    pub async fn try_fetch(&self, base_url: &str, account: &str) -> FetchResult {
        let url = transactions_url(base_url, account);
        let mut last_status = 0;

        for attempt in 1..=self.max_attempts {
            let response = self.client.get(&url).send().await.map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(e.to_string())
                } else {
                    FetchError::Network(e.to_string())
                }
            })?;

            let status = response.status();
            match classify(status) {
                StatusClass::Success => return decode(response).await,
                StatusClass::Terminal => {
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                    })
                }
                StatusClass::Retryable => {
                    last_status = status.as_u16();
                    warn!(
                        "Source {} returned {} (attempt {}/{})",
                        base_url, status, attempt, self.max_attempts
                    );
                    if attempt < self.max_attempts {
                        if let Some(ref m) = self.metrics {
                            m.record_retry().await;
                        }
                    }
                }
            }
        }

        Err(FetchError::RetriesExhausted {
            attempts: self.max_attempts,
            last_status,
        })
    }
}

async fn decode(response: reqwest::Response) -> FetchResult {
    let body = response
        .bytes()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let transactions: Option<Vec<Transaction>> =
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

    Ok(transactions.unwrap_or_default())
}

#[async_trait]
impl TransactionSource for SourceClient {
    async fn fetch(&self, base_url: &str, account: &str) -> Vec<Transaction> {
        let result = self.try_fetch(base_url, account).await;

        let outcome = match &result {
            Ok(transactions) if transactions.is_empty() => FetchOutcome::Empty,
            Ok(_) => FetchOutcome::Ok,
            Err(_) => FetchOutcome::Failed,
        };
        if let Some(ref m) = self.metrics {
            m.record_fetch(outcome).await;
        }

        match result {
            Ok(transactions) => {
                debug!(
                    "Source {} returned {} transactions for {}",
                    base_url,
                    transactions.len(),
                    account
                );
                transactions
            }
            Err(e) => {
                warn!("Source {} contributed nothing for {}: {}", base_url, account, e);
                Vec::new()
            }
        }
    }
}
