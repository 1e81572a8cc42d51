use num_traits::ToPrimitive;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

const MAX_DURATION_HISTORY: usize = 1000;

fn to_f64(value: u64) -> f64 {
    value.to_f64().unwrap_or(f64::MAX)
}

fn usize_to_f64(value: usize) -> f64 {
    value.to_f64().unwrap_or(f64::MAX)
}

fn percentile(sorted_data: &[u64], p: u8) -> u64 {
    if sorted_data.is_empty() {
        return 0;
    }

    let clamped = u128::from(p.min(100));
    let len = sorted_data.len() as u128;
    let raw_index = (len * clamped).div_ceil(100);
    let safe_index = raw_index.saturating_sub(1).min(len.saturating_sub(1));
    let index = usize::try_from(safe_index).unwrap_or(sorted_data.len().saturating_sub(1));

    sorted_data.get(index).copied().unwrap_or_default()
}

/// How a single source fetch ended, as seen by the source client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Ok,
    Empty,
    Failed,
}

#[derive(Clone, Default, Serialize)]
pub struct MetricsStats {
    pub total_requests: u64,
    pub rejected_requests: u64,
    pub source_fetches_ok: u64,
    pub source_fetches_empty: u64,
    pub source_fetches_failed: u64,
    pub source_retries: u64,
    pub avg_latency_ms: f64,
    pub p50_latency_ms: u64,
    pub p95_latency_ms: u64,
}

pub struct Metrics {
    total_requests: Arc<RwLock<u64>>,
    rejected_requests: Arc<RwLock<u64>>,
    source_fetches_ok: Arc<RwLock<u64>>,
    source_fetches_empty: Arc<RwLock<u64>>,
    source_fetches_failed: Arc<RwLock<u64>>,
    source_retries: Arc<RwLock<u64>>,
    request_durations_ms: Arc<RwLock<VecDeque<u64>>>,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            total_requests: Arc::new(RwLock::new(0)),
            rejected_requests: Arc::new(RwLock::new(0)),
            source_fetches_ok: Arc::new(RwLock::new(0)),
            source_fetches_empty: Arc::new(RwLock::new(0)),
            source_fetches_failed: Arc::new(RwLock::new(0)),
            source_retries: Arc::new(RwLock::new(0)),
            request_durations_ms: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    pub async fn record_request(&self, duration_ms: u64) {
        *self.total_requests.write().await += 1;
        let mut durations = self.request_durations_ms.write().await;
        durations.push_back(duration_ms);
        if durations.len() > MAX_DURATION_HISTORY {
            durations.pop_front();
        }
    }

    pub async fn record_rejected(&self) {
        *self.rejected_requests.write().await += 1;
    }

    pub async fn record_fetch(&self, outcome: FetchOutcome) {
        let counter = match outcome {
            FetchOutcome::Ok => &self.source_fetches_ok,
            FetchOutcome::Empty => &self.source_fetches_empty,
            FetchOutcome::Failed => &self.source_fetches_failed,
        };
        *counter.write().await += 1;
    }

    pub async fn record_retry(&self) {
        *self.source_retries.write().await += 1;
    }

    #[must_use]
    pub async fn get_stats(&self) -> MetricsStats {
        let durations = self.request_durations_ms.read().await;
        let mut sorted_durations: Vec<u64> = durations.iter().copied().collect();
        drop(durations);
        sorted_durations.sort_unstable();

        let avg_latency_ms = if sorted_durations.is_empty() {
            0.0
        } else {
            let total: f64 = sorted_durations.iter().map(|&x| to_f64(x)).sum();
            total / usize_to_f64(sorted_durations.len())
        };

        MetricsStats {
            total_requests: *self.total_requests.read().await,
            rejected_requests: *self.rejected_requests.read().await,
            source_fetches_ok: *self.source_fetches_ok.read().await,
            source_fetches_empty: *self.source_fetches_empty.read().await,
            source_fetches_failed: *self.source_fetches_failed.read().await,
            source_retries: *self.source_retries.read().await,
            avg_latency_ms,
            p50_latency_ms: percentile(&sorted_durations, 50),
            p95_latency_ms: percentile(&sorted_durations, 95),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
