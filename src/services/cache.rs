use num_traits::ToPrimitive;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::Transaction;

/// Process-wide memo of source results keyed by `(base_url, account)`.
///
/// Entries never expire; they live until `clear` is called or the cache is
/// dropped. Concurrent misses on the same key may each fetch; the last write
/// wins.
#[derive(Clone)]
pub struct TransactionCache {
    store: Arc<RwLock<HashMap<String, Vec<Transaction>>>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    enabled: bool,
}

impl TransactionCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Base URL and account joined with `-`, so a hit needs the exact same
    /// base URL string.
    pub fn cache_key(base_url: &str, account: &str) -> String {
        format!("{base_url}-{account}")
    }

    pub async fn get(&self, base_url: &str, account: &str) -> Option<Vec<Transaction>> {
        if !self.enabled {
            return None;
        }

        let key = Self::cache_key(base_url, account);
        self.store.read().await.get(&key).cloned()
    }

    /// Returns the stored result for the key, or runs `fetch` and stores
    /// whatever it produced, empty results included.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        base_url: &str,
        account: &str,
        fetch: F,
    ) -> Vec<Transaction>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<Transaction>>,
    {
        if !self.enabled {
            return fetch().await;
        }

        let key = Self::cache_key(base_url, account);

        if let Some(cached) = self.store.read().await.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit: {} ({} transactions)", key, cached.len());
            return cached.clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss: {}", key);

        let transactions = fetch().await;
        self.store
            .write()
            .await
            .insert(key, transactions.clone());

        transactions
    }

    pub async fn clear(&self) {
        let mut store = self.store.write().await;
        store.clear();
        debug!("Cache cleared");
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.store.read().await.len();
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let hit_rate = if lookups > 0 {
            hits.to_f64().unwrap_or_default() / lookups.to_f64().unwrap_or(1.0) * 100.0
        } else {
            0.0
        };

        CacheStats {
            enabled: self.enabled,
            entries,
            hits,
            misses,
            hit_rate,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}
