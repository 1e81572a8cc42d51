use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error};

use crate::config::SourceDescriptor;
use crate::models::Transaction;
use crate::services::aggregator::merge;
use crate::services::cache::TransactionCache;
use crate::services::sources::TransactionSource;

/// Fans one account query out to every configured source and merges the
/// results once all of them have finished.
pub struct FanOutCoordinator {
    sources: Vec<SourceDescriptor>,
    client: Arc<dyn TransactionSource>,
    cache: TransactionCache,
}

impl FanOutCoordinator {
    pub fn new(
        sources: Vec<SourceDescriptor>,
        client: Arc<dyn TransactionSource>,
        cache: TransactionCache,
    ) -> Self {
        Self {
            sources,
            client,
            cache,
        }
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// One task per source, each going through the cache. A source that
    /// failed and a source with no data both contribute nothing.
    pub async fn aggregate(&self, account: &str) -> Vec<Transaction> {
        let tasks = self.sources.iter().map(|source| {
            let client = Arc::clone(&self.client);
            let cache = self.cache.clone();
            let base_url = source.base_url.clone();
            let account = account.to_string();

            tokio::spawn(async move {
                cache
                    .get_or_fetch(&base_url, &account, || client.fetch(&base_url, &account))
                    .await
            })
        });

        let results = join_all(tasks).await;

        let batches = results
            .into_iter()
            .zip(&self.sources)
            .map(|(result, source)| match result {
                Ok(transactions) => {
                    debug!(
                        "Source {} contributed {} transactions",
                        source.id,
                        transactions.len()
                    );
                    transactions
                }
                Err(e) => {
                    error!("Fetch task for source {} did not complete: {}", source.id, e);
                    Vec::new()
                }
            });

        merge(batches)
    }
}
