use crate::models::Transaction;

/// Flattens per-source results and orders them newest first.
///
/// Timestamps compare as raw strings, which matches chronological order for
/// ISO-8601 values in one format and zone. The sort is stable, so equal
/// timestamps keep their collection order. Duplicates are kept.
pub fn merge<I>(batches: I) -> Vec<Transaction>
where
    I: IntoIterator<Item = Vec<Transaction>>,
{
    let mut merged: Vec<Transaction> = batches.into_iter().flatten().collect();
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged
}
