pub mod aggregator;
pub mod cache;
pub mod coordinator;
pub mod metrics;
pub mod sources;
