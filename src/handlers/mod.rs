pub mod aggregate;
pub mod health;
pub mod metrics;

/// Cache-Control value for status endpoints whose bodies change per call.
pub(crate) const CACHE_CONTROL_NO_CACHE: &str = "no-cache, no-store, must-revalidate";
