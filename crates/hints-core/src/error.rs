//! Error types for outbound refresh calls.

use std::time::Duration;

/// Error type for outbound fetch operations.
///
/// Every variant is recovered locally by the cache: the entry is left
/// unchanged and the stale value (if any) keeps serving.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request error: {0}")]
    Request(String),
}
