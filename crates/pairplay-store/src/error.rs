//! Error types for the storage layer.

use std::time::Duration;

/// Errors a storage backend can report.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key exists but holds a different kind of value
    /// (e.g. a list where a hash was expected).
    #[error("key {0} holds a value of the wrong type")]
    WrongType(String),

    /// The call did not complete within the configured limit.
    #[error("storage call `{op}` timed out after {limit:?}")]
    Timeout { op: &'static str, limit: Duration },

    /// The backend could not serve the request.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
