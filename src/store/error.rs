//! Feature store error types.

use thiserror::Error;

/// Result type for feature store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from reading or editing the remote datasets.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Remote error {code}: {message}")]
    Remote { code: i64, message: String },
    #[error("Edit rejected by {dataset}: {message}")]
    EditRejected {
        dataset: &'static str,
        message: String,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Schema mismatch: {0}")]
    Schema(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
