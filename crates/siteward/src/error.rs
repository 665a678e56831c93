use reqwest::StatusCode;

use crate::fetch::FetchError;
use crate::store::StoreError;

// Custom error type for policy engine operations
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("cache store error: {0}")]
    Store(#[from] StoreError),

    #[error("precache of '{url}' failed with status {status}")]
    Precache { url: String, status: StatusCode },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid precache manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}
