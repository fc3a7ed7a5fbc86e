//! Error types for aircheck-catalog.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid show key {0:?}: must match [A-Za-z0-9_-], 1-50 chars")]
    InvalidShowKey(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("response exceeds the {limit} byte ceiling")]
    ResponseTooLarge { limit: usize },

    #[error("catalog lists {count} entries, ceiling is {limit}")]
    TooManyEntries { count: usize, limit: usize },

    #[error("no archive id found on the program page")]
    ArchiveIdNotFound,

    #[error("malformed response body: {0}")]
    Parse(#[from] serde_json::Error),
}
