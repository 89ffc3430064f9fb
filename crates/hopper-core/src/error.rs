use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Failures of the persistence medium behind a [`LinkStore`](crate::LinkStore).
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("field `target` is invalid: expected a URL: {0}")]
    InvalidUrl(String),
    #[error("field `redirect` is invalid: expected one of (301, 302, 307, 308), got {0}")]
    InvalidRedirect(u16),
    /// Unknown or undecodable public id. The two cases are deliberately
    /// indistinguishable.
    #[error("link not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ShortenerError {
    /// Whether the input was rejected before anything was persisted.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidUrl(_) | Self::InvalidRedirect(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unsupported bucket width {0:?}, expected one of 1s, 1m, 1h, 1d")]
pub struct UnsupportedBucketWidth(pub String);
