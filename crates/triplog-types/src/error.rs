//! Error types for triplog

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

/// Document store errors
///
/// `Conflict` and `Rejected` mean the write was not applied. `Unavailable`
/// means the outcome is unknown: the store may have applied the request
/// before the connection failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Write conflict on {collection}/{key}")]
    Conflict { collection: String, key: String },

    #[error("Store rejected the request: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store data corrupted: {0}")]
    Corrupted(String),

    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// True when the store definitely did not apply the request
    pub fn is_definite(&self) -> bool {
        !matches!(self, StoreError::Unavailable(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Submission failed: {0}")]
    Submission(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_is_not_definite() {
        assert!(!StoreError::Unavailable("timeout".to_string()).is_definite());
        assert!(StoreError::Rejected("quota".to_string()).is_definite());
        assert!(StoreError::Conflict {
            collection: "vehicles".to_string(),
            key: "MH12AB1234".to_string(),
        }
        .is_conflict());
    }

    #[test]
    fn test_store_error_converts_into_error() {
        let err: Error = StoreError::Rejected("quota".to_string()).into();
        assert!(matches!(err, Error::Store(StoreError::Rejected(_))));
        assert_eq!(err.to_string(), "Store error: Store rejected the request: quota");
    }
}
