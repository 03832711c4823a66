//! Storage error types.

use thiserror::Error;
use vpipe_models::ErrorKind;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to configure storage client: {0}")]
    ConfigError(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Sign failed: {0}")]
    SignFailed(String),

    #[error("{what} timed out after {secs}s")]
    Timeout { what: String, secs: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    pub fn sign_failed(msg: impl Into<String>) -> Self {
        Self::SignFailed(msg.into())
    }

    pub fn timeout(what: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            what: what.into(),
            secs,
        }
    }

    /// Caller-facing failure kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::UploadFailed(_) | StorageError::SignFailed(_) => ErrorKind::UploadError,
            StorageError::Timeout { .. } => ErrorKind::Timeout,
            StorageError::ConfigError(_) | StorageError::Io(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(StorageError::upload_failed("x").kind(), ErrorKind::UploadError);
        assert_eq!(StorageError::sign_failed("x").kind(), ErrorKind::UploadError);
        assert_eq!(StorageError::timeout("upload a.mp4", 5).kind(), ErrorKind::Timeout);
        assert_eq!(StorageError::config_error("x").kind(), ErrorKind::Internal);
    }
}
