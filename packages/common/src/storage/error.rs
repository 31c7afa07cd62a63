use thiserror::Error;

/// Failures of the public disk.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no stored file at {0}")]
    NotFound(String),
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Absolute, empty, or escaping the disk root.
    #[error("invalid storage path: {0}")]
    InvalidPath(String),
    #[error("file of {actual} bytes is over the {limit} byte limit")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}
