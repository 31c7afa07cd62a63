use std::path::PathBuf;

use async_trait::async_trait;

use super::error::StorageError;

/// Publicly served file storage addressed by paths relative to its root.
///
/// Paths handed out by [`PublicDisk::put`] look like `companies/<name>.<ext>`
/// and are what callers persist.
#[async_trait]
pub trait PublicDisk: Send + Sync {
    /// Store bytes under `directory` with a generated opaque filename and
    /// return the relative path.
    ///
    /// The directory must already exist; provisioning it is the caller's job.
    async fn put(
        &self,
        directory: &str,
        extension: &str,
        data: &[u8],
    ) -> Result<String, StorageError>;

    /// Check whether a file exists at the relative path.
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete a file by relative path.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;

    /// Get the size of a file in bytes.
    async fn size(&self, path: &str) -> Result<u64, StorageError>;

    /// Resolve a relative path to its location on disk.
    fn absolute_path(&self, path: &str) -> Result<PathBuf, StorageError>;
}
