use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use super::error::StorageError;
use super::traits::PublicDisk;

/// Local-filesystem public disk.
///
/// Files live at `{root}/{directory}/{uuid}.{ext}`. Writes go through a hidden
/// `.part` file in the target directory and are renamed into place, so a
/// reader never observes a half-written file under a generated name.
pub struct LocalDisk {
    root: PathBuf,
    max_size: u64,
}

impl LocalDisk {
    /// Create a disk rooted at `root`. The root itself is not created here.
    pub fn new(root: PathBuf, max_size: u64) -> Self {
        Self { root, max_size }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a relative path onto the root, rejecting anything that could
    /// escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        if path.trim().is_empty() {
            return Err(StorageError::InvalidPath("path is empty".into()));
        }

        let relative = Path::new(path);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(StorageError::InvalidPath(format!(
                        "'{path}' is not a path below the disk root"
                    )));
                }
            }
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl PublicDisk for LocalDisk {
    async fn put(
        &self,
        directory: &str,
        extension: &str,
        data: &[u8],
    ) -> Result<String, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let extension = extension.trim_start_matches('.');
        if !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StorageError::InvalidPath(format!(
                "invalid file extension '{extension}'"
            )));
        }

        let dir_path = self.resolve(directory)?;
        let stem = Uuid::new_v4().simple().to_string();
        let name = if extension.is_empty() {
            stem
        } else {
            format!("{stem}.{}", extension.to_ascii_lowercase())
        };

        let target = dir_path.join(&name);
        let temp_path = dir_path.join(format!(".{}.part", Uuid::new_v4().simple()));

        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(format!("{}/{name}", directory.trim_end_matches('/')))
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let file_path = self.resolve(path)?;
        Ok(fs::try_exists(&file_path).await?)
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        let file_path = self.resolve(path)?;
        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, path: &str) -> Result<u64, StorageError> {
        let file_path = self.resolve(path)?;
        match fs::metadata(&file_path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn absolute_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        self.resolve(path)
    }
}
