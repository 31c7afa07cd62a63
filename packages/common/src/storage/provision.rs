use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

/// Permission bits applied to module directories unless configured otherwise.
pub const DEFAULT_DIRECTORY_MODE: u32 = 0o755;

/// Ensures storage directories exist before files are written into them.
///
/// Every operation is synchronous, idempotent and reports failure as `false`
/// after logging it. Callers decide whether a failure is fatal.
pub trait DirectoryProvisioner: Send + Sync {
    /// Create `path` (with parents) if missing; reapply `mode` if it already
    /// exists and is a module directory.
    fn ensure_directory_exists(&self, path: &Path, mode: u32) -> bool;

    /// Apply `mode` to an existing path. A missing path is a no-op.
    fn set_directory_permissions(&self, path: &Path, mode: u32) -> bool;

    /// Ensure every path exists. Keeps going after a failure and returns
    /// `true` only if all succeeded; nothing is rolled back.
    fn ensure_directories_exist(&self, paths: &[PathBuf], mode: u32) -> bool {
        let mut success = true;
        for path in paths {
            if !self.ensure_directory_exists(path, mode) {
                success = false;
            }
        }
        success
    }

    /// Storage directory for a module, e.g. `<public root>/companies`. No I/O.
    fn module_storage_path(&self, module: &str) -> PathBuf;

    /// Ensure the module's storage directory exists.
    fn create_module_storage_structure(&self, module: &str, mode: u32) -> bool {
        let path = self.module_storage_path(module);
        self.ensure_directory_exists(&path, mode)
    }

    /// Whether `path` exists, is a directory and this process may create
    /// files in it.
    fn is_directory_writable(&self, path: &Path) -> bool;
}

/// Provisioner for module directories below a managed public storage root.
#[derive(Debug, Clone)]
pub struct FilesystemProvisioner {
    public_root: PathBuf,
}

impl FilesystemProvisioner {
    pub fn new(public_root: impl Into<PathBuf>) -> Self {
        Self {
            public_root: public_root.into(),
        }
    }

    pub fn public_root(&self) -> &Path {
        &self.public_root
    }

    /// A module directory lives strictly below the public root.
    ///
    /// The comparison is component-wise, so `<root>2/x` does not count.
    pub fn is_module_directory(&self, path: &Path) -> bool {
        path.starts_with(&self.public_root) && path != self.public_root
    }
}

impl DirectoryProvisioner for FilesystemProvisioner {
    fn ensure_directory_exists(&self, path: &Path, mode: u32) -> bool {
        match std::fs::metadata(path) {
            Ok(meta) if !meta.is_dir() => {
                error!(path = %path.display(), "Path exists but is not a directory");
                false
            }
            Ok(_) => {
                if self.is_module_directory(path) {
                    return self.set_directory_permissions(path, mode);
                }
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if let Err(e) = create_dir_all_with_mode(path, mode) {
                    error!(path = %path.display(), error = %e, "Failed to create directory");
                    return false;
                }
                info!(path = %path.display(), mode = %format!("{mode:o}"), "Created directory");
                // mkdir is subject to the umask; module directories get the exact mode.
                if self.is_module_directory(path) {
                    return self.set_directory_permissions(path, mode);
                }
                true
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Error ensuring directory exists");
                false
            }
        }
    }

    fn set_directory_permissions(&self, path: &Path, mode: u32) -> bool {
        if !path.exists() {
            return true;
        }

        match apply_mode(path, mode) {
            Ok(()) => {
                debug!(path = %path.display(), mode = %format!("{mode:o}"), "Set permissions for directory");
                true
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to set permissions for directory");
                false
            }
        }
    }

    fn module_storage_path(&self, module: &str) -> PathBuf {
        self.public_root.join(module)
    }

    fn is_directory_writable(&self, path: &Path) -> bool {
        path.is_dir() && can_write(path)
    }
}

#[cfg(unix)]
fn create_dir_all_with_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(mode)
        .create(path)
}

#[cfg(not(unix))]
fn create_dir_all_with_mode(path: &Path, _mode: u32) -> io::Result<()> {
    std::fs::DirBuilder::new().recursive(true).create(path)
}

/// Effective-uid access check, so root and group membership count.
#[cfg(unix)]
fn can_write(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: `c_path` is a valid NUL-terminated string that outlives the call.
    unsafe {
        libc::faccessat(libc::AT_FDCWD, c_path.as_ptr(), libc::W_OK, libc::AT_EACCESS) == 0
    }
}

#[cfg(not(unix))]
fn can_write(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| !meta.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
