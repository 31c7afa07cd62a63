mod error;
mod traits;

pub mod filesystem;
pub mod provision;

pub use error::StorageError;
pub use filesystem::LocalDisk;
pub use provision::{DEFAULT_DIRECTORY_MODE, DirectoryProvisioner, FilesystemProvisioner};
pub use traits::PublicDisk;
