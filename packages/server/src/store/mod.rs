//! Persistence for directory records, including the files they own.

pub mod company;

use std::path::PathBuf;

use common::storage::StorageError;
use sea_orm::DbErr;

pub use company::{
    COMPANY_MODULE, CompanyData, CompanyStore, Logo, LogoInput, Page, PageRequest, SortColumn,
    SortDirection, UploadedLogo,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("company name must not be blank")]
    MissingName,
    #[error("company {0} not found")]
    NotFound(i32),
    #[error("could not provision storage for module '{module}' at {}", path.display())]
    StorageProvisioning { module: &'static str, path: PathBuf },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Db(#[from] DbErr),
}
