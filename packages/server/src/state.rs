use std::sync::Arc;

use common::storage::{DirectoryProvisioner, PublicDisk};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::store::CompanyStore;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub provisioner: Arc<dyn DirectoryProvisioner>,
    pub disk: Arc<dyn PublicDisk>,
}

impl AppState {
    pub fn companies(&self) -> CompanyStore<'_, DatabaseConnection> {
        CompanyStore::new(
            &self.db,
            self.provisioner.as_ref(),
            self.disk.as_ref(),
            self.config.storage.directory_mode,
        )
    }
}
