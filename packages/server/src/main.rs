use std::sync::Arc;

use anyhow::bail;
use common::storage::{DirectoryProvisioner, FilesystemProvisioner, LocalDisk};
use tracing::{Level, info, warn};

use directory_server::config::AppConfig;
use directory_server::database::init_db;
use directory_server::state::AppState;
use directory_server::store::COMPANY_MODULE;
use directory_server::{build_router, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = init_db(&config.database.url).await?;
    info!("Database connected and schema synced");

    let storage = &config.storage;
    let provisioner = FilesystemProvisioner::new(&storage.public_root);
    if !provisioner.ensure_directory_exists(&storage.public_root, storage.directory_mode) {
        bail!(
            "public storage root {} is not usable",
            storage.public_root.display()
        );
    }
    // Uploads provision on demand as well; this only surfaces problems early.
    if !provisioner.create_module_storage_structure(COMPANY_MODULE, storage.directory_mode) {
        warn!(module = COMPANY_MODULE, "Module storage is not ready yet");
    }
    let disk = LocalDisk::new(storage.public_root.clone(), storage.max_logo_size);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config: Arc::new(config),
        provisioner: Arc::new(provisioner),
        disk: Arc::new(disk),
    };

    if state.config.seed.enabled {
        seed::run(&state).await?;
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, build_router(state)).await?;

    Ok(())
}
