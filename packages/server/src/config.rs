use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued session tokens, in hours.
    pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root of the publicly served storage tree. Module directories such as
    /// `companies/` are created below it.
    pub public_root: PathBuf,
    /// URL prefix under which `public_root` is served, e.g. `/storage`.
    pub public_url_prefix: String,
    /// Permission bits for module directories.
    pub directory_mode: u32,
    /// Maximum accepted logo size in bytes.
    pub max_logo_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    pub enabled: bool,
    pub admin_name: String,
    pub admin_email: String,
    pub admin_password: String,
    /// Number of demo companies to create for the admin when none exist.
    pub demo_companies: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub seed: SeedConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.token_ttl_hours", 24 * 7)?
            .set_default("storage.public_root", "./storage/app/public")?
            .set_default("storage.public_url_prefix", "/storage")?
            .set_default("storage.directory_mode", 0o755)?
            .set_default("storage.max_logo_size", 2 * 1024 * 1024)?
            .set_default("seed.enabled", true)?
            .set_default("seed.admin_name", "Administrator")?
            .set_default("seed.admin_email", "admin@example.com")?
            .set_default("seed.demo_companies", 5)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., DIRECTORY__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("DIRECTORY")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins"),
            )
            .build()?;

        s.try_deserialize()
    }
}
