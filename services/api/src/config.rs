//! Service configuration assembled from environment variables

use anyhow::Result;
use common::database::DatabaseConfig;

use crate::{jwt::JwtConfig, key_server::KeyServerConfig};

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen port (`PORT`, default: 8080)
    pub port: u16,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub key_server: KeyServerConfig,
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        Ok(AppConfig {
            port,
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig::from_env(),
            key_server: KeyServerConfig::from_env(),
        })
    }
}
