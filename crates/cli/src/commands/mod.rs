//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use sqlx::SqlitePool;
use thiserror::Error;

use shopfront_storefront::config::{ConfigError, StoreConfig};
use shopfront_storefront::db::{self, RepositoryError};
use shopfront_storefront::services::auth::AuthError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Environment configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository or migration error.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Account could not be created.
    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Load configuration and open the shop database.
pub(crate) async fn connect() -> Result<SqlitePool, CliError> {
    let config = StoreConfig::from_env()?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&config.database_url).await?)
}
