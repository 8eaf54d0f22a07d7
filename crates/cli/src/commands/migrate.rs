//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! shop-cli migrate
//! ```
//!
//! Applies the SQL files embedded from `crates/storefront/migrations/` and
//! creates the session store's table. Safe to run repeatedly.

use shopfront_storefront::db;
use shopfront_storefront::middleware::create_session_store;

use super::{CliError, connect};

/// Run all database migrations.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running schema migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Creating session table...");
    create_session_store(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
