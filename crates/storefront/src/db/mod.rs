//! Database operations for the shop's SQLite store.
//!
//! ## Tables
//!
//! - `users` - Shoppers (username + argon2 hash)
//! - `admins` - Admin panel accounts, disjoint from `users`
//! - `items` - Catalog entries; `filename` points into the upload directory
//! - `cart` - Pending (user, item, quantity) lines, unique per pair
//! - `orders` - One row per checked-out cart line, with a mutable status
//! - `tower_sessions` - Session storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and embedded in
//! the binary. Run them via:
//! ```bash
//! cargo run -p shopfront-cli -- migrate
//! ```
//!
//! # Connections
//!
//! Handlers never touch the pool directly. They take a [`DbConn`], which
//! checks one connection out for the duration of the request and gives it
//! back when the handler returns, whichever way it returns.

pub mod accounts;
pub mod cart;
pub mod executor;
pub mod items;
pub mod orders;

use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use secrecy::{ExposeSecret, SecretString};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions,
    SqliteSynchronous,
};
use sqlx::{Sqlite, SqlitePool};
use thiserror::Error;

use crate::error::AppError;
use crate::state::AppState;

pub use accounts::{AccountKind, AccountRepository};
pub use cart::CartRepository;
pub use executor::{Param, QueryExecutor, StatementKind};
pub use items::ItemRepository;
pub use orders::OrderRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create an SQLite connection pool with sensible defaults.
///
/// WAL mode lets readers proceed while a request writes; foreign keys are
/// switched on so cart lines follow their item and user.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the database cannot be opened.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Create a private in-memory database with the schema applied.
///
/// The pool holds exactly one connection that never expires; an in-memory
/// SQLite database lives only as long as its connection.
///
/// # Errors
///
/// Returns `RepositoryError` if the connection or a migration fails.
pub async fn create_memory_pool() -> Result<SqlitePool, RepositoryError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Apply the embedded schema migrations.
///
/// # Errors
///
/// Returns `RepositoryError::Migration` if a migration fails or the
/// applied history does not match the embedded files.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), RepositoryError> {
    tracing::info!("Running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// A pooled connection scoped to one request.
///
/// Extracting it acquires a connection; dropping it (at the end of the
/// handler, on success, early return or error alike) hands it back.
pub struct DbConn(PoolConnection<Sqlite>);

impl DbConn {
    /// Check a connection out of the pool.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the pool times out or is closed.
    pub async fn acquire(pool: &SqlitePool) -> Result<Self, RepositoryError> {
        Ok(Self(pool.acquire().await?))
    }
}

impl Deref for DbConn {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DbConn {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl FromRequestParts<AppState> for DbConn {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::acquire(state.pool()).await?)
    }
}
