//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! shop-cli admin create -u root -p 'correct horse battery'
//! ```
//!
//! The web route `/admin/register` only works for a logged-in admin, so the
//! first account has to come from here.

use shopfront_storefront::db::AccountKind;
use shopfront_storefront::services::auth::AuthService;

use super::{CliError, connect};

/// Create a new admin account.
///
/// Applies the same rules as web registration (password length, unique
/// username).
///
/// # Returns
///
/// The ID of the created admin.
///
/// # Errors
///
/// Returns `CliError::Auth` if the username is taken or the password too
/// short, and `CliError::Database` if the database cannot be reached.
pub async fn create(username: &str, password: &str) -> Result<i64, CliError> {
    let pool = connect().await?;
    let mut conn = pool.acquire().await?;

    tracing::info!("Creating admin account: {username}");
    let account = AuthService::new(&mut conn, AccountKind::Admin)
        .register(username, password, password)
        .await?;

    tracing::info!(
        "Admin created successfully! ID: {}, Username: {}",
        account.id,
        account.username
    );
    Ok(account.id)
}
