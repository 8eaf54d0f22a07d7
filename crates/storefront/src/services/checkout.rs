//! Checkout: turn a user's cart into orders.

use chrono::Utc;
use sqlx::Connection;
use sqlx::sqlite::SqliteConnection;

use shopfront_core::UserId;

use crate::db::{CartRepository, OrderRepository, RepositoryError};

/// Convert every cart entry of `user` into a pending order and empty the
/// cart, all in one transaction.
///
/// Returns the number of orders placed; zero means the cart was empty and
/// nothing changed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any statement fails. The
/// transaction is rolled back, so the cart and orders are untouched.
pub async fn checkout(conn: &mut SqliteConnection, user: UserId) -> Result<u64, RepositoryError> {
    let mut tx = conn.begin().await?;

    let placed = OrderRepository::new(&mut tx)
        .place_from_cart(user, Utc::now())
        .await?;
    if placed == 0 {
        return Ok(0);
    }

    let cleared = CartRepository::new(&mut tx).clear(user).await?;
    tx.commit().await?;

    tracing::info!(user_id = %user, orders = placed, cleared, "Checkout complete");
    Ok(placed)
}
