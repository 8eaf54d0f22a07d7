//! Admin panel route handlers.
//!
//! Everything here except login and logout sits behind [`RequireAdmin`].
//! Admin accounts live in their own table; a shopper session never
//! satisfies the admin guard.
//!
//! [`RequireAdmin`]: crate::middleware::RequireAdmin

pub mod auth;
pub mod items;
pub mod orders;

use axum::response::Redirect;

/// Landing page of the admin panel.
pub const ORDERS_PATH: &str = "/admin/orders";

/// `GET /admin`: jump to the orders board.
pub async fn index() -> Redirect {
    Redirect::to(ORDERS_PATH)
}
