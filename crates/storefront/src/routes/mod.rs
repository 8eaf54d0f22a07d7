//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Shop (requires a logged-in user)
//! GET  /                       - Item listing
//! GET  /item/{id}              - Item detail
//! GET  /cart                   - Cart page
//! POST /cart                   - Add to cart
//! POST /update-qty             - Set quantity of a cart entry
//! POST /delete                 - Remove a cart entry
//! POST /checkout               - Turn the cart into orders
//! GET  /orders                 - Order history
//! GET  /api/search?q=          - Title search (JSON)
//! GET  /change-password        - Password form
//! POST /change-password        - Change password
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! GET  /register               - Register page
//! POST /register               - Register action
//! GET  /logout                 - Logout
//!
//! # Admin (requires a logged-in admin)
//! GET  /admin                  - Redirect to /admin/orders
//! GET  /admin/orders           - Orders grouped by status
//! POST /admin/update-status    - Change an order's status
//! GET  /admin/items            - Item list
//! GET  /admin/new-item         - New item form
//! POST /admin/new-item         - Create item (multipart, with image)
//! GET  /admin/edit-item/{id}   - Edit item form
//! POST /admin/edit-item/{id}   - Save item
//! POST /admin/delete-item      - Delete item
//! GET  /admin/register         - Register another admin
//! POST /admin/register         - Register action
//! GET  /admin/login            - Admin login page
//! POST /admin/login            - Admin login action
//! GET  /admin/logout           - Admin logout
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod home;
pub mod orders;
pub mod search;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::middleware::redirect_oversized_uploads;
use crate::state::AppState;

/// Room for the text fields and multipart framing around the image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the shop routes router.
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/item/{id}", get(home::show))
        .route("/cart", get(cart::show).post(cart::add))
        .route("/update-qty", post(cart::update_quantity))
        .route("/delete", post(cart::remove))
        .route("/checkout", post(cart::checkout))
        .route("/orders", get(orders::index))
        .route("/api/search", get(search::search))
        .route(
            "/change-password",
            get(auth::change_password_page).post(auth::change_password),
        )
}

/// Create the shopper auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", get(auth::logout))
}

/// Create the admin routes router.
///
/// The new-item route accepts bodies up to the configured upload limit;
/// anything that still ends in a `413` becomes a redirect back to the form.
pub fn admin_routes(state: &AppState) -> Router<AppState> {
    let body_limit = state.config().max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/", get(admin::index))
        .route("/orders", get(admin::orders::index))
        .route("/update-status", post(admin::orders::update_status))
        .route("/items", get(admin::items::index))
        .route(
            "/new-item",
            get(admin::items::new_item_page)
                .post(admin::items::create)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/edit-item/{id}",
            get(admin::items::edit_page).post(admin::items::update),
        )
        .route("/delete-item", post(admin::items::delete))
        .route(
            "/register",
            get(admin::auth::register_page).post(admin::auth::register),
        )
        .route(
            "/login",
            get(admin::auth::login_page).post(admin::auth::login),
        )
        .route("/logout", get(admin::auth::logout))
        .layer(from_fn_with_state(state.clone(), redirect_oversized_uploads))
}

/// Create all routes for the storefront.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(shop_routes())
        .merge(auth_routes())
        .nest("/admin", admin_routes(state))
}
