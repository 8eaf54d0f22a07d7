//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction name)
//! 2. `TraceLayer` (request tracing)
//! 3. No-cache response headers
//! 4. Session layer (tower-sessions with SQLite store)
//! 5. Flash restore on server errors
//! 6. Oversized-upload redirect (admin routes only)
//!
//! Auth guards are extractors, not layers; see [`auth`].

pub mod auth;
pub mod flash;
pub mod session;
pub mod upload_limit;

pub use auth::{
    ADMIN_LOGIN_PATH, RequireAdmin, RequireUser, USER_LOGIN_PATH, clear_current_admin,
    clear_current_user, set_current_admin, set_current_user,
};
pub use flash::{
    FlashLevel, FlashMessage, Flashes, flash_redirect, keep_flashes_on_error, push_flash,
};
pub use session::{create_session_layer, create_session_store};
pub use upload_limit::{NEW_ITEM_PATH, redirect_oversized_uploads, too_large_message};
