//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password registration, login and password change
//! - `checkout` - Turning a cart into orders atomically
//! - `uploads` - Item image storage on disk

pub mod auth;
pub mod checkout;
pub mod uploads;
