//! Core types for Shopfront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod image;
pub mod price;
pub mod quantity;
pub mod status;
pub mod username;

pub use id::*;
pub use image::{ImageExtension, ImageExtensionError};
pub use price::{Price, PriceError};
pub use quantity::{Quantity, QuantityError};
pub use status::{OrderStatus, OrderStatusError};
pub use username::{Username, UsernameError};
