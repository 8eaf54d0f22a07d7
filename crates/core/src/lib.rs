//! Shopfront Core - Shared domain types.
//!
//! This crate provides the types used across all Shopfront components:
//! - `storefront` - The web application (catalog, cart, checkout, admin panel)
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. Anything that needs to be stored is converted to and from
//! plain values at the repository boundary.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, order statuses, prices, quantities, usernames and
//!   image extensions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
