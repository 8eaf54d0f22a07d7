//! Shopfront storefront library.
//!
//! The web application as a library: catalog, cart, checkout, order
//! history and the admin panel, over a single SQLite database. The
//! `shopfront` binary and the request-level tests both assemble it through
//! [`app::build_router`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
