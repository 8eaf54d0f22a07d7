//! Domain models for the storefront.
//!
//! These are validated values built from database rows (see `db`) and
//! session data. Handlers turn them into view structs for templates.

pub mod account;
pub mod cart;
pub mod item;
pub mod order;
pub mod session;

pub use account::Account;
pub use cart::{Cart, CartLine};
pub use item::{Item, ItemDraft};
pub use order::{Order, OrderSummary};
pub use session::{CurrentAdmin, CurrentUser};
