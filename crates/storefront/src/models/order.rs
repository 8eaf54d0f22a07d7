//! Orders placed at checkout.

use chrono::{DateTime, Utc};

use shopfront_core::{ItemId, OrderId, OrderStatus, Price, Quantity, UserId};

/// Format used for `orders.created_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single order row (domain type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub item_id: ItemId,
    pub quantity: Quantity,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
}

/// An order joined with its item and buyer, for listings.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub order: Order,
    pub item_title: String,
    pub item_price: Price,
    pub username: String,
}

impl OrderSummary {
    /// Item price times ordered quantity, `None` on decimal overflow.
    #[must_use]
    pub fn total(&self) -> Option<Price> {
        self.item_price.checked_times(self.order.quantity.get())
    }
}
