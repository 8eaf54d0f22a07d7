//! Order history for the logged-in user.

use askama::Template;
use askama_web::WebTemplate;
use tracing::instrument;

use crate::db::{DbConn, OrderRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{FlashMessage, Flashes, RequireUser};
use crate::models::OrderSummary;
use crate::models::order::TIMESTAMP_FORMAT;

/// Order row display data for templates.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: i64,
    pub item_id: i64,
    pub title: String,
    pub username: String,
    pub quantity: u32,
    pub price: String,
    pub total: String,
    pub created_at: String,
    pub status: &'static str,
    pub status_label: &'static str,
}

impl TryFrom<&OrderSummary> for OrderView {
    type Error = AppError;

    fn try_from(summary: &OrderSummary) -> Result<Self> {
        let total = summary.total().ok_or_else(|| {
            AppError::Internal(format!("total of order {} overflowed", summary.order.id))
        })?;

        Ok(Self {
            id: summary.order.id.as_i64(),
            item_id: summary.order.item_id.as_i64(),
            title: summary.item_title.clone(),
            username: summary.username.clone(),
            quantity: summary.order.quantity.get(),
            price: summary.item_price.usd(),
            total: total.usd(),
            created_at: summary.order.created_at.format(TIMESTAMP_FORMAT).to_string(),
            status: summary.order.status.as_str(),
            status_label: summary.order.status.label(),
        })
    }
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "user/orders.html")]
pub struct OrdersTemplate {
    pub flashes: Vec<FlashMessage>,
    pub username: String,
    pub orders: Vec<OrderView>,
}

/// List the user's orders, newest first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    RequireUser(user): RequireUser,
    Flashes(flashes): Flashes,
    mut conn: DbConn,
) -> Result<OrdersTemplate> {
    let orders = OrderRepository::new(&mut conn).for_user(user.id).await?;

    Ok(OrdersTemplate {
        flashes,
        username: user.username.into_inner(),
        orders: orders
            .iter()
            .map(OrderView::try_from)
            .collect::<Result<_>>()?,
    })
}
