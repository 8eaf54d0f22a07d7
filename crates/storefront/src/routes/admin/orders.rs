//! Order board: every order grouped by status, and status updates.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{OrderId, OrderStatus};

use super::ORDERS_PATH;
use crate::db::{DbConn, OrderRepository, RepositoryError};
use crate::error::Result;
use crate::filters;
use crate::middleware::{FlashLevel, FlashMessage, Flashes, RequireAdmin, flash_redirect};
use crate::routes::orders::OrderView;

/// Orders sharing one status.
#[derive(Debug, Clone)]
pub struct StatusGroup {
    pub status: &'static str,
    pub label: &'static str,
    pub orders: Vec<OrderView>,
}

/// Order board template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrdersTemplate {
    pub flashes: Vec<FlashMessage>,
    pub admin: String,
    pub groups: Vec<StatusGroup>,
    /// Every status, for the per-order select box.
    pub statuses: Vec<(&'static str, &'static str)>,
}

/// Status update form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub status: String,
}

/// Show every order, grouped by status in a fixed order.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    Flashes(flashes): Flashes,
    mut conn: DbConn,
) -> Result<OrdersTemplate> {
    let orders = OrderRepository::new(&mut conn).list_all().await?;

    let groups = OrderStatus::ALL
        .iter()
        .map(|&status| -> Result<StatusGroup> {
            Ok(StatusGroup {
                status: status.as_str(),
                label: status.label(),
                orders: orders
                    .iter()
                    .filter(|o| o.order.status == status)
                    .map(OrderView::try_from)
                    .collect::<Result<_>>()?,
            })
        })
        .collect::<Result<_>>()?;

    Ok(OrdersTemplate {
        flashes,
        admin: admin.username.into_inner(),
        groups,
        statuses: OrderStatus::ALL
            .iter()
            .map(|s| (s.as_str(), s.label()))
            .collect(),
    })
}

/// Move an order to another status.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %form.order_id, status = %form.status))]
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    mut conn: DbConn,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let Ok(status) = form.status.trim().parse::<OrderStatus>() else {
        return flash_redirect(&session, FlashLevel::Error, "Invalid status.", ORDERS_PATH).await;
    };
    let Ok(order_id) = form.order_id.trim().parse::<OrderId>() else {
        return flash_redirect(&session, FlashLevel::Error, "Invalid order.", ORDERS_PATH).await;
    };

    match OrderRepository::new(&mut conn)
        .set_status(order_id, status)
        .await
    {
        Ok(()) => {
            tracing::info!("Order status updated");
            Ok(Redirect::to(ORDERS_PATH).into_response())
        }
        Err(RepositoryError::NotFound) => {
            flash_redirect(&session, FlashLevel::Error, "Order not found.", ORDERS_PATH).await
        }
        Err(e) => Err(e.into()),
    }
}
