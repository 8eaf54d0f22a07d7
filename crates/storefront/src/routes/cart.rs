//! Cart route handlers.
//!
//! The cart lives in the `cart` table, keyed by the logged-in user. Every
//! mutation answers with a redirect back to `/cart` (or `/orders` after a
//! successful checkout), carrying a flash message when something was wrong.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{ItemId, Quantity};

use crate::db::{CartRepository, DbConn, ItemRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{FlashLevel, FlashMessage, Flashes, RequireUser, flash_redirect};
use crate::models::{Cart, CartLine};
use crate::services::checkout::checkout as place_orders;

const CART_PATH: &str = "/cart";
const INVALID_VALUES: &str = "Invalid value(s).";

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub item_id: i64,
    pub title: String,
    pub filename: String,
    pub price: String,
    pub quantity: u32,
    pub line_total: String,
}

impl TryFrom<&CartLine> for CartLineView {
    type Error = AppError;

    fn try_from(line: &CartLine) -> Result<Self> {
        let line_total = line.line_total().ok_or_else(|| {
            AppError::Internal(format!("cart line for item {} overflowed", line.item.id))
        })?;

        Ok(Self {
            item_id: line.item.id.as_i64(),
            title: line.item.title.clone(),
            filename: line.item.filename.clone(),
            price: line.item.price.usd(),
            quantity: line.quantity.get(),
            line_total: line_total.usd(),
        })
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub unit_count: u64,
}

impl TryFrom<&Cart> for CartView {
    type Error = AppError;

    fn try_from(cart: &Cart) -> Result<Self> {
        let total = cart
            .total()
            .ok_or_else(|| AppError::Internal("cart total overflowed".to_string()))?;

        Ok(Self {
            lines: cart
                .lines
                .iter()
                .map(CartLineView::try_from)
                .collect::<Result<_>>()?,
            total: total.usd(),
            unit_count: cart.unit_count(),
        })
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "user/cart.html")]
pub struct CartTemplate {
    pub flashes: Vec<FlashMessage>,
    pub username: String,
    pub cart: CartView,
}

/// Add-to-cart and update-quantity form data.
///
/// Fields stay strings so bad input becomes a flash, not a 422.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub qty: String,
}

impl QuantityForm {
    fn parse(&self) -> Option<(ItemId, Quantity)> {
        let id = self.id.trim().parse().ok()?;
        let qty = self.qty.trim().parse().ok()?;
        Some((id, qty))
    }
}

/// Remove-from-cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    #[serde(default)]
    pub id: String,
}

/// Display the cart with line totals and grand total.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    RequireUser(user): RequireUser,
    Flashes(flashes): Flashes,
    mut conn: DbConn,
) -> Result<CartTemplate> {
    let cart = CartRepository::new(&mut conn).cart_for(user.id).await?;

    Ok(CartTemplate {
        flashes,
        username: user.username.into_inner(),
        cart: CartView::try_from(&cart)?,
    })
}

/// Add an item to the cart, merging with an existing entry.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn add(
    RequireUser(user): RequireUser,
    session: Session,
    mut conn: DbConn,
    Form(form): Form<QuantityForm>,
) -> Result<Response> {
    let Some((item_id, quantity)) = form.parse() else {
        return flash_redirect(&session, FlashLevel::Error, INVALID_VALUES, CART_PATH).await;
    };

    if ItemRepository::new(&mut conn).get(item_id).await?.is_none() {
        return flash_redirect(&session, FlashLevel::Error, "Item not found.", CART_PATH).await;
    }

    let Some(total) = CartRepository::new(&mut conn)
        .add(user.id, item_id, quantity)
        .await?
    else {
        return flash_redirect(&session, FlashLevel::Error, INVALID_VALUES, CART_PATH).await;
    };
    tracing::info!(item_id = %item_id, added = %quantity, total = %total, "Added to cart");

    Ok(Redirect::to(CART_PATH).into_response())
}

/// Set the quantity of a cart entry.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_quantity(
    RequireUser(user): RequireUser,
    session: Session,
    mut conn: DbConn,
    Form(form): Form<QuantityForm>,
) -> Result<Response> {
    let Some((item_id, quantity)) = form.parse() else {
        return flash_redirect(&session, FlashLevel::Error, INVALID_VALUES, CART_PATH).await;
    };

    match CartRepository::new(&mut conn)
        .set_quantity(user.id, item_id, quantity)
        .await
    {
        Ok(()) => Ok(Redirect::to(CART_PATH).into_response()),
        Err(RepositoryError::NotFound) => {
            flash_redirect(&session, FlashLevel::Error, "Item is not in your cart.", CART_PATH).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove an entry from the cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn remove(
    RequireUser(user): RequireUser,
    session: Session,
    mut conn: DbConn,
    Form(form): Form<RemoveForm>,
) -> Result<Response> {
    let Ok(item_id) = form.id.trim().parse::<ItemId>() else {
        return flash_redirect(&session, FlashLevel::Error, INVALID_VALUES, CART_PATH).await;
    };

    CartRepository::new(&mut conn)
        .remove(user.id, item_id)
        .await?;

    Ok(Redirect::to(CART_PATH).into_response())
}

/// Turn the cart into orders.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn checkout(
    RequireUser(user): RequireUser,
    session: Session,
    mut conn: DbConn,
) -> Result<Response> {
    let placed = place_orders(&mut conn, user.id).await?;

    if placed == 0 {
        return flash_redirect(&session, FlashLevel::Error, "Your cart is empty.", CART_PATH).await;
    }

    flash_redirect(
        &session,
        FlashLevel::Info,
        "Thank you for your purchase.",
        "/orders",
    )
    .await
}
