//! Catalog pages: item listing and item detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::Path;
use tracing::instrument;

use shopfront_core::ItemId;

use crate::db::{DbConn, ItemRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{FlashMessage, Flashes, RequireUser};
use crate::models::Item;

/// Item display data for templates.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub id: i64,
    pub title: String,
    pub price: String,
    /// Plain decimal, for form inputs.
    pub price_input: String,
    pub description: String,
    pub filename: String,
}

impl From<&Item> for ItemView {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.as_i64(),
            title: item.title.clone(),
            price: item.price.usd(),
            price_input: item.price.to_string(),
            description: item.description.clone(),
            filename: item.filename.clone(),
        }
    }
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "user/index.html")]
pub struct IndexTemplate {
    pub flashes: Vec<FlashMessage>,
    pub username: String,
    pub items: Vec<ItemView>,
}

/// Item detail template.
#[derive(Template, WebTemplate)]
#[template(path = "user/item.html")]
pub struct ItemTemplate {
    pub flashes: Vec<FlashMessage>,
    pub username: String,
    pub item: ItemView,
}

/// Parse an item ID from a path segment; anything else is a 404.
pub(crate) fn parse_item_path(raw: &str) -> Result<ItemId> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("item {raw}")))
}

/// List every item.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    RequireUser(user): RequireUser,
    Flashes(flashes): Flashes,
    mut conn: DbConn,
) -> Result<IndexTemplate> {
    let items = ItemRepository::new(&mut conn).list_all().await?;

    Ok(IndexTemplate {
        flashes,
        username: user.username.into_inner(),
        items: items.iter().map(ItemView::from).collect(),
    })
}

/// Show one item with its add-to-cart form.
#[instrument(skip_all, fields(user_id = %user.id, item_id = %id))]
pub async fn show(
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
    Flashes(flashes): Flashes,
    mut conn: DbConn,
) -> Result<ItemTemplate> {
    let item_id = parse_item_path(&id)?;
    let item = ItemRepository::new(&mut conn)
        .get(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("item {item_id}")))?;

    Ok(ItemTemplate {
        flashes,
        username: user.username.into_inner(),
        item: ItemView::from(&item),
    })
}
