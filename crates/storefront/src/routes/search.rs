//! Item search API.

use axum::{Json, extract::Query};
use serde::Deserialize;
use tracing::instrument;

use crate::db::{DbConn, ItemRepository};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::Item;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Items whose title contains `q`, as JSON.
///
/// Returns an empty array when `q` is missing or empty.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn search(
    RequireUser(user): RequireUser,
    Query(query): Query<SearchQuery>,
    mut conn: DbConn,
) -> Result<Json<Vec<Item>>> {
    let term = query.q.unwrap_or_default();
    if term.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let items = ItemRepository::new(&mut conn).search(&term).await?;
    tracing::debug!(term = %term, results = items.len(), "Search");

    Ok(Json(items))
}
