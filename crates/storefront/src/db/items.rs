//! Item repository for catalog operations.

use sqlx::sqlite::SqliteConnection;

use shopfront_core::{ItemId, Price};

use super::executor::QueryExecutor;
use super::RepositoryError;
use crate::models::{Item, ItemDraft};
use crate::params;

/// Maximum number of results returned by [`ItemRepository::search`].
pub const SEARCH_LIMIT: i64 = 15;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ItemRow {
    pub(super) id: i64,
    pub(super) title: String,
    pub(super) price: String,
    pub(super) description: String,
    pub(super) filename: String,
}

impl TryFrom<ItemRow> for Item {
    type Error = RepositoryError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let price = Price::parse(&row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for item {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ItemId::new(row.id),
            title: row.title,
            price,
            description: row.description,
            filename: row.filename,
        })
    }
}

/// Escape `LIKE` wildcards so the term matches literally, and wrap it for a
/// substring match. Pair with `ESCAPE '\'`.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for item database operations.
pub struct ItemRepository<'c> {
    exec: QueryExecutor<'c>,
}

impl<'c> ItemRepository<'c> {
    /// Create a new item repository.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self {
            exec: QueryExecutor::new(conn),
        }
    }

    /// List every item, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list_all(&mut self) -> Result<Vec<Item>, RepositoryError> {
        let rows: Vec<ItemRow> = self
            .exec
            .read(
                "SELECT id, title, price, description, filename FROM items ORDER BY id",
                &[],
            )
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an item by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored price is invalid.
    pub async fn get(&mut self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let row: Option<ItemRow> = self
            .exec
            .read_optional(
                "SELECT id, title, price, description, filename FROM items WHERE id = ?",
                &params![id],
            )
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Items whose title contains `term`, ignoring ASCII case.
    ///
    /// At most [`SEARCH_LIMIT`] items are returned. `%` and `_` in the term
    /// match themselves.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn search(&mut self, term: &str) -> Result<Vec<Item>, RepositoryError> {
        let rows: Vec<ItemRow> = self
            .exec
            .read(
                r"
                SELECT id, title, price, description, filename
                FROM items
                WHERE title LIKE ? ESCAPE '\'
                ORDER BY id
                LIMIT ?
                ",
                &params![like_pattern(term), SEARCH_LIMIT],
            )
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// The ID the next created item will get (`MAX(id) + 1`).
    ///
    /// The image file is named after this ID before the row exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn next_id(&mut self) -> Result<ItemId, RepositoryError> {
        let next: i64 = self
            .exec
            .read_scalar("SELECT COALESCE(MAX(id), 0) + 1 FROM items", &[])
            .await?;
        Ok(ItemId::new(next))
    }

    /// Insert an item with an explicit ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the ID is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &mut self,
        id: ItemId,
        draft: &ItemDraft,
        filename: &str,
    ) -> Result<Item, RepositoryError> {
        self.exec
            .insert(
                "INSERT INTO items (id, title, price, description, filename) VALUES (?, ?, ?, ?, ?)",
                &params![
                    id,
                    draft.title.as_str(),
                    draft.price,
                    draft.description.as_str(),
                    filename
                ],
            )
            .await?;

        Ok(Item {
            id,
            title: draft.title.clone(),
            price: draft.price,
            description: draft.description.clone(),
            filename: filename.to_owned(),
        })
    }

    /// Overwrite title, price and description of an item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no item has this ID.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(&mut self, id: ItemId, draft: &ItemDraft) -> Result<(), RepositoryError> {
        let changed = self
            .exec
            .update(
                "UPDATE items SET title = ?, price = ?, description = ? WHERE id = ?",
                &params![
                    draft.title.as_str(),
                    draft.price,
                    draft.description.as_str(),
                    id
                ],
            )
            .await?;

        if changed == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Number of orders that reference the item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn order_count(&mut self, id: ItemId) -> Result<i64, RepositoryError> {
        self.exec
            .read_scalar("SELECT COUNT(*) FROM orders WHERE item_id = ?", &params![id])
            .await
    }

    /// Delete an item. Cart entries for it go with it.
    ///
    /// Callers check [`order_count`](Self::order_count) first; the
    /// `orders.item_id` foreign key rejects the delete otherwise.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no item has this ID.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&mut self, id: ItemId) -> Result<(), RepositoryError> {
        match self
            .exec
            .delete("DELETE FROM items WHERE id = ?", &params![id])
            .await?
        {
            0 => Err(RepositoryError::NotFound),
            _ => Ok(()),
        }
    }
}
