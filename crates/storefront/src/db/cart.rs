//! Cart repository.
//!
//! Each (user, item) pair has at most one row; adding an item already in
//! the cart raises the stored quantity.

use sqlx::sqlite::SqliteConnection;

use shopfront_core::{ItemId, Quantity, UserId};

use super::executor::QueryExecutor;
use super::items::ItemRow;
use super::RepositoryError;
use crate::models::{Cart, CartLine};
use crate::params;

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    quantity: i64,
    #[sqlx(flatten)]
    item: ItemRow,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::try_from(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "invalid cart quantity for item {}: {e}",
                row.item.id
            ))
        })?;

        Ok(Self {
            item: row.item.try_into()?,
            quantity,
        })
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'c> {
    exec: QueryExecutor<'c>,
}

impl<'c> CartRepository<'c> {
    /// Create a new cart repository.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self {
            exec: QueryExecutor::new(conn),
        }
    }

    /// All cart entries of a user joined with their items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn cart_for(&mut self, user: UserId) -> Result<Cart, RepositoryError> {
        let rows: Vec<CartLineRow> = self
            .exec
            .read(
                r"
                SELECT c.quantity, i.id, i.title, i.price, i.description, i.filename
                FROM cart c
                JOIN items i ON i.id = c.item_id
                WHERE c.user_id = ?
                ORDER BY c.id
                ",
                &params![user],
            )
            .await?;

        let lines = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Cart { lines })
    }

    /// Quantity of one item in a user's cart, if present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored quantity is invalid.
    pub async fn quantity_of(
        &mut self,
        user: UserId,
        item: ItemId,
    ) -> Result<Option<Quantity>, RepositoryError> {
        let row: Option<(i64,)> = self
            .exec
            .read_optional(
                "SELECT quantity FROM cart WHERE user_id = ? AND item_id = ?",
                &params![user, item],
            )
            .await?;

        row.map(|(q,)| {
            Quantity::try_from(q).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid cart quantity: {e}"))
            })
        })
        .transpose()
    }

    /// Add `quantity` of an item, merging with an existing entry.
    ///
    /// Returns the entry's quantity after the merge, or `None` (leaving the
    /// entry untouched) when the merged quantity would exceed
    /// [`Quantity::MAX`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails (including
    /// an unknown user or item).
    pub async fn add(
        &mut self,
        user: UserId,
        item: ItemId,
        quantity: Quantity,
    ) -> Result<Option<Quantity>, RepositoryError> {
        let merged = match self.quantity_of(user, item).await? {
            Some(existing) => {
                let Some(merged) = existing.checked_add(quantity) else {
                    return Ok(None);
                };
                self.exec
                    .update(
                        "UPDATE cart SET quantity = ? WHERE user_id = ? AND item_id = ?",
                        &params![merged, user, item],
                    )
                    .await?;
                merged
            }
            None => {
                self.exec
                    .insert(
                        "INSERT INTO cart (user_id, item_id, quantity) VALUES (?, ?, ?)",
                        &params![user, item, quantity],
                    )
                    .await?;
                quantity
            }
        };
        Ok(Some(merged))
    }

    /// Set the quantity of an existing entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item is not in the cart.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_quantity(
        &mut self,
        user: UserId,
        item: ItemId,
        quantity: Quantity,
    ) -> Result<(), RepositoryError> {
        let changed = self
            .exec
            .update(
                "UPDATE cart SET quantity = ? WHERE user_id = ? AND item_id = ?",
                &params![quantity, user, item],
            )
            .await?;

        if changed == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove one entry. Returns whether a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn remove(&mut self, user: UserId, item: ItemId) -> Result<bool, RepositoryError> {
        let removed = self
            .exec
            .delete(
                "DELETE FROM cart WHERE user_id = ? AND item_id = ?",
                &params![user, item],
            )
            .await?;
        Ok(removed > 0)
    }

    /// Remove every entry of a user. Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn clear(&mut self, user: UserId) -> Result<u64, RepositoryError> {
        self.exec
            .delete("DELETE FROM cart WHERE user_id = ?", &params![user])
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::db::{AccountKind, AccountRepository, ItemRepository, create_memory_pool};
    use crate::models::ItemDraft;
    use shopfront_core::{Price, Username};

    /// Insert a user and `n` items priced 1.50, 2.50, ...
    pub(crate) async fn seed(conn: &mut SqliteConnection, n: i64) -> UserId {
        let user = AccountRepository::new(conn, AccountKind::User)
            .create(&Username::parse("shopper").unwrap(), "h")
            .await
            .unwrap();

        let mut items = ItemRepository::new(conn);
        for i in 1..=n {
            let draft = ItemDraft {
                title: format!("Item {i}"),
                price: Price::parse(&format!("{i}.50")).unwrap(),
                description: String::new(),
            };
            items
                .create(ItemId::new(i), &draft, &format!("{i}.png"))
                .await
                .unwrap();
        }
        UserId::new(user)
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_adding_twice_merges_quantities() {
        let pool = create_memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let user = seed(&mut conn, 1).await;
        let mut repo = CartRepository::new(&mut conn);

        repo.add(user, ItemId::new(1), qty(2)).await.unwrap();
        let merged = repo.add(user, ItemId::new(1), qty(3)).await.unwrap();
        assert_eq!(merged, Some(qty(5)));

        let cart = repo.cart_for(user).await.unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, qty(5));
        assert_eq!(cart.total().unwrap().usd(), "$7.50");
    }

    #[tokio::test]
    async fn test_merge_past_cap_leaves_entry_unchanged() {
        let pool = create_memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let user = seed(&mut conn, 1).await;
        let mut repo = CartRepository::new(&mut conn);

        repo.add(user, ItemId::new(1), qty(Quantity::MAX - 1))
            .await
            .unwrap();
        assert_eq!(
            repo.add(user, ItemId::new(1), qty(2)).await.unwrap(),
            None
        );
        assert_eq!(
            repo.quantity_of(user, ItemId::new(1)).await.unwrap(),
            Some(qty(Quantity::MAX - 1))
        );

        let merged = repo.add(user, ItemId::new(1), qty(1)).await.unwrap();
        assert_eq!(merged, Some(qty(Quantity::MAX)));
    }

    #[tokio::test]
    async fn test_set_remove_and_clear() {
        let pool = create_memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let user = seed(&mut conn, 3).await;
        let mut repo = CartRepository::new(&mut conn);

        for i in 1..=3 {
            repo.add(user, ItemId::new(i), qty(1)).await.unwrap();
        }

        repo.set_quantity(user, ItemId::new(2), qty(7)).await.unwrap();
        assert_eq!(
            repo.quantity_of(user, ItemId::new(2)).await.unwrap(),
            Some(qty(7))
        );
        assert!(matches!(
            repo.set_quantity(user, ItemId::new(99), qty(1)).await,
            Err(RepositoryError::NotFound)
        ));

        assert!(repo.remove(user, ItemId::new(1)).await.unwrap());
        assert!(!repo.remove(user, ItemId::new(1)).await.unwrap());

        assert_eq!(repo.clear(user).await.unwrap(), 2);
        assert!(repo.cart_for(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_item_cascades_to_cart() {
        let pool = create_memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let user = seed(&mut conn, 2).await;

        CartRepository::new(&mut conn)
            .add(user, ItemId::new(1), qty(1))
            .await
            .unwrap();
        ItemRepository::new(&mut conn)
            .delete(ItemId::new(1))
            .await
            .unwrap();

        let cart = CartRepository::new(&mut conn).cart_for(user).await.unwrap();
        assert!(cart.is_empty());
    }
}
