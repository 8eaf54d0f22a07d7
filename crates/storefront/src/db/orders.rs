//! Order repository.

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::SqliteConnection;

use shopfront_core::{ItemId, OrderId, OrderStatus, Price, Quantity, UserId};

use super::executor::{Param, QueryExecutor};
use super::RepositoryError;
use crate::models::order::TIMESTAMP_FORMAT;
use crate::models::{Order, OrderSummary};
use crate::params;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    id: i64,
    user_id: i64,
    item_id: i64,
    quantity: i64,
    created_at: String,
    status: String,
    title: String,
    price: String,
    username: String,
}

impl TryFrom<OrderSummaryRow> for OrderSummary {
    type Error = RepositoryError;

    fn try_from(row: OrderSummaryRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, e: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!("invalid {what} for order {}: {e}", row.id))
        };

        let quantity = Quantity::try_from(row.quantity).map_err(|e| corrupt("quantity", &e))?;
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|e| corrupt("status", &e))?;
        let created_at = parse_timestamp(&row.created_at).map_err(|e| corrupt("timestamp", &e))?;
        let item_price = Price::parse(&row.price).map_err(|e| corrupt("price", &e))?;

        Ok(Self {
            order: Order {
                id: OrderId::new(row.id),
                user_id: UserId::new(row.user_id),
                item_id: ItemId::new(row.item_id),
                quantity,
                created_at,
                status,
            },
            item_title: row.title,
            item_price,
            username: row.username,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map(|naive| naive.and_utc())
}

const SUMMARY_SELECT: &str = r"
    SELECT o.id, o.user_id, o.item_id, o.quantity, o.created_at, o.status,
           i.title, i.price, u.username
    FROM orders o
    JOIN items i ON i.id = o.item_id
    JOIN users u ON u.id = o.user_id
";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'c> {
    exec: QueryExecutor<'c>,
}

impl<'c> OrderRepository<'c> {
    /// Create a new order repository.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self {
            exec: QueryExecutor::new(conn),
        }
    }

    /// Copy every cart entry of `user` into a pending order stamped `now`.
    ///
    /// Does not touch the cart. Run this and the cart clear on the same
    /// transaction connection.
    ///
    /// Returns the number of orders created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails; orders
    /// inserted before the failure remain until the transaction is dropped.
    pub async fn place_from_cart(
        &mut self,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let lines: Vec<(i64, i64)> = self
            .exec
            .read(
                "SELECT item_id, quantity FROM cart WHERE user_id = ? ORDER BY id",
                &params![user],
            )
            .await?;

        let stamp = now.format(TIMESTAMP_FORMAT).to_string();
        let rows: Vec<Vec<Param>> = lines
            .into_iter()
            .map(|(item_id, quantity)| {
                params![user, item_id, quantity, stamp.as_str(), OrderStatus::Pending]
            })
            .collect();

        self.exec
            .insert_many(
                "INSERT INTO orders (user_id, item_id, quantity, created_at, status) VALUES (?, ?, ?, ?, ?)",
                &rows,
            )
            .await
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn for_user(&mut self, user: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let sql = format!("{SUMMARY_SELECT} WHERE o.user_id = ? ORDER BY o.created_at DESC, o.id DESC");
        let rows: Vec<OrderSummaryRow> = self.exec.read(&sql, &params![user]).await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn list_all(&mut self) -> Result<Vec<OrderSummary>, RepositoryError> {
        let sql = format!("{SUMMARY_SELECT} ORDER BY o.created_at DESC, o.id DESC");
        let rows: Vec<OrderSummaryRow> = self.exec.read(&sql, &[]).await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Change the status of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let changed = self
            .exec
            .update(
                "UPDATE orders SET status = ? WHERE id = ?",
                &params![status, id],
            )
            .await?;

        if changed == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::cart::tests::seed;
    use crate::db::{CartRepository, create_memory_pool};
    use chrono::TimeZone;
    use sqlx::Connection;

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_place_from_cart_copies_every_line() {
        let pool = create_memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let user = seed(&mut conn, 2).await;

        let mut cart = CartRepository::new(&mut conn);
        cart.add(user, ItemId::new(1), qty(2)).await.unwrap();
        cart.add(user, ItemId::new(2), qty(1)).await.unwrap();

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let placed = OrderRepository::new(&mut conn)
            .place_from_cart(user, now)
            .await
            .unwrap();
        assert_eq!(placed, 2);

        let orders = OrderRepository::new(&mut conn).for_user(user).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.order.status == OrderStatus::Pending));
        assert!(orders.iter().all(|o| o.order.created_at == now));
        assert_eq!(orders.iter().map(|o| o.order.quantity.get()).sum::<u32>(), 3);
        assert_eq!(orders[0].username, "shopper");
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let pool = create_memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let user = seed(&mut conn, 1).await;
        CartRepository::new(&mut conn)
            .add(user, ItemId::new(1), qty(4))
            .await
            .unwrap();

        {
            let mut tx = conn.begin().await.unwrap();
            OrderRepository::new(&mut tx)
                .place_from_cart(user, Utc::now())
                .await
                .unwrap();
            CartRepository::new(&mut tx).clear(user).await.unwrap();
            // dropped without commit
        }

        let orders = OrderRepository::new(&mut conn).for_user(user).await.unwrap();
        assert!(orders.is_empty());
        let cart = CartRepository::new(&mut conn).cart_for(user).await.unwrap();
        assert_eq!(cart.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_set_status() {
        let pool = create_memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let user = seed(&mut conn, 1).await;
        CartRepository::new(&mut conn)
            .add(user, ItemId::new(1), qty(1))
            .await
            .unwrap();
        OrderRepository::new(&mut conn)
            .place_from_cart(user, Utc::now())
            .await
            .unwrap();

        let mut repo = OrderRepository::new(&mut conn);
        let id = repo.list_all().await.unwrap()[0].order.id;
        repo.set_status(id, OrderStatus::Sent).await.unwrap();

        assert_eq!(repo.list_all().await.unwrap()[0].order.status, OrderStatus::Sent);
        assert!(matches!(
            repo.set_status(OrderId::new(999), OrderStatus::Sent).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_item_with_orders_cannot_be_deleted() {
        let pool = create_memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let user = seed(&mut conn, 1).await;
        CartRepository::new(&mut conn)
            .add(user, ItemId::new(1), qty(1))
            .await
            .unwrap();
        OrderRepository::new(&mut conn)
            .place_from_cart(user, Utc::now())
            .await
            .unwrap();

        let mut items = crate::db::ItemRepository::new(&mut conn);
        assert_eq!(items.order_count(ItemId::new(1)).await.unwrap(), 1);
        assert!(matches!(
            items.delete(ItemId::new(1)).await,
            Err(RepositoryError::Database(_))
        ));
    }
}
