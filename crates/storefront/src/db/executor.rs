//! Single-statement query execution.
//!
//! Every SQL statement in the shop goes through [`QueryExecutor`]. The caller
//! picks the statement kind by picking the method, and each kind has a fixed
//! result contract:
//!
//! | Kind     | Method                  | Returns                     |
//! |----------|-------------------------|-----------------------------|
//! | `Read`   | `read`, `read_optional`, `read_scalar` | decoded rows |
//! | `Insert` | `insert`                | id of the new row           |
//! | `Insert` | `insert_many`           | number of rows inserted     |
//! | `Update` | `update`                | number of rows changed      |
//! | `Delete` | `delete`                | number of rows removed      |
//!
//! Writes on a plain pooled connection commit as soon as they finish. Give
//! the executor a transaction's connection to group statements; the caller
//! then commits the transaction.
//!
//! Failures are logged with the statement and its parameters and handed
//! back unchanged. Nothing is retried.

use std::fmt;
use std::time::Instant;

use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteQueryResult, SqliteRow};
use sqlx::{FromRow, Sqlite};

use shopfront_core::{AdminId, ItemId, OrderId, OrderStatus, Price, Quantity, UserId};

use super::RepositoryError;

/// The kind of statement being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    /// Upper-case SQL verb, for logs.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Read => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// A positional statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i64),
    Real(f64),
    Text(String),
    Null,
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Null => f.write_str("NULL"),
        }
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Param {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

macro_rules! id_param {
    ($($id:ty),*) => {
        $(
            impl From<$id> for Param {
                fn from(id: $id) -> Self {
                    Self::Int(id.as_i64())
                }
            }
        )*
    };
}

id_param!(UserId, AdminId, ItemId, OrderId);

impl From<Quantity> for Param {
    fn from(q: Quantity) -> Self {
        Self::Int(i64::from(q))
    }
}

impl From<Price> for Param {
    fn from(p: Price) -> Self {
        Self::Text(p.to_string())
    }
}

impl From<OrderStatus> for Param {
    fn from(s: OrderStatus) -> Self {
        Self::Text(s.as_str().to_owned())
    }
}

/// Build a parameter list from heterogeneous values.
///
/// ```rust,ignore
/// exec.update("UPDATE cart SET quantity = ? WHERE user_id = ?", &params![qty, user_id])
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::db::Param>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::db::Param::from($value)),+]
    };
}

/// Runs single statements against one borrowed connection.
pub struct QueryExecutor<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> QueryExecutor<'c> {
    /// Wrap a connection (a pooled one, or a transaction's).
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Run a `SELECT` and decode every row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails or a row
    /// does not decode into `T`.
    pub async fn read<T>(&mut self, sql: &str, params: &[Param]) -> Result<Vec<T>, RepositoryError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let started = Instant::now();
        let result = bind_as(sqlx::query_as::<_, T>(sql), params)
            .fetch_all(&mut *self.conn)
            .await;

        let rows = check(StatementKind::Read, sql, params, result)?;
        trace(StatementKind::Read, sql, params, started, rows.len() as u64);
        Ok(rows)
    }

    /// Run a `SELECT` expected to match at most one row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn read_optional<T>(
        &mut self,
        sql: &str,
        params: &[Param],
    ) -> Result<Option<T>, RepositoryError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let started = Instant::now();
        let result = bind_as(sqlx::query_as::<_, T>(sql), params)
            .fetch_optional(&mut *self.conn)
            .await;

        let row = check(StatementKind::Read, sql, params, result)?;
        trace(
            StatementKind::Read,
            sql,
            params,
            started,
            u64::from(row.is_some()),
        );
        Ok(row)
    }

    /// Run a `SELECT` returning a single value (`COUNT(*)`, `MAX(id)`, ...).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails or returns
    /// no row.
    pub async fn read_scalar<T>(&mut self, sql: &str, params: &[Param]) -> Result<T, RepositoryError>
    where
        T: for<'r> sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite> + Send + Unpin,
    {
        let started = Instant::now();
        let result = bind_scalar(sqlx::query_scalar::<_, T>(sql), params)
            .fetch_one(&mut *self.conn)
            .await;

        let value = check(StatementKind::Read, sql, params, result)?;
        trace(StatementKind::Read, sql, params, started, 1);
        Ok(value)
    }

    /// Run an `INSERT` and return the id of the new row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a unique-constraint violation
    /// and `RepositoryError::Database` for any other failure.
    pub async fn insert(&mut self, sql: &str, params: &[Param]) -> Result<i64, RepositoryError> {
        let result = self.write(StatementKind::Insert, sql, params).await?;
        Ok(result.last_insert_rowid())
    }

    /// Run the same `INSERT` once per parameter row and return how many rows
    /// were inserted.
    ///
    /// # Errors
    ///
    /// Stops at the first failing row and returns its error. Rows inserted
    /// before it stay unless the connection is a transaction that the caller
    /// drops.
    pub async fn insert_many(
        &mut self,
        sql: &str,
        rows: &[Vec<Param>],
    ) -> Result<u64, RepositoryError> {
        let mut inserted = 0;
        for params in rows {
            inserted += self
                .write(StatementKind::Insert, sql, params)
                .await?
                .rows_affected();
        }
        Ok(inserted)
    }

    /// Run an `UPDATE` and return the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn update(&mut self, sql: &str, params: &[Param]) -> Result<u64, RepositoryError> {
        let result = self.write(StatementKind::Update, sql, params).await?;
        Ok(result.rows_affected())
    }

    /// Run a `DELETE` and return the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn delete(&mut self, sql: &str, params: &[Param]) -> Result<u64, RepositoryError> {
        let result = self.write(StatementKind::Delete, sql, params).await?;
        Ok(result.rows_affected())
    }

    async fn write(
        &mut self,
        kind: StatementKind,
        sql: &str,
        params: &[Param],
    ) -> Result<SqliteQueryResult, RepositoryError> {
        let started = Instant::now();
        let result = bind(sqlx::query(sql), params)
            .execute(&mut *self.conn)
            .await;

        let done = check(kind, sql, params, result)?;
        trace(kind, sql, params, started, done.rows_affected());
        Ok(done)
    }
}

fn bind<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [Param],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Param::Int(v) => query.bind(*v),
            Param::Real(v) => query.bind(*v),
            Param::Text(v) => query.bind(v.as_str()),
            Param::Null => query.bind(Option::<i64>::None),
        };
    }
    query
}

fn bind_as<'q, T>(
    mut query: QueryAs<'q, Sqlite, T, SqliteArguments<'q>>,
    params: &'q [Param],
) -> QueryAs<'q, Sqlite, T, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Param::Int(v) => query.bind(*v),
            Param::Real(v) => query.bind(*v),
            Param::Text(v) => query.bind(v.as_str()),
            Param::Null => query.bind(Option::<i64>::None),
        };
    }
    query
}

fn bind_scalar<'q, T>(
    mut query: QueryScalar<'q, Sqlite, T, SqliteArguments<'q>>,
    params: &'q [Param],
) -> QueryScalar<'q, Sqlite, T, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Param::Int(v) => query.bind(*v),
            Param::Real(v) => query.bind(*v),
            Param::Text(v) => query.bind(v.as_str()),
            Param::Null => query.bind(Option::<i64>::None),
        };
    }
    query
}

/// Log a failed statement with its parameters and convert the error.
fn check<T>(
    kind: StatementKind,
    sql: &str,
    params: &[Param],
    result: Result<T, sqlx::Error>,
) -> Result<T, RepositoryError> {
    result.map_err(|e| {
        tracing::error!(
            kind = %kind,
            error = %e,
            query = %compact(sql),
            args = %ParamList(params),
            "DB error"
        );

        match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict(db_err.message().to_owned())
            }
            other => RepositoryError::Database(other),
        }
    })
}

fn trace(kind: StatementKind, sql: &str, params: &[Param], started: Instant, rows: u64) {
    tracing::debug!(
        kind = %kind,
        elapsed_ms = format_args!("{:.2}", started.elapsed().as_secs_f64() * 1000.0),
        rows,
        query = %compact(sql),
        args = %ParamList(params),
        "Executed statement"
    );
}

/// Collapse the whitespace of a multi-line statement for single-line logs.
fn compact(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct ParamList<'a>(&'a [Param]);

impl fmt::Display for ParamList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::params;

    #[derive(Debug, sqlx::FromRow)]
    struct Row {
        id: i64,
        title: String,
    }

    async fn conn() -> (sqlx::SqlitePool, sqlx::pool::PoolConnection<Sqlite>) {
        let pool = create_memory_pool().await.unwrap();
        let conn = pool.acquire().await.unwrap();
        (pool, conn)
    }

    #[tokio::test]
    async fn test_insert_returns_new_row_id() {
        let (_pool, mut conn) = conn().await;
        let mut exec = QueryExecutor::new(&mut conn);

        let first = exec
            .insert(
                "INSERT INTO items (title, price, description, filename) VALUES (?, ?, ?, ?)",
                &params!["Mug", "4.50", "A mug", "1.png"],
            )
            .await
            .unwrap();
        let second = exec
            .insert(
                "INSERT INTO items (title, price, description, filename) VALUES (?, ?, ?, ?)",
                &params!["Cap", "9", "A cap", "2.png"],
            )
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn test_read_decodes_rows_in_order() {
        let (_pool, mut conn) = conn().await;
        let mut exec = QueryExecutor::new(&mut conn);

        let inserted = exec
            .insert_many(
                "INSERT INTO items (title, price, description, filename) VALUES (?, ?, ?, ?)",
                &[
                    params!["Mug", "4.50", "A mug", "1.png"],
                    params!["Cap", "9", "A cap", "2.png"],
                    params!["Tee", "15", "A tee", "3.png"],
                ],
            )
            .await
            .unwrap();
        assert_eq!(inserted, 3);

        let rows: Vec<Row> = exec
            .read("SELECT id, title FROM items ORDER BY id", &[])
            .await
            .unwrap();
        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Mug", "Cap", "Tee"]);
        assert_eq!(rows.last().unwrap().id, 3);

        let missing: Option<Row> = exec
            .read_optional("SELECT id, title FROM items WHERE id = ?", &params![99_i64])
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_report_affected_rows() {
        let (_pool, mut conn) = conn().await;
        let mut exec = QueryExecutor::new(&mut conn);

        for title in ["a", "b", "c"] {
            exec.insert(
                "INSERT INTO items (title, price, description, filename) VALUES (?, '1', '', '')",
                &params![title],
            )
            .await
            .unwrap();
        }

        let changed = exec
            .update("UPDATE items SET price = ? WHERE id > ?", &params!["2", 1_i64])
            .await
            .unwrap();
        assert_eq!(changed, 2);

        let none = exec
            .update("UPDATE items SET price = '3' WHERE id = ?", &params![42_i64])
            .await
            .unwrap();
        assert_eq!(none, 0);

        let removed = exec
            .delete("DELETE FROM items WHERE title != ?", &params!["a"])
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let left: i64 = exec
            .read_scalar("SELECT COUNT(*) FROM items", &[])
            .await
            .unwrap();
        assert_eq!(left, 1);
    }

    #[tokio::test]
    async fn test_unique_violation_maps_to_conflict() {
        let (_pool, mut conn) = conn().await;
        let mut exec = QueryExecutor::new(&mut conn);

        exec.insert(
            "INSERT INTO users (username, hash) VALUES (?, ?)",
            &params!["dana", "x"],
        )
        .await
        .unwrap();

        let err = exec
            .insert(
                "INSERT INTO users (username, hash) VALUES (?, ?)",
                &params!["dana", "y"],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_bad_statement_is_returned_not_retried() {
        let (_pool, mut conn) = conn().await;
        let mut exec = QueryExecutor::new(&mut conn);

        let err = exec
            .update("UPDATE no_such_table SET x = 1", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Database(_)));
    }

    #[test]
    fn test_param_conversions() {
        assert_eq!(Param::from(ItemId::new(4)), Param::Int(4));
        assert_eq!(Param::from(OrderStatus::Sent), Param::Text("sent".to_owned()));
        assert_eq!(Param::from(None::<i64>), Param::Null);
        assert_eq!(
            Param::from(Price::parse("3.10").unwrap()),
            Param::Text("3.10".to_owned())
        );
    }

    #[test]
    fn test_log_formatting() {
        assert_eq!(
            compact("SELECT *\n    FROM items\n    WHERE id = ?"),
            "SELECT * FROM items WHERE id = ?"
        );
        let list = ParamList(&[Param::Int(1), Param::Text("a".into()), Param::Null]).to_string();
        assert_eq!(list, "(1, \"a\", NULL)");
    }
}
