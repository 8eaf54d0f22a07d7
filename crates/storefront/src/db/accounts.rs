//! Account repository for shoppers and admins.
//!
//! Both principal types live in tables of the same shape (`users` and
//! `admins`). One repository serves both; the [`AccountKind`] picks the
//! table.

use sqlx::sqlite::SqliteConnection;

use shopfront_core::Username;

use super::executor::QueryExecutor;
use super::RepositoryError;
use crate::models::Account;
use crate::params;

/// Which account table to operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    User,
    Admin,
}

impl AccountKind {
    const fn table(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Admin => "admins",
        }
    }
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: i64,
    username: String,
    hash: String,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            username,
            hash: row.hash,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for account database operations.
pub struct AccountRepository<'c> {
    exec: QueryExecutor<'c>,
    kind: AccountKind,
}

impl<'c> AccountRepository<'c> {
    /// Create a repository over the `users` or `admins` table.
    pub fn new(conn: &'c mut SqliteConnection, kind: AccountKind) -> Self {
        Self {
            exec: QueryExecutor::new(conn),
            kind,
        }
    }

    /// Look an account up by username.
    ///
    /// Returns `None` unless exactly one row matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored username is invalid.
    pub async fn find_by_username(
        &mut self,
        username: &Username,
    ) -> Result<Option<Account>, RepositoryError> {
        let sql = format!(
            "SELECT id, username, hash FROM {} WHERE username = ?",
            self.kind.table()
        );
        let mut rows: Vec<AccountRow> = self.exec.read(&sql, &params![username.as_str()]).await?;

        if rows.len() != 1 {
            if rows.len() > 1 {
                tracing::warn!(table = self.kind.table(), "Duplicate username rows");
            }
            return Ok(None);
        }
        rows.pop().map(TryInto::try_into).transpose()
    }

    /// Get an account by its row ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored username is invalid.
    pub async fn get_by_id(&mut self, id: i64) -> Result<Option<Account>, RepositoryError> {
        let sql = format!(
            "SELECT id, username, hash FROM {} WHERE id = ?",
            self.kind.table()
        );
        let row: Option<AccountRow> = self.exec.read_optional(&sql, &params![id]).await?;
        row.map(TryInto::try_into).transpose()
    }

    /// Whether the username is already taken.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn username_exists(&mut self, username: &Username) -> Result<bool, RepositoryError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE username = ?",
            self.kind.table()
        );
        let count: i64 = self
            .exec
            .read_scalar(&sql, &params![username.as_str()])
            .await?;
        Ok(count > 0)
    }

    /// Insert a new account and return its row ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&mut self, username: &Username, hash: &str) -> Result<i64, RepositoryError> {
        let sql = format!(
            "INSERT INTO {} (username, hash) VALUES (?, ?)",
            self.kind.table()
        );
        self.exec
            .insert(&sql, &params![username.as_str(), hash])
            .await
    }

    /// Replace an account's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no account has this ID.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_hash(&mut self, id: i64, hash: &str) -> Result<(), RepositoryError> {
        let sql = format!("UPDATE {} SET hash = ? WHERE id = ?", self.kind.table());
        match self.exec.update(&sql, &params![hash, id]).await? {
            0 => Err(RepositoryError::NotFound),
            _ => Ok(()),
        }
    }

    /// Number of accounts in the table.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&mut self) -> Result<i64, RepositoryError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.kind.table());
        self.exec.read_scalar(&sql, &[]).await
    }
}
