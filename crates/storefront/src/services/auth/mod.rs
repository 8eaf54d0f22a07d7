//! Authentication service.
//!
//! Password registration, login and password change for both account
//! kinds. Validation runs in a fixed order and stops at the first failure,
//! so the visitor always sees the earliest problem with the form.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::sqlite::SqliteConnection;

use shopfront_core::Username;

use crate::db::{AccountKind, AccountRepository, RepositoryError};
use crate::models::Account;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Handles registration, login, and password changes against either the
/// `users` or the `admins` table.
pub struct AuthService<'c> {
    accounts: AccountRepository<'c>,
}

impl<'c> AuthService<'c> {
    /// Create a new authentication service.
    pub fn new(conn: &'c mut SqliteConnection, kind: AccountKind) -> Self {
        Self {
            accounts: AccountRepository::new(conn, kind),
        }
    }

    /// Register a new account.
    ///
    /// Checks, in order: username present, password present, confirmation
    /// matches, password long enough, username free.
    ///
    /// # Errors
    ///
    /// Returns the user-facing `AuthError` for the first failed check.
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn register(
        &mut self,
        username: &str,
        password: &str,
        confirm: &str,
    ) -> Result<Account, AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::UsernameRequired);
        }
        if password.is_empty() {
            return Err(AuthError::PasswordRequired);
        }
        if confirm.is_empty() || password != confirm {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(password)?;

        let username = Username::parse(username)?;
        if self.accounts.username_exists(&username).await? {
            return Err(AuthError::UsernameTaken);
        }

        let hash = hash_password(password)?;
        let id = self
            .accounts
            .create(&username, &hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Repository(other),
            })?;

        Ok(Account { id, username, hash })
    }

    /// Login with username and password.
    ///
    /// Succeeds only when exactly one account has the username and its
    /// stored hash verifies.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UsernameRequired` / `AuthError::PasswordRequired`
    /// for empty fields and `AuthError::InvalidCredentials` otherwise.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Account, AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::UsernameRequired);
        }
        if password.is_empty() {
            return Err(AuthError::PasswordRequired);
        }

        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;
        let account = self
            .accounts
            .find_by_username(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &account.hash)?;

        Ok(account)
    }

    /// Change the password of account `id`.
    ///
    /// Checks, in order: all fields present, current password verifies,
    /// new matches confirmation, new differs from current, new long enough.
    ///
    /// # Errors
    ///
    /// Returns the user-facing `AuthError` for the first failed check.
    /// Returns `AuthError::AccountNotFound` if the account has vanished.
    pub async fn change_password(
        &mut self,
        id: i64,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        if current.is_empty() || new.is_empty() || confirm.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let account = self
            .accounts
            .get_by_id(id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;
        verify_password(current, &account.hash).map_err(|_| AuthError::IncorrectCurrentPassword)?;

        if new != confirm {
            return Err(AuthError::PasswordMismatch);
        }
        if new == current {
            return Err(AuthError::PasswordUnchanged);
        }
        validate_password(new)?;

        let hash = hash_password(new)?;
        self.accounts.update_hash(id, &hash).await?;

        Ok(())
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[tokio::test]
    async fn test_register_checks_run_in_order() {
        let pool = create_memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut auth = AuthService::new(&mut conn, AccountKind::User);

        assert!(matches!(
            auth.register("", "", "").await,
            Err(AuthError::UsernameRequired)
        ));
        assert!(matches!(
            auth.register("hana", "", "").await,
            Err(AuthError::PasswordRequired)
        ));
        assert!(matches!(
            auth.register("hana", "short", "shorts").await,
            Err(AuthError::PasswordMismatch)
        ));
        assert!(matches!(
            auth.register("hana", "short", "short").await,
            Err(AuthError::WeakPassword { min: 8 })
        ));

        auth.register("hana", "longenough", "longenough")
            .await
            .unwrap();
        assert!(matches!(
            auth.register("hana", "longenough", "longenough").await,
            Err(AuthError::UsernameTaken)
        ));
    }

    #[tokio::test]
    async fn test_login() {
        let pool = create_memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut auth = AuthService::new(&mut conn, AccountKind::User);

        let registered = auth.register("ivan", "password1", "password1").await.unwrap();

        let account = auth.login("ivan", "password1").await.unwrap();
        assert_eq!(account.id, registered.id);

        assert!(matches!(
            auth.login("ivan", "password2").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "password1").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("ivan", "").await,
            Err(AuthError::PasswordRequired)
        ));
    }

    #[tokio::test]
    async fn test_admin_accounts_do_not_log_in_as_users() {
        let pool = create_memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        AuthService::new(&mut conn, AccountKind::Admin)
            .register("boss", "password1", "password1")
            .await
            .unwrap();

        let result = AuthService::new(&mut conn, AccountKind::User)
            .login("boss", "password1")
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_change_password() {
        let pool = create_memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut auth = AuthService::new(&mut conn, AccountKind::User);
        let id = auth.register("jo", "password1", "password1").await.unwrap().id;

        assert!(matches!(
            auth.change_password(id, "", "x", "x").await,
            Err(AuthError::MissingFields)
        ));
        assert!(matches!(
            auth.change_password(id, "wrong-pass", "password2", "password2").await,
            Err(AuthError::IncorrectCurrentPassword)
        ));
        assert!(matches!(
            auth.change_password(id, "password1", "password2", "password3").await,
            Err(AuthError::PasswordMismatch)
        ));
        assert!(matches!(
            auth.change_password(id, "password1", "password1", "password1").await,
            Err(AuthError::PasswordUnchanged)
        ));
        assert!(matches!(
            auth.change_password(id, "password1", "short", "short").await,
            Err(AuthError::WeakPassword { .. })
        ));

        auth.change_password(id, "password1", "password2", "password2")
            .await
            .unwrap();
        assert!(auth.login("jo", "password1").await.is_err());
        assert!(auth.login("jo", "password2").await.is_ok());
    }

    #[test]
    fn test_user_facing_split() {
        assert!(AuthError::UsernameTaken.is_user_facing());
        assert!(!AuthError::PasswordHash.is_user_facing());
        assert_eq!(
            AuthError::WeakPassword { min: 8 }.to_string(),
            "Password needs to be at least 8 characters long."
        );
    }
}
