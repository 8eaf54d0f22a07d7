//! Authentication error types.
//!
//! The `Display` text of the user-facing variants is what the form shows
//! back to the visitor as a flash message.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No username was submitted.
    #[error("Username is required.")]
    UsernameRequired,

    /// No password was submitted.
    #[error("Password is required.")]
    PasswordRequired,

    /// Username submitted but not acceptable (e.g. too long).
    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] shopfront_core::UsernameError),

    /// Password and confirmation differ.
    #[error("Passwords do not match.")]
    PasswordMismatch,

    /// Password too short.
    #[error("Password needs to be at least {min} characters long.")]
    WeakPassword {
        /// Minimum accepted length.
        min: usize,
    },

    /// Username already registered.
    #[error("Username is taken.")]
    UsernameTaken,

    /// Unknown username or wrong password.
    #[error("Invalid username and/or password.")]
    InvalidCredentials,

    /// A password-change field was left empty.
    #[error("Field(s) can't be empty.")]
    MissingFields,

    /// The current password given on the change form is wrong.
    #[error("Current password is incorrect.")]
    IncorrectCurrentPassword,

    /// The new password equals the current one.
    #[error("Your new password can't be the same as the current password.")]
    PasswordUnchanged,

    /// The session refers to an account that no longer exists.
    #[error("account not found")]
    AccountNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether the error describes a problem with the submitted form, as
    /// opposed to a server-side failure.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Self::Repository(_) | Self::PasswordHash | Self::AccountNotFound
        )
    }
}
