//! Login accounts (shoppers and admins share this shape).

use shopfront_core::{AdminId, UserId, Username};

use super::{CurrentAdmin, CurrentUser};

/// A stored account with its password hash.
#[derive(Debug, Clone)]
pub struct Account {
    /// Row ID in `users` or `admins`.
    pub id: i64,
    /// Login name.
    pub username: Username,
    /// Argon2 PHC string.
    pub hash: String,
}

impl Account {
    /// Session identity for a shopper account.
    #[must_use]
    pub fn as_user(&self) -> CurrentUser {
        CurrentUser {
            id: UserId::new(self.id),
            username: self.username.clone(),
        }
    }

    /// Session identity for an admin account.
    #[must_use]
    pub fn as_admin(&self) -> CurrentAdmin {
        CurrentAdmin {
            id: AdminId::new(self.id),
            username: self.username.clone(),
        }
    }
}
