//! Authentication extractors.
//!
//! [`RequireUser`] and [`RequireAdmin`] gate handlers on the identity held
//! in the session. The two are independent: an admin session does not
//! satisfy `RequireUser` and vice versa.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde::de::DeserializeOwned;
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::session::keys;
use crate::models::{CurrentAdmin, CurrentUser};

/// Login page for shoppers.
pub const USER_LOGIN_PATH: &str = "/login";

/// Login page for admins.
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

/// Extractor that requires a logged-in shopper.
///
/// If nobody is logged in, page requests are redirected to `/login` and
/// `/api/` requests get `401 Unauthorized`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(user): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

/// Extractor that requires a logged-in admin.
///
/// Redirects to `/admin/login` when no admin is logged in.
pub struct RequireAdmin(pub CurrentAdmin);

/// Error returned when authentication is required but nobody is logged in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to a login page (for HTML requests).
    RedirectToLogin(&'static str),
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(path) => Redirect::to(path).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Read a principal from the session, or build the rejection for `login`.
async fn principal_from_parts<T: DeserializeOwned>(
    parts: &Parts,
    key: &str,
    login: &'static str,
) -> Result<T, AuthRejection> {
    let reject = || {
        if parts.uri.path().starts_with("/api/") {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToLogin(login)
        }
    };

    // Set by SessionManagerLayer
    let session = parts.extensions.get::<Session>().ok_or_else(reject)?;

    match session.get::<T>(key).await {
        Ok(Some(principal)) => Ok(principal),
        Ok(None) => Err(reject()),
        Err(e) => {
            tracing::warn!(error = %e, key, "Unreadable session principal");
            Err(reject())
        }
    }
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from_parts(parts, keys::CURRENT_USER, USER_LOGIN_PATH)
            .await
            .map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from_parts(parts, keys::CURRENT_ADMIN, ADMIN_LOGIN_PATH)
            .await
            .map(Self)
    }
}

/// Helper to log a shopper in.
///
/// Cycles the session ID first so a pre-login session ID cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await?;
    set_sentry_user(&user.id, user.username.as_str());
    Ok(())
}

/// Helper to forget the shopper identity (visiting the login page).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(keys::CURRENT_USER).await?;
    clear_sentry_user();
    Ok(())
}

/// Helper to log an admin in.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_ADMIN, admin).await?;
    set_sentry_user(&format!("admin:{}", admin.id), admin.username.as_str());
    Ok(())
}

/// Helper to forget the admin identity.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentAdmin>(keys::CURRENT_ADMIN).await?;
    clear_sentry_user();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::Request;
    use shopfront_core::{UserId, Username};
    use tower_sessions::MemoryStore;

    fn parts_with_session(path: &str, session: Option<Session>) -> Parts {
        let (mut parts, ()) = Request::builder().uri(path).body(()).unwrap().into_parts();
        if let Some(session) = session {
            parts.extensions.insert(session);
        }
        parts
    }

    fn fresh_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_missing_user_redirects_pages_and_rejects_api() {
        let mut page = parts_with_session("/cart", Some(fresh_session()));
        let rejection = RequireUser::from_request_parts(&mut page, &()).await.err().unwrap();
        assert!(matches!(rejection, AuthRejection::RedirectToLogin("/login")));

        let mut api = parts_with_session("/api/search?q=x", Some(fresh_session()));
        let rejection = RequireUser::from_request_parts(&mut api, &()).await.err().unwrap();
        assert!(matches!(rejection, AuthRejection::Unauthorized));
    }

    #[tokio::test]
    async fn test_user_session_does_not_satisfy_admin_guard() {
        let session = fresh_session();
        let user = CurrentUser {
            id: UserId::new(1),
            username: Username::parse("kim").unwrap(),
        };
        session.insert(keys::CURRENT_USER, &user).await.unwrap();

        let mut parts = parts_with_session("/orders", Some(session.clone()));
        let RequireUser(found) = RequireUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found, user);

        let mut admin_parts = parts_with_session("/admin/orders", Some(session));
        let rejection = RequireAdmin::from_request_parts(&mut admin_parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(
            rejection,
            AuthRejection::RedirectToLogin("/admin/login")
        ));
    }

    #[tokio::test]
    async fn test_no_session_layer_rejects() {
        let mut parts = parts_with_session("/", None);
        assert!(RequireUser::from_request_parts(&mut parts, &()).await.is_err());
    }

    #[tokio::test]
    async fn test_clear_current_user_keeps_admin() {
        let session = fresh_session();
        let admin = CurrentAdmin {
            id: shopfront_core::AdminId::new(3),
            username: Username::parse("root").unwrap(),
        };
        session.insert(keys::CURRENT_ADMIN, &admin).await.unwrap();
        session
            .insert(
                keys::CURRENT_USER,
                CurrentUser {
                    id: UserId::new(1),
                    username: Username::parse("kim").unwrap(),
                },
            )
            .await
            .unwrap();

        clear_current_user(&session).await.unwrap();

        assert!(session.get::<CurrentUser>(keys::CURRENT_USER).await.unwrap().is_none());
        assert_eq!(
            session.get::<CurrentAdmin>(keys::CURRENT_ADMIN).await.unwrap(),
            Some(admin)
        );
    }
}
