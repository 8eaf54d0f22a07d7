//! Shopper authentication route handlers.
//!
//! Handles login, registration, logout and password change. Form mistakes
//! are answered with a flash message and a redirect back to the form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::{AccountKind, DbConn};
use crate::error::{Result, clear_sentry_user};
use crate::filters;
use crate::middleware::{
    FlashLevel, FlashMessage, Flashes, RequireUser, clear_current_user, flash_redirect,
    set_current_user,
};
use crate::services::auth::{AuthError, AuthService};

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm: String,
}

/// Password change form data.
#[derive(Deserialize)]
pub struct ChangePasswordForm {
    #[serde(default)]
    pub current: String,
    #[serde(default)]
    pub new: String,
    #[serde(default)]
    pub confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "user/auth/login.html")]
pub struct LoginTemplate {
    pub flashes: Vec<FlashMessage>,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "user/auth/register.html")]
pub struct RegisterTemplate {
    pub flashes: Vec<FlashMessage>,
}

/// Password change page template.
#[derive(Template, WebTemplate)]
#[template(path = "user/auth/change_password.html")]
pub struct ChangePasswordTemplate {
    pub flashes: Vec<FlashMessage>,
    pub username: String,
}

/// Answer an auth failure: form mistakes become a flash and a redirect to
/// `back`, server-side failures become an `AppError`.
pub(crate) async fn auth_failure(session: &Session, err: AuthError, back: &str) -> Result<Response> {
    if err.is_user_facing() {
        tracing::debug!(reason = %err, "Auth form rejected");
        flash_redirect(session, FlashLevel::Error, err.to_string(), back).await
    } else {
        Err(err.into())
    }
}

// =============================================================================
// Login / Logout
// =============================================================================

/// Display the login page. Visiting it forgets the current shopper.
pub async fn login_page(session: Session, Flashes(flashes): Flashes) -> Result<LoginTemplate> {
    clear_current_user(&session).await?;
    Ok(LoginTemplate { flashes })
}

/// Handle login form submission.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    session: Session,
    mut conn: DbConn,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    clear_current_user(&session).await?;

    let account = match AuthService::new(&mut conn, AccountKind::User)
        .login(&form.username, &form.password)
        .await
    {
        Ok(account) => account,
        Err(e) => return auth_failure(&session, e, "/login").await,
    };

    set_current_user(&session, &account.as_user()).await?;
    tracing::info!(user_id = account.id, "User logged in");

    Ok(Redirect::to("/").into_response())
}

/// Log out: forget everything in the session.
pub async fn logout(session: Session) -> Result<Response> {
    session.flush().await?;
    clear_sentry_user();
    Ok(Redirect::to("/login").into_response())
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
pub async fn register_page(Flashes(flashes): Flashes) -> RegisterTemplate {
    RegisterTemplate { flashes }
}

/// Handle registration form submission.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn register(
    session: Session,
    mut conn: DbConn,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let result = AuthService::new(&mut conn, AccountKind::User)
        .register(&form.username, &form.password, &form.confirm)
        .await;

    match result {
        Ok(account) => {
            tracing::info!(user_id = account.id, "User registered");
            flash_redirect(
                &session,
                FlashLevel::Info,
                "Successfully registered. Please log in.",
                "/login",
            )
            .await
        }
        Err(e) => auth_failure(&session, e, "/register").await,
    }
}

// =============================================================================
// Password Change
// =============================================================================

/// Display the password change page.
pub async fn change_password_page(
    RequireUser(user): RequireUser,
    Flashes(flashes): Flashes,
) -> ChangePasswordTemplate {
    ChangePasswordTemplate {
        flashes,
        username: user.username.into_inner(),
    }
}

/// Handle password change form submission.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn change_password(
    RequireUser(user): RequireUser,
    session: Session,
    mut conn: DbConn,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Response> {
    let result = AuthService::new(&mut conn, AccountKind::User)
        .change_password(user.id.as_i64(), &form.current, &form.new, &form.confirm)
        .await;

    match result {
        Ok(()) => {
            tracing::info!("Password changed");
            flash_redirect(
                &session,
                FlashLevel::Info,
                "Password changed successfully.",
                "/change-password",
            )
            .await
        }
        Err(e) => auth_failure(&session, e, "/change-password").await,
    }
}
