//! Admin authentication: login, logout and registering further admins.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use super::ORDERS_PATH;
use crate::db::{AccountKind, DbConn};
use crate::error::{Result, clear_sentry_user};
use crate::filters;
use crate::middleware::{
    ADMIN_LOGIN_PATH, FlashLevel, FlashMessage, Flashes, RequireAdmin, clear_current_admin,
    flash_redirect, set_current_admin,
};
use crate::routes::auth::{LoginForm, RegisterForm, auth_failure};
use crate::services::auth::AuthService;

const REGISTER_PATH: &str = "/admin/register";

/// Admin login page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/auth/login.html")]
pub struct LoginTemplate {
    pub flashes: Vec<FlashMessage>,
}

/// Admin registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/auth/register.html")]
pub struct RegisterTemplate {
    pub flashes: Vec<FlashMessage>,
    pub admin: String,
}

/// Display the admin login page. Visiting it forgets the current admin.
pub async fn login_page(session: Session, Flashes(flashes): Flashes) -> Result<LoginTemplate> {
    clear_current_admin(&session).await?;
    Ok(LoginTemplate { flashes })
}

/// Handle admin login form submission.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    session: Session,
    mut conn: DbConn,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    clear_current_admin(&session).await?;

    let account = match AuthService::new(&mut conn, AccountKind::Admin)
        .login(&form.username, &form.password)
        .await
    {
        Ok(account) => account,
        Err(e) => return auth_failure(&session, e, ADMIN_LOGIN_PATH).await,
    };

    set_current_admin(&session, &account.as_admin()).await?;
    tracing::info!(admin_id = account.id, "Admin logged in");

    Ok(Redirect::to(ORDERS_PATH).into_response())
}

/// Log out: forget everything in the session.
pub async fn logout(session: Session) -> Result<Response> {
    session.flush().await?;
    clear_sentry_user();
    Ok(Redirect::to(ADMIN_LOGIN_PATH).into_response())
}

/// Display the admin registration page.
pub async fn register_page(
    RequireAdmin(admin): RequireAdmin,
    Flashes(flashes): Flashes,
) -> RegisterTemplate {
    RegisterTemplate {
        flashes,
        admin: admin.username.into_inner(),
    }
}

/// Create another admin account. The current admin stays logged in.
#[instrument(skip_all, fields(admin_id = %admin.id, username = %form.username))]
pub async fn register(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    mut conn: DbConn,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let result = AuthService::new(&mut conn, AccountKind::Admin)
        .register(&form.username, &form.password, &form.confirm)
        .await;

    match result {
        Ok(account) => {
            tracing::info!(new_admin_id = account.id, "Admin registered");
            flash_redirect(
                &session,
                FlashLevel::Info,
                format!("Registered admin {}.", account.username),
                ORDERS_PATH,
            )
            .await
        }
        Err(e) => auth_failure(&session, e, REGISTER_PATH).await,
    }
}
