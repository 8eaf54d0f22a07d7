//! One-shot flash messages.
//!
//! A handler pushes a message into the session and redirects; the next page
//! rendered takes the pending messages out (via [`Flashes`]) and shows them
//! once. When that page fails with a server error instead,
//! [`keep_flashes_on_error`] puts the messages back for the next attempt.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session::keys;

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Info,
    Error,
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

impl FlashMessage {
    /// CSS modifier for templates.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.level {
            FlashLevel::Info => "flash-info",
            FlashLevel::Error => "flash-error",
        }
    }
}

/// Append a message to the pending flashes.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push_flash(
    session: &Session,
    level: FlashLevel,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut pending: Vec<FlashMessage> = session.get(keys::FLASH).await?.unwrap_or_default();
    pending.push(FlashMessage {
        level,
        message: message.into(),
    });
    session.insert(keys::FLASH, pending).await
}

/// Push a flash message and redirect to `to`.
///
/// # Errors
///
/// Returns `AppError::Session` if the session cannot be written.
pub async fn flash_redirect(
    session: &Session,
    level: FlashLevel,
    message: impl Into<String>,
    to: &str,
) -> Result<Response, AppError> {
    push_flash(session, level, message).await?;
    Ok(Redirect::to(to).into_response())
}

/// Messages taken out of the session by [`Flashes`] during this request.
#[derive(Debug, Clone, Default)]
struct TakenFlashes(Arc<Mutex<Vec<FlashMessage>>>);

impl TakenFlashes {
    fn record(&self, messages: &[FlashMessage]) {
        if let Ok(mut taken) = self.0.lock() {
            taken.extend_from_slice(messages);
        }
    }

    fn drain(&self) -> Vec<FlashMessage> {
        self.0
            .lock()
            .map(|mut taken| std::mem::take(&mut *taken))
            .unwrap_or_default()
    }
}

/// Put flashes taken by a page back into the session when that page
/// answers with a server error, so they are not lost with it.
///
/// Must run inside the session layer.
pub async fn keep_flashes_on_error(session: Session, mut request: Request, next: Next) -> Response {
    let taken = TakenFlashes::default();
    request.extensions_mut().insert(taken.clone());

    let response = next.run(request).await;

    if response.status().is_server_error() {
        let restored = taken.drain();
        if !restored.is_empty()
            && let Err(e) = restore(&session, restored).await
        {
            tracing::warn!(error = %e, "Failed to restore flash messages");
        }
    }

    response
}

async fn restore(
    session: &Session,
    mut restored: Vec<FlashMessage>,
) -> Result<(), tower_sessions::session::Error> {
    let pending: Vec<FlashMessage> = session.get(keys::FLASH).await?.unwrap_or_default();
    restored.extend(pending);
    session.insert(keys::FLASH, restored).await
}

/// Extractor that takes (and clears) the pending flash messages.
#[derive(Debug, Default)]
pub struct Flashes(pub Vec<FlashMessage>);

impl<S> FromRequestParts<S> for Flashes
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self::default());
        };

        let pending = session
            .remove::<Vec<FlashMessage>>(keys::FLASH)
            .await?
            .unwrap_or_default();

        if let Some(taken) = parts.extensions.get::<TakenFlashes>() {
            taken.record(&pending);
        }
        Ok(Self(pending))
    }
}
