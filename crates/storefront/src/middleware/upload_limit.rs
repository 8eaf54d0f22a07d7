//! Turn oversized uploads into a friendly redirect.
//!
//! Whether the body limit trips inside axum's extractor or in the handler,
//! the admin sees the new-item form again with an error instead of a bare
//! `413 Payload Too Large`.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::flash::{FlashLevel, push_flash};
use crate::error::AppError;
use crate::state::AppState;

/// Where the admin is sent after an oversized upload.
pub const NEW_ITEM_PATH: &str = "/admin/new-item";

/// Flash text for an upload over `limit` bytes.
#[must_use]
pub fn too_large_message(limit: usize) -> String {
    let mib = limit / (1024 * 1024);
    if mib > 0 && limit % (1024 * 1024) == 0 {
        format!("File too large. Max size is {mib} MB.")
    } else {
        format!("File too large. Max size is {limit} bytes.")
    }
}

/// Middleware: replace any `413` response with a redirect to the new-item
/// form carrying an error flash.
pub async fn redirect_oversized_uploads(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return response;
    }

    tracing::info!("Rejected oversized upload");
    let message = too_large_message(state.config().max_upload_bytes);
    match push_flash(&session, FlashLevel::Error, message).await {
        Ok(()) => Redirect::to(NEW_ITEM_PATH).into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message() {
        assert_eq!(
            too_large_message(4 * 1024 * 1024),
            "File too large. Max size is 4 MB."
        );
        assert_eq!(
            too_large_message(1000),
            "File too large. Max size is 1000 bytes."
        );
    }
}
