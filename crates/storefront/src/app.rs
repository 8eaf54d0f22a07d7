//! Router assembly.
//!
//! The binary and the request-level tests build the application the same
//! way; only the session store differs.

use axum::{
    Router,
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode, header},
    middleware::from_fn,
    routing::get,
};
use tower_http::{
    services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tower_sessions::SessionStore;

use crate::error::AppError;
use crate::middleware::{create_session_layer, keep_flashes_on_error};
use crate::routes;
use crate::state::AppState;

/// Build the full application router.
///
/// Layers, outermost first: Sentry, request tracing, no-cache headers,
/// sessions, flash restore. Static files are served from the configured directories, item
/// images from the upload directory under `/static/images`.
pub fn build_router<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(store, state.config());
    let images = ServeDir::new(&state.config().upload_dir);
    let assets = ServeDir::new(&state.config().static_dir);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes(&state))
        .nest_service("/static/images", images)
        .nest_service("/static", assets)
        .fallback(not_found)
        .layer(from_fn(keep_flashes_on_error))
        .layer(session_layer)
        .layer(no_cache(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"))
        .layer(no_cache(header::PRAGMA, "no-cache"))
        .layer(no_cache(header::EXPIRES, "0"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

fn no_cache(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("page".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::StoreConfig;
    use crate::db::create_memory_pool;

    async fn test_router() -> Router {
        let pool = create_memory_pool().await.unwrap();
        let config = StoreConfig::for_tests(std::env::temp_dir().join("shopfront-app-test"));
        build_router(AppState::new(config, pool), MemoryStore::default())
    }

    #[tokio::test]
    async fn test_responses_are_not_cached() {
        let response = test_router()
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers[header::CACHE_CONTROL],
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(headers[header::PRAGMA], "no-cache");
        assert_eq!(headers[header::EXPIRES], "0");
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = test_router()
            .await
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
