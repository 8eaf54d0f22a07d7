//! Request-level tests for Shopfront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! No server or database needs to be running. [`TestApp`] assembles the
//! real router over a private in-memory SQLite database, a `MemoryStore`
//! for sessions and a throwaway upload directory, and drives it with
//! `tower::ServiceExt::oneshot`. The session cookie is carried between
//! requests the way a browser would.
//!
//! # Test Categories
//!
//! - `auth` - Registration, login, logout, password change
//! - `guards` - Who may see which page
//! - `shop` - Catalog, cart, checkout, order history, search
//! - `admin` - Order board, item management, image uploads

use std::path::PathBuf;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
};
use sqlx::SqlitePool;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use uuid::Uuid;

use shopfront_core::{ItemId, Price};
use shopfront_storefront::app::build_router;
use shopfront_storefront::config::StoreConfig;
use shopfront_storefront::db::{self, AccountKind, ItemRepository};
use shopfront_storefront::models::ItemDraft;
use shopfront_storefront::services::auth::AuthService;
use shopfront_storefront::state::AppState;

/// Password used for every account created by the helpers.
pub const PASSWORD: &str = "correct-horse";

const BOUNDARY: &str = "shopfront-test-boundary";

/// A fully buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The `Location` header, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Assert a `303 See Other` to `to`.
    ///
    /// # Panics
    ///
    /// Panics if the response is anything else.
    pub fn assert_redirect(&self, to: &str) {
        assert_eq!(
            self.status,
            StatusCode::SEE_OTHER,
            "expected redirect to {to}, body: {}",
            self.body
        );
        assert_eq!(self.location(), Some(to));
    }

    /// Parse the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not valid JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("response body is not JSON")
    }
}

/// The application under test plus a one-user cookie jar.
pub struct TestApp {
    router: Router,
    pub pool: SqlitePool,
    pub upload_dir: PathBuf,
    cookie: Option<String>,
}

impl TestApp {
    /// Build the app with test defaults.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Build the app after adjusting the test configuration.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory database cannot be created.
    pub async fn with_config(adjust: impl FnOnce(&mut StoreConfig)) -> Self {
        let upload_dir = std::env::temp_dir().join(format!("shopfront-test-{}", Uuid::new_v4()));
        let mut config = StoreConfig::for_tests(upload_dir.clone());
        adjust(&mut config);

        let pool = db::create_memory_pool()
            .await
            .expect("Failed to create test database");
        let state = AppState::new(config, pool.clone());
        let router = build_router(state, MemoryStore::default());

        Self {
            router,
            pool,
            upload_dir,
            cookie: None,
        }
    }

    /// Send a request, carrying and updating the session cookie.
    ///
    /// # Panics
    ///
    /// Panics if the body cannot be read.
    pub async fn request(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            let value = HeaderValue::from_str(cookie).expect("cookie is a valid header value");
            request.headers_mut().insert(header::COOKIE, value);
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let Ok(raw) = set_cookie.to_str() else {
                continue;
            };
            let pair = raw.split(';').next().unwrap_or_default().trim();
            if raw.contains("Max-Age=0") {
                self.cookie = None;
            } else {
                self.cookie = Some(pair.to_owned());
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// `GET path`.
    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = Request::get(path)
            .body(Body::empty())
            .expect("valid request");
        self.request(request).await
    }

    /// `POST path` with a urlencoded form body.
    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("valid request");
        self.request(request).await
    }

    /// `POST path` with a multipart body: text `fields` and an optional
    /// `file` part given as (client filename, contents).
    pub async fn post_multipart(
        &mut self,
        path: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &[u8])>,
    ) -> TestResponse {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, contents)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(contents);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::post(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("valid request");
        self.request(request).await
    }

    /// Follow a redirect with a `GET`.
    ///
    /// # Panics
    ///
    /// Panics if `response` has no `Location` header.
    pub async fn follow(&mut self, response: &TestResponse) -> TestResponse {
        let to = response
            .location()
            .expect("response is not a redirect")
            .to_owned();
        self.get(&to).await
    }

    /// Forget the session cookie.
    pub fn clear_cookies(&mut self) {
        self.cookie = None;
    }

    /// Register a shopper through the web form.
    pub async fn register_user(&mut self, username: &str) -> TestResponse {
        self.post_form(
            "/register",
            &[
                ("username", username),
                ("password", PASSWORD),
                ("confirm", PASSWORD),
            ],
        )
        .await
    }

    /// Register and log in a shopper.
    pub async fn sign_in_user(&mut self, username: &str) {
        self.register_user(username)
            .await
            .assert_redirect("/login");
        self.post_form("/login", &[("username", username), ("password", PASSWORD)])
            .await
            .assert_redirect("/");
    }

    /// Create an admin account directly in the database.
    ///
    /// # Panics
    ///
    /// Panics if the account cannot be created.
    pub async fn create_admin(&self, username: &str) -> i64 {
        let mut conn = self.pool.acquire().await.expect("connection");
        AuthService::new(&mut conn, AccountKind::Admin)
            .register(username, PASSWORD, PASSWORD)
            .await
            .expect("Failed to create admin")
            .id
    }

    /// Create and log in an admin.
    pub async fn sign_in_admin(&mut self, username: &str) {
        self.create_admin(username).await;
        self.post_form(
            "/admin/login",
            &[("username", username), ("password", PASSWORD)],
        )
        .await
        .assert_redirect("/admin/orders");
    }

    /// Insert an item directly in the database.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn add_item(&self, title: &str, price: &str) -> ItemId {
        let mut conn = self.pool.acquire().await.expect("connection");
        let mut items = ItemRepository::new(&mut conn);
        let id = items.next_id().await.expect("next id");
        let draft = ItemDraft {
            title: title.to_owned(),
            price: Price::parse(price).expect("valid price"),
            description: format!("All about {title}"),
        };
        items
            .create(id, &draft, &format!("{id}.png"))
            .await
            .expect("Failed to insert item");
        id
    }

    /// Row count of `table`.
    ///
    /// # Panics
    ///
    /// Panics if the query fails.
    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .expect("count query")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}
