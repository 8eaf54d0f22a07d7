//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; the defaults run a local development shop.
//!
//! - `SHOP_DATABASE_URL` - SQLite connection string (falls back to `DATABASE_URL`,
//!   default: `sqlite://store.db?mode=rwc`)
//! - `SHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOP_PORT` - Listen port (default: 5000)
//! - `SHOP_BASE_URL` - Public URL; `https://` turns on secure cookies
//!   (default: `http://localhost:5000`)
//! - `SHOP_STATIC_DIR` - Stylesheets and scripts (default: `crates/storefront/static`)
//! - `SHOP_UPLOAD_DIR` - Item images (default: `crates/storefront/static/images`)
//! - `SHOP_MAX_UPLOAD_BYTES` - Largest accepted image (default: 4 MiB)
//! - `SHOP_LOG_JSON` - Emit JSON logs when set to `1` or `true`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

/// Default cap on uploaded image size (4 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 4 * 1024 * 1024;

const DEFAULT_DATABASE_URL: &str = "sqlite://store.db?mode=rwc";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Directory where item images are written and served from `/static/images`
    pub upload_dir: PathBuf,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SHOP_DATABASE_URL");
        let host = get_env_or_default("SHOP_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOP_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SHOP_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOP_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("SHOP_BASE_URL", "http://localhost:5000");
        let static_dir = PathBuf::from(get_env_or_default(
            "SHOP_STATIC_DIR",
            "crates/storefront/static",
        ));
        let upload_dir = PathBuf::from(get_env_or_default(
            "SHOP_UPLOAD_DIR",
            "crates/storefront/static/images",
        ));
        let max_upload_bytes = match get_optional_env("SHOP_MAX_UPLOAD_BYTES") {
            Some(raw) => parse_upload_limit(&raw)?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let log_json = get_optional_env("SHOP_LOG_JSON").is_some_and(|v| is_truthy(&v));

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            static_dir,
            upload_dir,
            max_upload_bytes,
            log_json,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration for tests: in-memory database, images under `upload_dir`.
    #[must_use]
    pub fn for_tests(upload_dir: PathBuf) -> Self {
        Self {
            database_url: SecretString::from("sqlite::memory:"),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: "http://localhost".to_string(),
            static_dir: PathBuf::from("static"),
            upload_dir,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> SecretString {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_or_else(
            |_| SecretString::from(DEFAULT_DATABASE_URL),
            SecretString::from,
        )
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_upload_limit(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::InvalidEnvVar(
            "SHOP_MAX_UPLOAD_BYTES".to_string(),
            "must be greater than zero".to_string(),
        )),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::InvalidEnvVar(
            "SHOP_MAX_UPLOAD_BYTES".to_string(),
            e.to_string(),
        )),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
