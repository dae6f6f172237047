//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CONSTRUMAX_CATALOG_URL` - Product sheet web app endpoint
//! - `CONSTRUMAX_CATALOG_TIMEOUT_SECS` - Catalog request timeout (default: 10)
//! - `CONSTRUMAX_DATA_DIR` - Directory for persisted state (default: data)
//! - `CONSTRUMAX_RESOURCES_DIR` - Images and favicon served under `/resources`
//!   (default: crates/storefront/resources)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Product sheet endpoint published by the shop's Apps Script deployment.
pub const DEFAULT_CATALOG_URL: &str = "https://script.google.com/macros/s/AKfycbw5JtLIQU5j-fj8fNO3iNfOQ3RO3pqmZMP2qFZ1RwpWl_4ZcyLIsNYQf_AgWEGx3I38/exec";

const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Product sheet configuration
    pub catalog: CatalogConfig,
    /// Directory for the persisted cart
    pub data_dir: PathBuf,
    /// Directory served under `/resources`
    pub resources_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

/// Product sheet endpoint configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Web app URL answering `{ "products": [...] }`
    pub endpoint: Url,
    /// Request timeout
    pub timeout: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_var("STOREFRONT_HOST", &get_env_or_default("STOREFRONT_HOST", "127.0.0.1"))?;
        let port = parse_var("STOREFRONT_PORT", &get_env_or_default("STOREFRONT_PORT", "3000"))?;
        let catalog = CatalogConfig::from_env()?;
        let data_dir = PathBuf::from(get_env_or_default("CONSTRUMAX_DATA_DIR", "data"));
        let resources_dir = PathBuf::from(get_env_or_default(
            "CONSTRUMAX_RESOURCES_DIR",
            "crates/storefront/resources",
        ));

        Ok(Self {
            host,
            port,
            catalog,
            data_dir,
            resources_dir,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CatalogConfig {
    /// Load the catalog endpoint settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL or timeout cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = get_env_or_default("CONSTRUMAX_CATALOG_URL", DEFAULT_CATALOG_URL);
        let timeout = get_env_or_default(
            "CONSTRUMAX_CATALOG_TIMEOUT_SECS",
            &DEFAULT_CATALOG_TIMEOUT_SECS.to_string(),
        );
        Self::parse(&endpoint, &timeout)
    }

    /// Build from raw endpoint and timeout strings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not absolute http(s)
    /// or the timeout is not a positive whole number of seconds.
    pub fn parse(endpoint: &str, timeout_secs: &str) -> Result<Self, ConfigError> {
        let endpoint: Url = parse_var("CONSTRUMAX_CATALOG_URL", endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "CONSTRUMAX_CATALOG_URL".to_string(),
                format!("unsupported scheme {}", endpoint.scheme()),
            ));
        }

        let secs: u64 = parse_var("CONSTRUMAX_CATALOG_TIMEOUT_SECS", timeout_secs)?;
        if secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CONSTRUMAX_CATALOG_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            endpoint,
            timeout: Duration::from_secs(secs),
        })
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_CATALOG_URL)
                .unwrap_or_else(|e| unreachable!("default catalog URL is valid: {e}")),
            timeout: Duration::from_secs(DEFAULT_CATALOG_TIMEOUT_SECS),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a variable's raw value, naming the variable in the error.
fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
