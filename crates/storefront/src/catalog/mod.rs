//! Product catalog loading.
//!
//! # Architecture
//!
//! - One GET to the product sheet's web app endpoint, no retries
//! - Raw records are normalized by [`normalize`] (field aliasing, coercion)
//! - Any failure falls back to the built-in catalog in [`fallback`]
//!
//! [`CatalogLoader::load`] never fails: the storefront always has products to
//! show, and the returned [`CatalogSnapshot`] records where they came from.
//!
//! # Example
//!
//! ```rust,ignore
//! use construmax_storefront::catalog::CatalogLoader;
//!
//! let loader = CatalogLoader::new(&config.catalog)?;
//! let snapshot = loader.load().await;
//! tracing::info!(count = snapshot.catalog.len(), source = %snapshot.source, "Catalog ready");
//! ```

pub mod fallback;
pub mod normalize;

use chrono::{DateTime, Utc};
use construmax_core::Catalog;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::CatalogConfig;

pub use fallback::default_products;
pub use normalize::{normalize_products, normalize_record};

/// Errors fetching the remote catalog.
///
/// [`CatalogLoader::load`] folds all of these into the fallback catalog;
/// they surface only through [`CatalogLoader::fetch`].
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("catalog endpoint returned HTTP {status}")]
    Status {
        /// Response status code.
        status: u16,
        /// First part of the response body, for diagnostics.
        body: String,
    },

    /// The body is not JSON, or has no `products` array.
    #[error("malformed catalog payload: {0}")]
    Malformed(String),
}

/// Where the current product list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    /// Loaded and normalized from the product sheet.
    Remote,
    /// The built-in list, used after a failed load.
    Fallback,
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// A loaded catalog together with its provenance.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogSnapshot {
    #[serde(rename = "products")]
    pub catalog: Catalog,
    pub source: CatalogSource,
    pub loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    /// Snapshot of products normalized from the remote source.
    #[must_use]
    pub fn remote(catalog: Catalog) -> Self {
        Self {
            catalog,
            source: CatalogSource::Remote,
            loaded_at: Utc::now(),
        }
    }

    /// Snapshot of the built-in catalog.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            catalog: Catalog::new(default_products()),
            source: CatalogSource::Fallback,
            loaded_at: Utc::now(),
        }
    }
}

/// Loads the product catalog from the sheet endpoint.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    client: reqwest::Client,
    endpoint: Url,
}

impl CatalogLoader {
    /// Create a loader for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// The endpoint this loader reads from.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Load the catalog, substituting the built-in list on any failure.
    ///
    /// Safe to call repeatedly; each call produces a fresh snapshot and the
    /// caller replaces its previous one wholesale.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn load(&self) -> CatalogSnapshot {
        match self.fetch().await {
            Ok(catalog) => {
                tracing::info!(count = catalog.len(), "Catalog loaded from product sheet");
                CatalogSnapshot::remote(catalog)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Catalog load failed, using built-in products");
                CatalogSnapshot::fallback()
            }
        }
    }

    /// Fetch and normalize the remote catalog without falling back.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the endpoint answers with a
    /// non-success status, or the payload has no `products` array.
    pub async fn fetch(&self) -> Result<Catalog, CatalogError> {
        let response = self.client.get(self.endpoint.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let records = parse_payload(&body)?;
        Ok(Catalog::new(normalize_products(&records)))
    }
}

/// Extract the raw `products` array from a response body.
///
/// # Errors
///
/// Returns [`CatalogError::Malformed`] if the body is not JSON or `products`
/// is missing or not an array.
pub fn parse_payload(body: &str) -> Result<Vec<Value>, CatalogError> {
    let mut payload: Value =
        serde_json::from_str(body).map_err(|e| CatalogError::Malformed(e.to_string()))?;

    match payload.get_mut("products").map(Value::take) {
        Some(Value::Array(records)) => Ok(records),
        Some(other) => Err(CatalogError::Malformed(format!(
            "`products` is {}, expected an array",
            json_kind(&other)
        ))),
        None => Err(CatalogError::Malformed("missing `products`".to_string())),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
