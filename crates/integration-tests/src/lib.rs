//! Integration tests for ConstruMax.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p construmax-integration-tests
//! ```
//!
//! No external services are needed: [`MockCatalog`] serves the product sheet
//! payload from a local axum server on an ephemeral port, and the storefront
//! is driven either in-process with `tower::ServiceExt::oneshot` or through
//! [`spawn_storefront`] over real HTTP.
//!
//! # Test Categories
//!
//! - `catalog_loader` - Loading, normalization and fallback against the mock sheet
//! - `storefront_routes` - Pages, HTMX cart fragments and JSON API

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::{Router, extract::State, http::StatusCode, http::header, routing::get};
use construmax_storefront::catalog::CatalogLoader;
use construmax_storefront::config::{CatalogConfig, StorefrontConfig};
use construmax_storefront::routes;
use construmax_storefront::state::AppState;
use construmax_storefront::storage::KeyValueStore;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Path the mock sheet answers on.
pub const CATALOG_PATH: &str = "/exec";

struct MockState {
    response: Mutex<(u16, String)>,
    hits: AtomicUsize,
}

/// A local stand-in for the product sheet web app.
pub struct MockCatalog {
    addr: SocketAddr,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockCatalog {
    /// Serve `body` with `status` on [`CATALOG_PATH`].
    pub async fn spawn(status: u16, body: impl Into<String>) -> Self {
        let state = Arc::new(MockState {
            response: Mutex::new((status, body.into())),
            hits: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route(CATALOG_PATH, get(respond))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Serve a `{ "products": [...] }` payload.
    pub async fn with_products(products: &serde_json::Value) -> Self {
        Self::spawn(200, serde_json::json!({ "products": products }).to_string()).await
    }

    /// Endpoint URL for a [`CatalogConfig`].
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}{CATALOG_PATH}", self.addr)
    }

    /// Change what later requests receive.
    pub fn set_response(&self, status: u16, body: impl Into<String>) {
        *self
            .state
            .response
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = (status, body.into());
    }

    /// Number of requests served so far.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }
}

impl Drop for MockCatalog {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn respond(State(state): State<Arc<MockState>>) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let (status, body) = state
        .response
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();

    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

/// A URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}{CATALOG_PATH}")
}

/// Catalog settings pointing at `url` with a short timeout.
#[must_use]
pub fn catalog_config(url: &str) -> CatalogConfig {
    CatalogConfig::parse(url, "2").unwrap()
}

/// Storefront settings for tests. Resources are served from
/// `<data_dir>/resources`.
#[must_use]
pub fn storefront_config(catalog_url: &str, data_dir: PathBuf) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        catalog: catalog_config(catalog_url),
        resources_dir: data_dir.join("resources"),
        data_dir,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Build storefront state: load the catalog from `catalog_url` and restore
/// the cart from `storage`.
pub async fn test_state(catalog_url: &str, storage: Arc<dyn KeyValueStore>) -> AppState {
    let config = storefront_config(catalog_url, PathBuf::from("unused"));
    let loader = CatalogLoader::new(&config.catalog).unwrap();
    let snapshot = loader.load().await;
    AppState::new(config, loader, storage, snapshot)
}

/// Serve the storefront over HTTP on an ephemeral port.
pub async fn spawn_storefront(state: AppState) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = routes::app(state);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), handle)
}

/// Raw product sheet rows in the shape the shop's spreadsheet exports.
#[must_use]
pub fn sheet_rows() -> serde_json::Value {
    serde_json::json!([
        {
            "ID_Producto": "amoladora-010",
            "Nombre": "Amoladora Angular 115mm",
            "Categoría_Principal": "herramientas",
            "Todas_Categorías": "herramientas, electricidad",
            "Destacado": "SI",
            "Precio": "32999.50",
            "Stock": "4",
            "Imagen URL": "https://cdn.construmax.com.ar/amoladora.jpg",
            "Descripción": "Amoladora 850W con disco",
            "Código": "AML-115",
            "Activo": "SI"
        },
        {
            "id": "cinta-011",
            "name": "Cinta Aisladora",
            "category": "electricidad",
            "featured": false,
            "price": 1500,
            "stock": 200,
            "code": "CNT-19"
        },
        {
            "ID_Producto": "pala-012",
            "Nombre": "Pala Ancha",
            "Categoría_Principal": "construccion",
            "Precio": "abc",
            "Stock": "",
            "Activo": "NO"
        },
        {
            "Nombre": "Fila sin ID",
            "Precio": 10
        },
        {
            "id": "cinta-011",
            "name": "Cinta duplicada",
            "price": 1
        }
    ])
}
