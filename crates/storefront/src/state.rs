//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, RwLock, watch};

use crate::cart::CartStore;
use crate::catalog::{CatalogError, CatalogLoader, CatalogSnapshot};
use crate::config::StorefrontConfig;
use crate::storage::{FileStore, KeyValueStore, StorageError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The catalog snapshot is
/// replaced wholesale on refresh; cart mutations are serialized through a
/// single lock so every change is persisted before the next one starts.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    loader: CatalogLoader,
    catalog: RwLock<Arc<CatalogSnapshot>>,
    cart: Mutex<CartStore>,
    closing: watch::Sender<bool>,
}

impl AppState {
    /// Build the state for a running storefront.
    ///
    /// Loads the catalog (falling back to the built-in products on failure)
    /// and restores the cart from the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub async fn initialize(config: StorefrontConfig) -> Result<Self, CatalogError> {
        let loader = CatalogLoader::new(&config.catalog)?;
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.data_dir.clone()));
        let snapshot = loader.load().await;

        Ok(Self::new(config, loader, storage, snapshot))
    }

    /// Create a new application state from already-built parts.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `loader` - Catalog loader used by refreshes
    /// * `storage` - Durable store the cart is restored from and written to
    /// * `snapshot` - Initial catalog
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        loader: CatalogLoader,
        storage: Arc<dyn KeyValueStore>,
        snapshot: CatalogSnapshot,
    ) -> Self {
        let cart = CartStore::restore(storage);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                loader,
                catalog: RwLock::new(Arc::new(snapshot)),
                cart: Mutex::new(cart),
                closing: watch::Sender::new(false),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The current catalog snapshot.
    pub async fn catalog(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&*self.inner.catalog.read().await)
    }

    /// Lock the cart for reading or mutation.
    pub async fn cart(&self) -> MutexGuard<'_, CartStore> {
        self.inner.cart.lock().await
    }

    /// Reload the catalog and replace the current snapshot.
    ///
    /// Concurrent refreshes are not coalesced; whichever load finishes last
    /// wins. Cart lines whose product disappeared are kept and simply stop
    /// contributing to catalog lookups.
    pub async fn refresh_catalog(&self) -> Arc<CatalogSnapshot> {
        let snapshot = Arc::new(self.inner.loader.load().await);
        *self.inner.catalog.write().await = Arc::clone(&snapshot);
        snapshot
    }

    /// Signal long-lived responses to finish.
    pub fn begin_shutdown(&self) {
        self.inner.closing.send_replace(true);
    }

    /// Flips to `true` once [`AppState::begin_shutdown`] has been called.
    #[must_use]
    pub fn closing(&self) -> watch::Receiver<bool> {
        self.inner.closing.subscribe()
    }

    /// Flush the cart one last time before the process exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the final write fails.
    pub async fn shutdown(&self) -> Result<(), StorageError> {
        self.cart().await.persist()
    }
}
