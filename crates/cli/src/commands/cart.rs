//! Inspect and edit the persisted cart.
//!
//! Uses the same storage key and file layout as the storefront, so changes
//! show up the next time the storefront starts.

use std::path::Path;
use std::sync::Arc;

use construmax_core::ProductId;
use construmax_storefront::cart::CartStore;
use construmax_storefront::catalog::{CatalogLoader, CatalogSnapshot};
use construmax_storefront::config::CatalogConfig;
use construmax_storefront::render::CartView;
use construmax_storefront::storage::FileStore;
use tracing::info;

fn open(data_dir: &Path) -> CartStore {
    CartStore::restore(Arc::new(FileStore::new(data_dir)))
}

async fn load_catalog(config: &CatalogConfig) -> Result<CatalogSnapshot, Box<dyn std::error::Error>> {
    Ok(CatalogLoader::new(config)?.load().await)
}

fn log_cart(store: &CartStore, snapshot: &CatalogSnapshot) {
    let view = CartView::build(store.cart(), &snapshot.catalog);
    for item in &view.items {
        info!(
            product_id = %item.product_id,
            quantity = item.quantity,
            unit_price = %item.unit_price,
            line_total = %item.line_total,
            unavailable = item.unavailable,
            "{}",
            item.name
        );
    }
    info!(items = view.item_count, total = %view.total, "Cart");
}

/// Log the cart lines and totals.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub async fn show(config: &CatalogConfig, data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = load_catalog(config).await?;
    log_cart(&open(data_dir), &snapshot);
    Ok(())
}

/// Add units of a product, validated against the current catalog.
///
/// # Errors
///
/// Returns an error if the product is unknown, stock is insufficient, or
/// the quantity is zero.
pub async fn add(
    config: &CatalogConfig,
    data_dir: &Path,
    product_id: &str,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = load_catalog(config).await?;
    let mut store = open(data_dir);

    store.add(&snapshot.catalog, &ProductId::new(product_id), quantity)?;
    log_cart(&store, &snapshot);
    Ok(())
}

/// Overwrite a line's quantity.
///
/// # Errors
///
/// Returns an error if the quantity exceeds the product's stock.
pub async fn set(
    config: &CatalogConfig,
    data_dir: &Path,
    product_id: &str,
    quantity: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = load_catalog(config).await?;
    let mut store = open(data_dir);

    if store
        .set_quantity(&snapshot.catalog, &ProductId::new(product_id), quantity)?
        .is_none()
        && quantity > 0
    {
        info!(product_id, "No matching cart line, nothing changed");
    }
    log_cart(&store, &snapshot);
    Ok(())
}

/// Remove a product's line. Removing an absent line is not an error.
pub fn remove(data_dir: &Path, product_id: &str) {
    let mut store = open(data_dir);
    store.remove(&ProductId::new(product_id));
    info!(
        product_id,
        items = store.item_count(),
        total = %store.total(),
        "Cart line removed"
    );
}
