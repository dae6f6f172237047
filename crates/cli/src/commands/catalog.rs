//! List the product catalog.

use construmax_core::{Catalog, CategoryFilter, Product};
use construmax_storefront::catalog::{CatalogLoader, CatalogSnapshot};
use construmax_storefront::config::CatalogConfig;
use tracing::info;

/// Listing filters.
#[derive(Debug, Default)]
pub struct Query {
    pub category: Option<String>,
    pub featured: bool,
    pub search: Option<String>,
}

impl Query {
    /// Apply the filters in order: category, featured, search.
    #[must_use]
    pub fn select<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Product> {
        let filter = CategoryFilter::parse(self.category.as_deref().unwrap_or_default());
        let term = self.search.as_deref().unwrap_or_default();

        catalog
            .by_category(&filter)
            .into_iter()
            .filter(|p| !self.featured || (p.featured && p.in_stock()))
            .filter(|p| p.matches_search(term))
            .collect()
    }
}

/// Load the catalog and log one line per selected product.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built, or, with `strict`,
/// if the product sheet cannot be loaded.
pub async fn list(
    config: &CatalogConfig,
    query: &Query,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let loader = CatalogLoader::new(config)?;
    info!(endpoint = %loader.endpoint(), "Loading catalog");

    let snapshot = if strict {
        CatalogSnapshot::remote(loader.fetch().await?)
    } else {
        loader.load().await
    };

    let selected = query.select(&snapshot.catalog);
    for product in &selected {
        info!(
            id = %product.id,
            code = %product.code,
            price = %product.unit_price(),
            stock = product.stock,
            featured = product.featured,
            categories = %product.all_categories.join(","),
            "{}",
            product.name
        );
    }

    info!(
        source = %snapshot.source,
        shown = selected.len(),
        total = snapshot.catalog.len(),
        "Catalog listed"
    );
    Ok(())
}
