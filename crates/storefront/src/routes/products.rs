//! Product listing route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
};
use construmax_core::{CategoryFilter, Product};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::render::{PageChrome, ViewMode, render_products};
use crate::state::AppState;

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub chrome: PageChrome,
    pub grid: String,
    pub query: String,
    pub result_count: usize,
}

/// Display the product listing.
///
/// HTMX requests receive only the product grid fragment.
#[instrument(skip(state, headers))]
pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListingQuery>,
) -> Result<Response> {
    let filter = CategoryFilter::parse(query.category.as_deref().unwrap_or_default());
    let term = query.q.unwrap_or_default();

    let snapshot = state.catalog().await;
    let products: Vec<&Product> = snapshot
        .catalog
        .by_category(&filter)
        .into_iter()
        .filter(|p| p.matches_search(&term))
        .collect();
    let grid = render_products(&products, ViewMode::All)?;

    if headers.contains_key("hx-request") {
        return Ok(Html(grid).into_response());
    }

    let cart_count = state.cart().await.item_count();
    Ok(ProductsIndexTemplate {
        chrome: PageChrome::new(cart_count, filter.as_str(), snapshot.source),
        grid,
        query: term.trim().to_string(),
        result_count: products.len(),
    }
    .into_response())
}
