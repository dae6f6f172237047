//! Catalog maintenance route handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::catalog::CatalogSource;
use crate::state::AppState;

/// Outcome of a catalog refresh.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub source: CatalogSource,
    pub count: usize,
}

/// Reload the catalog from the product sheet.
///
/// Always succeeds; a failed load swaps in the built-in products and reports
/// `fallback` as the source.
#[instrument(skip(state))]
pub async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    let snapshot = state.refresh_catalog().await;
    Json(RefreshResponse {
        source: snapshot.source,
        count: snapshot.catalog.len(),
    })
}
