//! JSON API route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::cart::CartSummary;
use crate::catalog::CatalogSnapshot;
use crate::state::AppState;

/// The current catalog snapshot with its provenance.
#[instrument(skip(state))]
pub async fn products(State(state): State<AppState>) -> Json<CatalogSnapshot> {
    Json(state.catalog().await.as_ref().clone())
}

/// Cart lines, total and item count.
#[instrument(skip(state))]
pub async fn cart(State(state): State<AppState>) -> Json<CartSummary> {
    Json(state.cart().await.summary())
}
