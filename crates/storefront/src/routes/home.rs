//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use construmax_core::CategoryFilter;
use tracing::instrument;

use crate::error::Result;
use crate::render::{PageChrome, ViewMode, render_products};
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub chrome: PageChrome,
    pub grid: String,
}

/// Display the home page with the featured products.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<HomeTemplate> {
    let snapshot = state.catalog().await;
    let grid = render_products(&snapshot.catalog.featured(), ViewMode::Featured)?;
    let cart_count = state.cart().await.item_count();

    Ok(HomeTemplate {
        chrome: PageChrome::new(cart_count, CategoryFilter::ALL, snapshot.source),
        grid,
    })
}
