//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every mutation answers with an `HX-Trigger: cart-updated` header; the
//! header badge also follows the count over server-sent events.

use std::convert::Infallible;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{
        AppendHeaders, IntoResponse, Response, Sse,
        sse::{Event, KeepAlive},
    },
};
use construmax_core::{CategoryFilter, ProductId};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::render::{CartView, PageChrome};
use crate::state::AppState;

/// Response header HTMX reads to fire client-side events.
pub const HX_TRIGGER: &str = "HX-Trigger";

/// Event fired after any cart mutation.
pub const CART_UPDATED: &str = "cart-updated";

/// SSE event name carrying the item count.
pub const COUNT_EVENT: &str = "count";

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub chrome: PageChrome,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Display cart page.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> CartShowTemplate {
    let snapshot = state.catalog().await;
    let store = state.cart().await;

    CartShowTemplate {
        chrome: PageChrome::new(store.item_count(), CategoryFilter::ALL, snapshot.source),
        cart: CartView::build(store.cart(), &snapshot.catalog),
    }
}

/// Add item to cart (HTMX).
///
/// Returns the new badge count with an HTMX trigger so other elements can
/// refresh.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.product_id);
    let quantity = form.quantity.unwrap_or(1);

    let snapshot = state.catalog().await;
    let mut store = state.cart().await;
    store.add(&snapshot.catalog, &product_id, quantity)?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.as_str())]),
    );

    Ok((
        AppendHeaders([(HX_TRIGGER, CART_UPDATED)]),
        CartCountTemplate {
            count: store.item_count(),
        },
    )
        .into_response())
}

/// Update cart item quantity (HTMX).
///
/// A quantity of zero or less removes the line.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.product_id);

    let snapshot = state.catalog().await;
    let mut store = state.cart().await;
    store.set_quantity(&snapshot.catalog, &product_id, form.quantity)?;

    Ok((
        AppendHeaders([(HX_TRIGGER, CART_UPDATED)]),
        CartItemsTemplate {
            cart: CartView::build(store.cart(), &snapshot.catalog),
        },
    )
        .into_response())
}

/// Remove item from cart (HTMX).
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id);

    let snapshot = state.catalog().await;
    let mut store = state.cart().await;
    store.remove(&product_id);

    (
        AppendHeaders([(HX_TRIGGER, CART_UPDATED)]),
        CartItemsTemplate {
            cart: CartView::build(store.cart(), &snapshot.catalog),
        },
    )
        .into_response()
}

/// Get cart count badge (HTMX).
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> CartCountTemplate {
    CartCountTemplate {
        count: state.cart().await.item_count(),
    }
}

/// Stream the cart count as server-sent events.
///
/// Sends the current count first, then one event per cart mutation. The
/// stream ends when the server starts shutting down.
pub async fn count_stream(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = std::result::Result<Event, Infallible>>> {
    let mut counts = state.cart().await.subscribe();
    let mut closing = state.closing();

    let stream = async_stream::stream! {
        let current = *counts.borrow_and_update();
        yield Ok::<_, Infallible>(count_event(current));

        loop {
            let changed = tokio::select! {
                changed = counts.changed() => changed.is_ok(),
                _ = closing.wait_for(|closed| *closed) => false,
            };
            if !changed {
                break;
            }

            let current = *counts.borrow_and_update();
            yield Ok::<_, Infallible>(count_event(current));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn count_event(count: u32) -> Event {
    Event::default().event(COUNT_EVENT).data(count.to_string())
}
