//! View models and product grid rendering.
//!
//! Product cards are rendered by [`render_products`], a pure function of the
//! product list and the [`ViewMode`]. Pages embed the resulting fragment, and
//! HTMX requests can receive it directly.

use askama::Template;
use construmax_core::{Cart, Catalog, CategoryFilter, Price, Product, StockLevel};

use crate::catalog::CatalogSource;

/// Which product view to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewMode {
    /// Compact cards for the home page carousel.
    Featured,
    /// Full cards with description, code and stock for the listing page.
    All,
}

impl ViewMode {
    const fn empty_message(self) -> &'static str {
        match self {
            Self::Featured => "No hay productos destacados",
            Self::All => "No hay productos disponibles",
        }
    }
}

/// Product card display data for templates.
#[derive(Debug, Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub code: String,
    pub image: String,
    pub price: String,
    pub stock_label: &'static str,
    pub stock_class: &'static str,
    pub sold_out: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        let level = product.stock_level();
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            code: product.code.clone(),
            image: product.image.clone(),
            price: product.unit_price().display(),
            stock_label: level.label(),
            stock_class: stock_class(level),
            sold_out: !product.in_stock(),
        }
    }
}

const fn stock_class(level: StockLevel) -> &'static str {
    match level {
        StockLevel::Available => "text-green-600",
        StockLevel::Low => "text-yellow-600",
        StockLevel::SoldOut => "text-red-600",
    }
}

/// Product grid fragment.
#[derive(Template)]
#[template(path = "partials/product_grid.html")]
struct ProductGridTemplate<'a> {
    cards: &'a [ProductCardView],
    featured: bool,
    empty_message: &'static str,
}

/// Render product cards for the given view.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn render_products(products: &[&Product], mode: ViewMode) -> Result<String, askama::Error> {
    let cards: Vec<ProductCardView> = products.iter().map(|p| ProductCardView::from(*p)).collect();

    ProductGridTemplate {
        cards: &cards,
        featured: mode == ViewMode::Featured,
        empty_message: mode.empty_message(),
    }
    .render()
}

// =============================================================================
// Cart
// =============================================================================

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    /// Upper bound for the quantity input.
    pub max_quantity: u32,
    /// The product is no longer in the catalog.
    pub unavailable: bool,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
}

impl CartView {
    /// Join cart lines with the current catalog.
    ///
    /// Prices come from the line snapshots. Lines whose product has left the
    /// catalog are still listed, under their product id.
    #[must_use]
    pub fn build(cart: &Cart, catalog: &Catalog) -> Self {
        let items = cart
            .lines()
            .iter()
            .map(|line| {
                let product = catalog.find(&line.product_id);
                CartItemView {
                    product_id: line.product_id.to_string(),
                    name: product.map_or_else(|| line.product_id.to_string(), |p| p.name.clone()),
                    image: product.map_or_else(
                        || construmax_core::PLACEHOLDER_IMAGE.to_string(),
                        |p| p.image.clone(),
                    ),
                    quantity: line.quantity,
                    unit_price: Price::ars(line.price).display(),
                    line_total: Price::ars(line.subtotal()).display(),
                    max_quantity: product.map_or(line.quantity, |p| p.stock.max(line.quantity)),
                    unavailable: product.is_none(),
                }
            })
            .collect();

        Self {
            items,
            total: Price::ars(cart.total()).display(),
            item_count: cart.item_count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Header data shared by every full page.
#[derive(Debug, Clone)]
pub struct PageChrome {
    pub cart_count: u32,
    pub categories: Vec<CategoryLink>,
    /// The catalog shown is the built-in one.
    pub using_fallback: bool,
}

impl PageChrome {
    #[must_use]
    pub fn new(cart_count: u32, selected_category: &str, source: CatalogSource) -> Self {
        Self {
            cart_count,
            categories: category_links(selected_category),
            using_fallback: source == CatalogSource::Fallback,
        }
    }
}

/// Navigation link for a shop category.
#[derive(Debug, Clone)]
pub struct CategoryLink {
    pub slug: &'static str,
    pub label: String,
    pub selected: bool,
}

/// Category navigation with `selected` marking the active filter.
#[must_use]
pub fn category_links(selected: &str) -> Vec<CategoryLink> {
    Catalog::categories()
        .iter()
        .map(|slug| CategoryLink {
            slug,
            label: capitalize(slug),
            selected: CategoryFilter::parse(slug) == CategoryFilter::parse(selected),
        })
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
