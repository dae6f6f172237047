//! Normalized catalog products and queries over the loaded catalog.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Image shown when a product row carries no image URL.
pub const PLACEHOLDER_IMAGE: &str = "resources/placeholder.jpg";

/// Navigation categories offered by the shop, in display order.
///
/// `todos` is the storefront's label for "every category".
pub const SHOP_CATEGORIES: &[&str] = &[
    "todos",
    "herramientas",
    "electricidad",
    "fontaneria",
    "construccion",
    "seguridad",
    "jardin",
    "iluminacion",
    "tornilleria",
    "pinturas",
    "plasticos",
    "madera",
];

/// A product in canonical form.
///
/// Products are produced by the catalog normalizer and never mutated after
/// load. `all_categories` is never empty and `price`/`stock` are never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub all_categories: Vec<String>,
    pub featured: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: u32,
    pub image: String,
    pub description: String,
    pub code: String,
    pub active: bool,
}

impl Product {
    /// Unit price in the shop currency.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::ars(self.price)
    }

    /// Whether at least one unit can be added to a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Whether the product belongs to `category` (primary or secondary).
    #[must_use]
    pub fn has_category(&self, category: &str) -> bool {
        self.all_categories.iter().any(|c| c == category)
    }

    /// Whether the name or description contains `term`, ignoring case.
    ///
    /// A blank term matches every product.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }

    /// Coarse availability bucket for listing badges.
    #[must_use]
    pub const fn stock_level(&self) -> StockLevel {
        match self.stock {
            0 => StockLevel::SoldOut,
            1..=10 => StockLevel::Low,
            _ => StockLevel::Available,
        }
    }
}

/// Availability bucket derived from a product's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockLevel {
    /// More than ten units.
    Available,
    /// Between one and ten units.
    Low,
    /// No units left.
    SoldOut,
}

impl StockLevel {
    /// Customer-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Available => "Disponible",
            Self::Low => "Últimas unidades",
            Self::SoldOut => "Sin stock",
        }
    }
}

/// Category selector for listing queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    /// Every product, regardless of category or stock.
    #[default]
    All,
    /// In-stock products tagged with this category.
    Named(String),
}

impl CategoryFilter {
    /// Sentinel selecting every product.
    pub const ALL: &'static str = "all";

    /// Parse a query-string value; `all`, `todos` and blank select everything.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == Self::ALL || value == "todos" {
            Self::All
        } else {
            Self::Named(value.to_owned())
        }
    }

    /// The selected category name, or the `all` sentinel.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => Self::ALL,
            Self::Named(name) => name,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// The normalized, active-only product list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Wrap an already-normalized product list.
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// All products in source order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Look up a product by id.
    #[must_use]
    pub fn find(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Products matching a category filter.
    ///
    /// [`CategoryFilter::All`] returns every product, sold-out ones included.
    /// A named category returns only products that carry it and have stock.
    #[must_use]
    pub fn by_category(&self, filter: &CategoryFilter) -> Vec<&Product> {
        match filter {
            CategoryFilter::All => self.products.iter().collect(),
            CategoryFilter::Named(category) => self
                .products
                .iter()
                .filter(|p| p.has_category(category) && p.in_stock())
                .collect(),
        }
    }

    /// Featured products that can still be bought.
    #[must_use]
    pub fn featured(&self) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.featured && p.in_stock())
            .collect()
    }

    /// Case-insensitive substring search over name and description.
    ///
    /// A blank term matches everything.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.matches_search(term))
            .collect()
    }

    /// Navigation categories, independent of which products are loaded.
    #[must_use]
    pub const fn categories() -> &'static [&'static str] {
        SHOP_CATEGORIES
    }
}

impl From<Vec<Product>> for Catalog {
    fn from(products: Vec<Product>) -> Self {
        Self::new(products)
    }
}
