//! Raw sheet record normalization.
//!
//! The product sheet is edited by hand and exported through two generations
//! of scripts, so a field can arrive under its English key (`price`) or the
//! sheet's column header (`Precio`), as a number or as text. Every field is
//! resolved through [`FieldAlias`] and coerced without ever failing: bad input
//! becomes the field's default.

use std::collections::HashSet;
use std::str::FromStr;

use construmax_core::{PLACEHOLDER_IMAGE, Product, ProductId};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

/// Sentinel the sheet uses for "yes" in boolean columns.
const YES: &str = "SI";

/// A canonical key and the sheet column that carries the same data.
#[derive(Debug, Clone, Copy)]
struct FieldAlias {
    canonical: &'static str,
    alternate: &'static str,
}

const ID: FieldAlias = FieldAlias {
    canonical: "id",
    alternate: "ID_Producto",
};
const NAME: FieldAlias = FieldAlias {
    canonical: "name",
    alternate: "Nombre",
};
const CATEGORY: FieldAlias = FieldAlias {
    canonical: "category",
    alternate: "Categoría_Principal",
};
const ALL_CATEGORIES: FieldAlias = FieldAlias {
    canonical: "allCategories",
    alternate: "Todas_Categorías",
};
const FEATURED: FieldAlias = FieldAlias {
    canonical: "featured",
    alternate: "Destacado",
};
const PRICE: FieldAlias = FieldAlias {
    canonical: "price",
    alternate: "Precio",
};
const STOCK: FieldAlias = FieldAlias {
    canonical: "stock",
    alternate: "Stock",
};
const IMAGE: FieldAlias = FieldAlias {
    canonical: "image",
    alternate: "Imagen URL",
};
const DESCRIPTION: FieldAlias = FieldAlias {
    canonical: "description",
    alternate: "Descripción",
};
const CODE: FieldAlias = FieldAlias {
    canonical: "code",
    alternate: "Código",
};
const ACTIVE: FieldAlias = FieldAlias {
    canonical: "active",
    alternate: "Activo",
};

impl FieldAlias {
    /// The canonical value if present, else the alternate.
    ///
    /// Null and empty strings count as absent, so a blank canonical column
    /// does not hide a filled-in alternate.
    fn resolve<'a>(&self, record: &'a Map<String, Value>) -> Option<&'a Value> {
        [self.canonical, self.alternate]
            .into_iter()
            .filter_map(|key| record.get(key))
            .find(|value| is_present(value))
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Why a raw record did not make it into the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The record is not a JSON object.
    NotAnObject,
    /// Neither `id` nor `ID_Producto` yields a non-empty id.
    MissingId,
    /// The record is marked inactive.
    Inactive(ProductId),
    /// An earlier record already used this id.
    DuplicateId(ProductId),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "record is not an object"),
            Self::MissingId => write!(f, "record has no id"),
            Self::Inactive(id) => write!(f, "product {id} is inactive"),
            Self::DuplicateId(id) => write!(f, "duplicate product id {id}"),
        }
    }
}

/// Normalize a single raw record.
///
/// # Errors
///
/// Returns a [`Rejection`] for non-objects, records without an id, and
/// inactive records.
pub fn normalize_record(raw: &Value) -> Result<Product, Rejection> {
    let record = raw.as_object().ok_or(Rejection::NotAnObject)?;

    let id = ProductId::new(text(ID.resolve(record)));
    if id.is_empty() {
        return Err(Rejection::MissingId);
    }

    // Rows with no activity flag at all are published.
    let active = ACTIVE.resolve(record).is_none_or(flag);
    if !active {
        return Err(Rejection::Inactive(id));
    }

    let category = text(CATEGORY.resolve(record));
    let mut all_categories = categories(ALL_CATEGORIES.resolve(record));
    if all_categories.is_empty() {
        all_categories.push(category.clone());
    }

    let image = IMAGE
        .resolve(record)
        .map(|v| text(Some(v)))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    Ok(Product {
        id,
        name: text(NAME.resolve(record)),
        category,
        all_categories,
        featured: FEATURED.resolve(record).is_some_and(flag),
        price: decimal(PRICE.resolve(record)),
        stock: stock(STOCK.resolve(record)),
        image,
        description: text(DESCRIPTION.resolve(record)),
        code: text(CODE.resolve(record)),
        active,
    })
}

/// Normalize a list of raw records into the catalog's product list.
///
/// Rejected records are logged and skipped. When two records share an id the
/// first one wins.
pub fn normalize_products(records: &[Value]) -> Vec<Product> {
    let mut seen = HashSet::new();
    let mut products = Vec::with_capacity(records.len());

    for (index, raw) in records.iter().enumerate() {
        let result = normalize_record(raw).and_then(|product| {
            if seen.insert(product.id.clone()) {
                Ok(product)
            } else {
                Err(Rejection::DuplicateId(product.id))
            }
        });

        match result {
            Ok(product) => products.push(product),
            Err(Rejection::Inactive(id)) => {
                tracing::debug!(product_id = %id, "Skipping inactive product");
            }
            Err(rejection) => {
                tracing::warn!(index, reason = %rejection, "Skipping catalog record");
            }
        }
    }

    products
}

// =============================================================================
// Coercions
// =============================================================================

/// Text fields: strings are trimmed, numbers and booleans are stringified.
fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Boolean columns: a JSON boolean, or exactly `"SI"`.
fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == YES,
        _ => false,
    }
}

/// Comma-delimited text or an array of names. Blank entries are dropped.
fn categories(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| text(Some(item)))
            .filter(|c| !c.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse a number out of a JSON value as a non-negative decimal, or zero.
fn decimal(value: Option<&Value>) -> Decimal {
    let parsed = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_u64().map(Decimal::from))
            .or_else(|| n.as_f64().and_then(finite_decimal)),
        Some(Value::String(s)) => parse_decimal(s),
        _ => None,
    };
    parsed
        .filter(|d| d.is_sign_positive())
        .unwrap_or(Decimal::ZERO)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(finite_decimal))
}

/// Finite values past the decimal range saturate at [`Decimal::MAX`].
fn finite_decimal(f: f64) -> Option<Decimal> {
    if f.is_finite() {
        Decimal::try_from(f)
            .ok()
            .or_else(|| (f >= 1.0).then_some(Decimal::MAX))
    } else {
        None
    }
}

/// Parse a number out of a JSON value as a whole unit count, or zero.
///
/// Fractions are truncated and values past `u32::MAX` saturate.
fn stock(value: Option<&Value>) -> u32 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.map_or(0, units)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to u32 range first
fn units(f: f64) -> u32 {
    if f.is_finite() && f > 0.0 {
        f.trunc().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}
