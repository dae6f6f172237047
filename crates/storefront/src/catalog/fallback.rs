//! Built-in catalog served when the product sheet cannot be loaded.

use construmax_core::{Product, ProductId};
use rust_decimal::Decimal;

/// The fixed catalog used when the remote source fails.
///
/// Covers several categories, featured and regular products, and one
/// featured product that is sold out.
#[must_use]
pub fn default_products() -> Vec<Product> {
    vec![
        Product {
            id: ProductId::new("taladro-001"),
            name: "Taladro Percutor 650W".to_string(),
            category: "herramientas".to_string(),
            all_categories: vec!["herramientas".to_string(), "electricidad".to_string()],
            featured: true,
            price: Decimal::new(25_999, 0),
            stock: 15,
            image: "resources/taladro.jpg".to_string(),
            description: "Taladro percutor profesional con 650W de potencia".to_string(),
            code: "TLD-650".to_string(),
            active: true,
        },
        Product {
            id: ProductId::new("martillo-002"),
            name: "Martillo Demoledor".to_string(),
            category: "herramientas".to_string(),
            all_categories: vec!["herramientas".to_string(), "construccion".to_string()],
            featured: true,
            price: Decimal::new(45_999, 0),
            stock: 0,
            image: "resources/martillo.jpg".to_string(),
            description: "Martillo demoledor 1500W para trabajos pesados".to_string(),
            code: "MRT-D1500".to_string(),
            active: true,
        },
        Product {
            id: ProductId::new("cable-003"),
            name: "Cable Eléctrico 2.5mm".to_string(),
            category: "electricidad".to_string(),
            all_categories: vec!["electricidad".to_string()],
            featured: false,
            price: Decimal::new(8_999, 0),
            stock: 50,
            image: "resources/cable.jpg".to_string(),
            description: "Cable eléctrico THHN 2.5mm x 100m".to_string(),
            code: "CBL-250".to_string(),
            active: true,
        },
    ]
}
