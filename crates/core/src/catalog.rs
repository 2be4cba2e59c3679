//! Product catalog document model.
//!
//! The catalog is a static JSON document:
//!
//! ```json
//! {
//!   "categories": [
//!     {
//!       "name": "Vitamins",
//!       "products": [
//!         {
//!           "id": "vitamin-c",
//!           "name": "Vitamin C",
//!           "description": "1000mg tablets",
//!           "image": "/static/images/vitamin-c.png",
//!           "price": 9.99
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Price, ProductId};

/// Errors that can occur when reading a catalog document.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The document is not valid catalog JSON.
    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The full product catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
}

/// A named group of products, rendered as one page section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// A single purchasable product, rendered as one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub price: Price,
}

impl Catalog {
    /// Parse a catalog from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON, missing fields or
    /// negative prices.
    pub fn parse(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Look up a product by id across all categories.
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products().find(|product| &product.id == id)
    }

    /// Iterate over every product in category order.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.categories
            .iter()
            .flat_map(|category| category.products.iter())
    }

    /// Whether the catalog has no products at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products().next().is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "categories": [
            {
                "name": "Vitamins",
                "products": [
                    {"id": "vitamin-c", "name": "Vitamin C", "description": "1000mg", "image": "vc.png", "price": 9.99},
                    {"id": "zinc", "name": "Zinc", "description": "50mg", "image": "zinc.png", "price": 6}
                ]
            },
            {
                "name": "Pain Relief",
                "products": [
                    {"id": "ibuprofen", "name": "Ibuprofen", "description": "200mg", "image": "ibu.png", "price": 4.5}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let catalog = Catalog::parse(SAMPLE).unwrap();
        assert_eq!(catalog.categories.len(), 2);
        assert_eq!(catalog.categories[0].products.len(), 2);
        assert_eq!(catalog.categories[1].name, "Pain Relief");
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_product_lookup() {
        let catalog = Catalog::parse(SAMPLE).unwrap();
        let product = catalog.product(&ProductId::new("ibuprofen")).unwrap();
        assert_eq!(product.name, "Ibuprofen");
        assert_eq!(product.price.to_string(), "$4.50");
        assert!(catalog.product(&ProductId::new("missing")).is_none());
    }

    #[test]
    fn test_optional_fields_default() {
        let catalog = Catalog::parse(
            r#"{"categories":[{"name":"Misc","products":[{"id":"x","name":"X","price":1}]}]}"#,
        )
        .unwrap();
        let product = catalog.product(&ProductId::new("x")).unwrap();
        assert!(product.description.is_empty());
        assert!(product.image.is_empty());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(Catalog::parse("not json").is_err());
        assert!(Catalog::parse(r#"{"categories": 3}"#).is_err());
        assert!(
            Catalog::parse(r#"{"categories":[{"name":"A","products":[{"id":"x","name":"X","price":-1}]}]}"#)
                .is_err()
        );
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::parse(r#"{"categories":[{"name":"Empty"}]}"#).unwrap();
        assert!(catalog.is_empty());
    }
}
