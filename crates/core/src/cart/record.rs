//! Persisted cart snapshot.

use serde::{Deserialize, Serialize};

use super::{Ledger, LineItem};
use crate::types::Price;

/// Storage key of the current cart.
pub const CART_KEY: &str = "cartData";

/// Storage key of the saved favorite order.
pub const FAVOURITE_KEY: &str = "favouriteCart";

/// A ledger snapshot as stored under [`CART_KEY`] or [`FAVOURITE_KEY`].
///
/// ```json
/// {"orderDetails":[{"title":"Vitamin C","quantity":3,"price":29.97}],"total":"$29.97"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRecord {
    pub order_details: Vec<RecordLine>,
    pub total: String,
}

/// One stored line. `price` is the line total, not the unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLine {
    pub title: String,
    pub quantity: u32,
    pub price: Price,
}

impl CartRecord {
    /// Capture the ledger's current lines and displayed total.
    #[must_use]
    pub fn snapshot(ledger: &Ledger) -> Self {
        Self {
            order_details: ledger
                .items()
                .iter()
                .map(|item| RecordLine {
                    title: item.title.clone(),
                    quantity: item.quantity,
                    price: item.line_total(),
                })
                .collect(),
            total: ledger.total().to_string(),
        }
    }

    /// Serialize to JSON text.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse stored JSON text.
    ///
    /// Malformed text is treated as absent data and logged, never surfaced.
    #[must_use]
    pub fn decode(key: &str, text: &str) -> Option<Self> {
        match serde_json::from_str(text) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring malformed cart record");
                None
            }
        }
    }

    /// Rebuild line items, deriving each unit price as `price / quantity`.
    ///
    /// Returns `None` if any stored line has a zero quantity.
    #[must_use]
    pub fn line_items(&self) -> Option<Vec<LineItem>> {
        self.order_details
            .iter()
            .map(|line| {
                Price::per_unit(line.price, line.quantity).map(|unit_price| LineItem {
                    title: line.title.clone(),
                    quantity: line.quantity,
                    unit_price,
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_source_shape() {
        let record = CartRecord::decode(
            CART_KEY,
            r#"{"orderDetails":[{"title":"Vitamin C","quantity":3,"price":29.97}],"total":"$29.97"}"#,
        )
        .unwrap();

        assert_eq!(record.total, "$29.97");
        let items = record.line_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price.to_string(), "$9.99");
        assert_eq!(items[0].line_total().to_string(), "$29.97");
    }

    #[test]
    fn test_encode_uses_camel_case_and_numbers() {
        let record = CartRecord {
            order_details: vec![RecordLine {
                title: "Zinc".to_string(),
                quantity: 2,
                price: serde_json::from_str("12").unwrap(),
            }],
            total: "$12.00".to_string(),
        };
        let json = record.encode().unwrap();
        assert_eq!(
            json,
            r#"{"orderDetails":[{"title":"Zinc","quantity":2,"price":12.0}],"total":"$12.00"}"#
        );
    }

    #[test]
    fn test_malformed_is_none() {
        assert!(CartRecord::decode(CART_KEY, "").is_none());
        assert!(CartRecord::decode(CART_KEY, "{").is_none());
        assert!(CartRecord::decode(CART_KEY, r#"{"orderDetails":[]}"#).is_none());
        assert!(
            CartRecord::decode(
                CART_KEY,
                r#"{"orderDetails":[{"title":"A","quantity":-1,"price":1}],"total":"$1.00"}"#
            )
            .is_none()
        );
    }

    #[test]
    fn test_zero_quantity_has_no_line_items() {
        let record = CartRecord::decode(
            CART_KEY,
            r#"{"orderDetails":[{"title":"A","quantity":0,"price":1}],"total":"$1.00"}"#,
        )
        .unwrap();
        assert!(record.line_items().is_none());
    }
}
