//! In-memory cart ledger and its storage operations.

use tracing::{debug, info, warn};

use super::{AddOutcome, CART_KEY, CartError, CartRecord, Confirmation, FAVOURITE_KEY};
use crate::storage::KeyValueStore;
use crate::types::{Price, Quantity};

/// One product entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub title: String,
    pub quantity: u32,
    pub unit_price: Price,
}

impl LineItem {
    /// Create a line from a validated quantity.
    #[must_use]
    pub fn new(title: impl Into<String>, quantity: Quantity, unit_price: Price) -> Self {
        Self {
            title: title.into(),
            quantity: quantity.get(),
            unit_price,
        }
    }

    /// `quantity × unit_price`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Display row of the order table: title, quantity, formatted line total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub title: String,
    pub quantity: u32,
    pub price: String,
}

/// The shopper's cart: ordered line items plus the displayed total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    items: Vec<LineItem>,
    total: String,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: Price::ZERO.display(),
        }
    }
}

impl Ledger {
    /// Create an empty ledger showing `$0.00`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger from storage, or an empty one if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the backend cannot be read.
    pub fn restore<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self, CartError> {
        let mut ledger = Self::new();
        ledger.load(store)?;
        Ok(ledger)
    }

    /// Current line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// The displayed total string (e.g. `$29.97`).
    #[must_use]
    pub fn total(&self) -> &str {
        &self.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Project the ledger into order table rows.
    #[must_use]
    pub fn rows(&self) -> Vec<OrderRow> {
        self.items
            .iter()
            .map(|item| OrderRow {
                title: item.title.clone(),
                quantity: item.quantity,
                price: item.line_total().display(),
            })
            .collect()
    }

    /// Add a product to the cart.
    ///
    /// The shopper's `confirmation` is checked before anything else: a
    /// declined add does no validation and no mutation. An accepted add
    /// validates `quantity` (raw input text), appends the line, recomputes
    /// the total and saves.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Quantity`] for an invalid or too-large quantity,
    /// [`CartError::TotalTooLarge`] if the order total would overflow, or a
    /// storage error if saving fails. The ledger is unchanged on error.
    pub fn add<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        confirmation: Confirmation,
        title: &str,
        quantity: &str,
        unit_price: Price,
    ) -> Result<AddOutcome, CartError> {
        if confirmation == Confirmation::Declined {
            debug!(title, "Add declined");
            return Ok(AddOutcome::Declined);
        }

        let quantity = Quantity::parse(quantity)?;
        let line = LineItem::new(title, quantity, unit_price);
        let fits = self
            .items
            .iter()
            .chain([&line])
            .try_fold(Price::ZERO, |sum, item| {
                sum.checked_add(item.unit_price.checked_times(item.quantity)?)
            })
            .is_some();
        if !fits {
            warn!(title, quantity = quantity.get(), "Order total would overflow");
            return Err(CartError::TotalTooLarge);
        }

        self.items.push(line);
        self.update_total();

        if let Err(e) = self.save(store) {
            self.items.pop();
            self.update_total();
            return Err(e);
        }

        info!(title, quantity = quantity.get(), total = %self.total, "Added to cart");
        Ok(AddOutcome::Added {
            title: title.to_string(),
            quantity,
        })
    }

    /// Remove the line at `position`, recompute the total and save.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownLine`] if there is no such line, or a
    /// storage error if saving fails.
    pub fn remove<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        position: usize,
    ) -> Result<LineItem, CartError> {
        if position >= self.items.len() {
            debug!(position, lines = self.items.len(), "Remove of unknown line");
            return Err(CartError::UnknownLine);
        }
        let removed = self.items.remove(position);
        self.update_total();

        if let Err(e) = self.save(store) {
            self.items.insert(position, removed);
            self.update_total();
            return Err(e);
        }

        info!(title = %removed.title, total = %self.total, "Removed from cart");
        Ok(removed)
    }

    /// Recompute the displayed total from the current items.
    pub fn update_total(&mut self) {
        let sum: Price = self.items.iter().map(LineItem::line_total).sum();
        self.total = sum.display();
    }

    /// Persist the current items and displayed total under [`CART_KEY`].
    ///
    /// # Errors
    ///
    /// Returns a storage or encode error.
    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), CartError> {
        let record = CartRecord::snapshot(self);
        store.set(CART_KEY, record.encode()?)?;
        debug!(lines = self.items.len(), total = %self.total, "Cart data saved");
        Ok(())
    }

    /// Replace the ledger with the record stored under [`CART_KEY`].
    ///
    /// The stored total is shown verbatim. Returns `false` (and leaves the
    /// ledger untouched) when nothing usable is stored.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the backend cannot be read.
    pub fn load<S: KeyValueStore + ?Sized>(&mut self, store: &S) -> Result<bool, CartError> {
        let Some(record) = read_record(store, CART_KEY)? else {
            info!("No cart data found in storage");
            return Ok(false);
        };
        let Some(items) = record.line_items() else {
            info!("Stored cart data has a zero-quantity line; ignoring it");
            return Ok(false);
        };

        self.items = items;
        self.total = record.total;
        Ok(true)
    }

    /// Empty the ledger, show `$0.00` and delete the stored cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the delete fails.
    pub fn clear<S: KeyValueStore + ?Sized>(&mut self, store: &mut S) -> Result<(), CartError> {
        self.items.clear();
        self.update_total();
        store.remove(CART_KEY)?;
        info!("Cart cleared");
        Ok(())
    }

    /// Save the current ledger as the favorite order.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NothingToSaveAsFavourite`] for an empty ledger,
    /// or a storage or encode error.
    pub fn save_favorite<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), CartError> {
        if self.is_empty() {
            return Err(CartError::NothingToSaveAsFavourite);
        }
        let record = CartRecord::snapshot(self);
        store.set(FAVOURITE_KEY, record.encode()?)?;
        info!(lines = self.items.len(), "Favorite order saved");
        Ok(())
    }

    /// Replace the ledger with the saved favorite order.
    ///
    /// Unit prices are rebuilt as `line total / quantity` and the favorite's
    /// stored total is shown verbatim. The current cart record in storage is
    /// not touched; call [`Ledger::save`] to persist the result.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NoFavourite`] if nothing usable is stored,
    /// [`CartError::EmptyFavourite`] if the favorite has no lines, or a
    /// storage error. The ledger is unchanged on error.
    pub fn apply_favorite<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<(), CartError> {
        let record = read_record(store, FAVOURITE_KEY)?.ok_or(CartError::NoFavourite)?;
        if record.order_details.is_empty() {
            return Err(CartError::EmptyFavourite);
        }
        let items = record.line_items().ok_or(CartError::NoFavourite)?;

        self.items = items;
        self.total = record.total;
        info!(lines = self.items.len(), total = %self.total, "Favorite order applied");
        Ok(())
    }

    /// Save the cart before moving on to the cart page.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::EmptyCartAtBuyNow`] for an empty ledger, or a
    /// storage or encode error.
    pub fn buy_now<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), CartError> {
        if self.is_empty() {
            return Err(CartError::EmptyCartAtBuyNow);
        }
        self.save(store)
    }
}

fn read_record<S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<Option<CartRecord>, CartError> {
    Ok(store
        .get(key)?
        .and_then(|text| CartRecord::decode(key, &text)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::storage::{MemoryStore, StorageError};
    use crate::types::QuantityError;

    fn price(cents: i64) -> Price {
        Price::new(Decimal::new(cents, 2)).unwrap()
    }

    fn add(ledger: &mut Ledger, store: &mut MemoryStore, title: &str, qty: &str, cents: i64) {
        ledger
            .add(store, Confirmation::Accepted, title, qty, price(cents))
            .unwrap();
    }

    fn row(title: &str, quantity: u32, price: &str) -> OrderRow {
        OrderRow {
            title: title.to_string(),
            quantity,
            price: price.to_string(),
        }
    }

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.total(), "$0.00");
    }

    #[test]
    fn test_add_vitamin_c_scenario() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new();

        let outcome = ledger
            .add(
                &mut store,
                Confirmation::Accepted,
                "Vitamin C",
                "3",
                price(999),
            )
            .unwrap();

        assert_eq!(
            outcome.to_string(),
            "Vitamin C of 3 has been added to your cart."
        );
        assert_eq!(ledger.rows(), vec![row("Vitamin C", 3, "$29.97")]);
        assert_eq!(ledger.total(), "$29.97");
        assert!(store.contains(CART_KEY));
    }

    #[test]
    fn test_add_accepts_one_through_ten() {
        for q in 1..=10 {
            let mut store = MemoryStore::new();
            let mut ledger = Ledger::new();
            add(&mut ledger, &mut store, "Zinc", &q.to_string(), 100);
            assert_eq!(ledger.len(), 1);
        }
    }

    #[test]
    fn test_add_rejects_out_of_range() {
        let cases = [
            ("0", QuantityError::Invalid),
            ("-2", QuantityError::Invalid),
            ("", QuantityError::Invalid),
            ("abc", QuantityError::Invalid),
            ("11", QuantityError::TooMany),
            ("250", QuantityError::TooMany),
        ];
        for (input, expected) in cases {
            let mut store = MemoryStore::new();
            let mut ledger = Ledger::new();
            let err = ledger
                .add(&mut store, Confirmation::Accepted, "Zinc", input, price(100))
                .unwrap_err();
            assert!(
                matches!(err, CartError::Quantity(e) if e == expected),
                "input {input:?}"
            );
            assert!(ledger.is_empty());
            assert!(!store.is_dirty());
        }
    }

    #[test]
    fn test_declined_add_does_nothing_even_when_invalid() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new();
        for qty in ["3", "99"] {
            let outcome = ledger
                .add(&mut store, Confirmation::Declined, "Zinc", qty, price(100))
                .unwrap();
            assert_eq!(outcome, AddOutcome::Declined);
        }
        assert!(ledger.is_empty());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_total_tracks_sum_of_lines() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new();
        add(&mut ledger, &mut store, "Vitamin C", "3", 999);
        add(&mut ledger, &mut store, "Zinc", "10", 333);
        add(&mut ledger, &mut store, "Ibuprofen", "1", 450);

        let expected: Price = ledger.items().iter().map(LineItem::line_total).sum();
        assert_eq!(ledger.total(), expected.display());
        assert_eq!(ledger.total(), "$67.77");
    }

    #[test]
    fn test_add_rejects_line_that_overflows() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new();
        let huge = Price::new(Decimal::from_i128_with_scale(10_i128.pow(28), 0)).unwrap();

        let err = ledger
            .add(&mut store, Confirmation::Accepted, "X", "10", huge)
            .unwrap_err();
        assert!(matches!(err, CartError::TotalTooLarge));
        assert!(err.is_validation());
        assert!(ledger.is_empty());
        assert_eq!(ledger.total(), "$0.00");
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_add_rejects_line_that_overflows_the_total() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new();
        let huge = Price::new(Decimal::from_i128_with_scale(4 * 10_i128.pow(28), 0)).unwrap();

        ledger
            .add(&mut store, Confirmation::Accepted, "X", "1", huge)
            .unwrap();
        let before = ledger.clone();
        let err = ledger
            .add(&mut store, Confirmation::Accepted, "Y", "1", huge)
            .unwrap_err();
        assert!(matches!(err, CartError::TotalTooLarge));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_remove_line() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new();
        add(&mut ledger, &mut store, "Vitamin C", "3", 999);
        add(&mut ledger, &mut store, "Zinc", "2", 600);

        let removed = ledger.remove(&mut store, 0).unwrap();
        assert_eq!(removed.title, "Vitamin C");
        assert_eq!(ledger.rows(), vec![row("Zinc", 2, "$12.00")]);
        assert_eq!(ledger.total(), "$12.00");

        let reloaded = Ledger::restore(&store).unwrap();
        assert_eq!(reloaded.rows(), ledger.rows());
    }

    #[test]
    fn test_remove_unknown_line() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new();
        let err = ledger.remove(&mut store, 0).unwrap_err();
        assert!(matches!(err, CartError::UnknownLine));
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new();
        add(&mut ledger, &mut store, "Vitamin C", "3", 999);
        add(&mut ledger, &mut store, "Cough Syrup", "7", 1249);
        ledger.save(&mut store).unwrap();

        let mut loaded = Ledger::new();
        assert!(loaded.load(&store).unwrap());
        assert_eq!(loaded.rows(), ledger.rows());
        assert_eq!(loaded.total(), ledger.total());
    }

    #[test]
    fn test_load_sets_total_verbatim() {
        let store = MemoryStore::hydrate([(
            CART_KEY,
            r#"{"orderDetails":[{"title":"A","quantity":1,"price":5}],"total":"$999.99"}"#,
        )]);
        let mut ledger = Ledger::new();
        assert!(ledger.load(&store).unwrap());
        assert_eq!(ledger.total(), "$999.99");
        assert_eq!(ledger.rows(), vec![row("A", 1, "$5.00")]);

        ledger.update_total();
        assert_eq!(ledger.total(), "$5.00");
    }

    #[test]
    fn test_load_absent_or_malformed_leaves_ledger_untouched() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new();
        add(&mut ledger, &mut store, "Zinc", "1", 600);
        let before = ledger.clone();

        let empty = MemoryStore::new();
        assert!(!ledger.load(&empty).unwrap());
        assert_eq!(ledger, before);

        let garbage = MemoryStore::hydrate([(CART_KEY, "not json")]);
        assert!(!ledger.load(&garbage).unwrap());
        assert_eq!(ledger, before);

        let zero = MemoryStore::hydrate([(
            CART_KEY,
            r#"{"orderDetails":[{"title":"A","quantity":0,"price":5}],"total":"$5.00"}"#,
        )]);
        assert!(!ledger.load(&zero).unwrap());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_clear() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new();
        add(&mut ledger, &mut store, "Zinc", "4", 600);
        ledger.save_favorite(&mut store).unwrap();

        ledger.clear(&mut store).unwrap();
        assert!(ledger.rows().is_empty());
        assert_eq!(ledger.total(), "$0.00");
        assert!(!store.contains(CART_KEY));
        assert!(store.contains(FAVOURITE_KEY));
    }

    #[test]
    fn test_save_favorite_rejects_empty() {
        let mut store = MemoryStore::new();
        let ledger = Ledger::new();
        let err = ledger.save_favorite(&mut store).unwrap_err();
        assert!(matches!(err, CartError::NothingToSaveAsFavourite));
        assert!(!store.contains(FAVOURITE_KEY));
    }

    #[test]
    fn test_apply_favorite_replaces_cart() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new();
        add(&mut ledger, &mut store, "Vitamin C", "3", 999);
        ledger.save_favorite(&mut store).unwrap();

        ledger.clear(&mut store).unwrap();
        add(&mut ledger, &mut store, "Zinc", "1", 600);

        ledger.apply_favorite(&store).unwrap();
        assert_eq!(ledger.rows(), vec![row("Vitamin C", 3, "$29.97")]);
        assert_eq!(ledger.items()[0].unit_price, price(999));
        assert_eq!(ledger.total(), "$29.97");

        // The stored cart still holds what was there before applying.
        let stored = Ledger::restore(&store).unwrap();
        assert_eq!(stored.rows(), vec![row("Zinc", 1, "$6.00")]);
    }

    #[test]
    fn test_apply_favorite_keeps_stored_total_verbatim() {
        let store = MemoryStore::hydrate([(
            FAVOURITE_KEY,
            r#"{"orderDetails":[{"title":"A","quantity":3,"price":10}],"total":"$10.00"}"#,
        )]);
        let mut ledger = Ledger::new();
        ledger.apply_favorite(&store).unwrap();

        assert_eq!(ledger.total(), "$10.00");
        assert_eq!(ledger.rows(), vec![row("A", 3, "$10.00")]);
        assert_eq!(ledger.items()[0].unit_price.display(), "$3.33");
    }

    #[test]
    fn test_apply_favorite_absent_or_empty_leaves_ledger_unchanged() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::new();
        add(&mut ledger, &mut store, "Zinc", "1", 600);
        let before = ledger.clone();

        let err = ledger.apply_favorite(&store).unwrap_err();
        assert!(matches!(err, CartError::NoFavourite));
        assert_eq!(ledger, before);

        store
            .set(
                FAVOURITE_KEY,
                r#"{"orderDetails":[],"total":"$0.00"}"#.to_string(),
            )
            .unwrap();
        let err = ledger.apply_favorite(&store).unwrap_err();
        assert!(matches!(err, CartError::EmptyFavourite));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_buy_now() {
        let mut store = MemoryStore::new();
        let ledger = Ledger::new();
        let err = ledger.buy_now(&mut store).unwrap_err();
        assert!(matches!(err, CartError::EmptyCartAtBuyNow));

        let mut ledger = Ledger::new();
        add(&mut ledger, &mut store, "Zinc", "1", 600);
        store.remove(CART_KEY).unwrap();
        ledger.buy_now(&mut store).unwrap();
        assert!(store.contains(CART_KEY));
    }

    #[test]
    fn test_add_rolls_back_when_save_fails() {
        let mut store = MemoryStore::new().with_max_value_len(8);
        let mut ledger = Ledger::new();
        let err = ledger
            .add(&mut store, Confirmation::Accepted, "Zinc", "1", price(600))
            .unwrap_err();
        assert!(matches!(
            err,
            CartError::Storage(StorageError::QuotaExceeded(_))
        ));
        assert!(ledger.is_empty());
        assert_eq!(ledger.total(), "$0.00");
    }
}
