//! The cart ledger.
//!
//! A [`Ledger`] is the ordered list of line items a shopper has added plus the
//! displayed total. It is persisted as a [`CartRecord`] under [`CART_KEY`]; a
//! second snapshot, the favorite order, lives under [`FAVOURITE_KEY`] and is
//! only touched by [`Ledger::save_favorite`] and [`Ledger::apply_favorite`].
//!
//! # Invariant
//!
//! After every mutating operation the displayed total equals the formatted
//! sum of line totals. The two exceptions are [`Ledger::load`] and
//! [`Ledger::apply_favorite`], which show the stored total string verbatim.

mod ledger;
mod record;

pub use ledger::{Ledger, LineItem, OrderRow};
pub use record::{CART_KEY, CartRecord, FAVOURITE_KEY, RecordLine};

use core::fmt;

use thiserror::Error;

use crate::storage::StorageError;
use crate::types::{Quantity, QuantityError};

/// Shopper-facing notice after saving a favorite.
pub const FAVOURITE_SAVED: &str = "Your favorite order has been saved.";

/// Shopper-facing notice after applying a favorite.
pub const FAVOURITE_APPLIED: &str = "Your favorite medicines have been applied to your cart.";

/// Errors from cart and checkout operations.
///
/// Every variant except [`CartError::Storage`] and [`CartError::Encode`] is a
/// validation failure: nothing was mutated and the `Display` text is meant
/// for the shopper.
#[derive(Debug, Error)]
pub enum CartError {
    /// The requested quantity is out of range or not a number.
    #[error(transparent)]
    Quantity(#[from] QuantityError),

    /// Saving a favorite from an empty cart.
    #[error("Your cart is empty. Please add items to save as a favorite.")]
    NothingToSaveAsFavourite,

    /// Applying a favorite that was never saved.
    #[error("Oops! No favorite order found. Please save a favorite order first.")]
    NoFavourite,

    /// Applying a favorite that has no items.
    #[error("Oops! Your favorite order is empty. Please save a valid order.")]
    EmptyFavourite,

    /// Proceeding to the cart page with nothing in it.
    #[error("Oops! Your cart is empty. Please add some products before proceeding to checkout.")]
    EmptyCartAtBuyNow,

    /// Paying for an empty cart.
    #[error("Your cart is empty. Please add some products before proceeding to payment.")]
    EmptyCartAtPayment,

    /// One or more required checkout fields are blank.
    #[error("Please fill in all required fields before proceeding to payment.")]
    MissingRequiredFields,

    /// The new line would push the order total past what can be represented.
    #[error("We are sorry, that order is too large to process.")]
    TotalTooLarge,

    /// Removing a line that does not exist.
    #[error("That item is no longer in your cart.")]
    UnknownLine,

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A record could not be serialized.
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CartError {
    /// Whether this is a validation failure the shopper can fix by retrying.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Encode(_))
    }
}

/// The shopper's answer to "Add {title} to your cart?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Accepted,
    Declined,
}

/// Result of a successful [`Ledger::add`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The line was appended and the cart saved.
    Added { title: String, quantity: Quantity },
    /// The shopper cancelled; nothing changed.
    Declined,
}

impl fmt::Display for AddOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { title, quantity } => {
                write!(f, "{title} of {quantity} has been added to your cart.")
            }
            Self::Declined => f.write_str("Nothing was added to your cart."),
        }
    }
}

/// The question shown before an add is committed.
#[must_use]
pub fn confirmation_prompt(title: &str) -> String {
    format!("Add {title} to your cart?")
}
