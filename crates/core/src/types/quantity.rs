//! Order quantity entered on a product card.

use core::fmt;

/// Errors that can occur when parsing a [`Quantity`].
///
/// The two variants are surfaced to shoppers with different messages, so
/// their `Display` output is the user-facing text.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero, negative, or not a number at all.
    #[error("Please enter a valid quantity.")]
    Invalid,
    /// Above [`Quantity::MAX`].
    #[error("We are sorry, you cannot purchase more than {max} items.", max = Quantity::MAX)]
    TooMany,
}

/// A quantity between 1 and [`Quantity::MAX`] inclusive.
///
/// ## Examples
///
/// ```
/// use medicart_core::{Quantity, QuantityError};
///
/// assert_eq!(Quantity::parse("3").unwrap().get(), 3);
/// assert_eq!(Quantity::parse("11"), Err(QuantityError::TooMany));
/// assert_eq!(Quantity::parse("0"), Err(QuantityError::Invalid));
/// assert_eq!(Quantity::parse("lots"), Err(QuantityError::Invalid));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(u32);

impl Quantity {
    /// Largest quantity a single add may request.
    pub const MAX: u32 = 10;

    /// Validate an integer quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::TooMany`] above the maximum and
    /// [`QuantityError::Invalid`] for anything below one.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value > i64::from(Self::MAX) {
            return Err(QuantityError::TooMany);
        }
        match u32::try_from(value) {
            Ok(n) if n >= 1 => Ok(Self(n)),
            _ => Err(QuantityError::Invalid),
        }
    }

    /// Parse the raw text of a quantity input.
    ///
    /// Leading whitespace and an optional sign are accepted, then the longest
    /// run of digits is used and anything after it ignored, so `"3 boxes"`
    /// and `"3.5"` both mean three. Input without a leading integer is
    /// invalid.
    ///
    /// # Errors
    ///
    /// See [`Quantity::new`].
    pub fn parse(input: &str) -> Result<Self, QuantityError> {
        leading_integer(input).map_or(Err(QuantityError::Invalid), Self::new)
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extract the leading (optionally signed) integer of `input`.
///
/// Values too large for `i64` saturate so they still read as "too many".
fn leading_integer(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = trimmed.strip_prefix('-').map_or_else(
        || (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        |rest| (true, rest),
    );

    let digits = rest
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .unwrap_or_default();
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}
