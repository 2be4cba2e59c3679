//! Checkout form validation and simulated payment.
//!
//! Paying runs two gates in a fixed order:
//!
//! 1. **Emptiness** - an empty ledger aborts immediately; the form is not
//!    looked at, so no field gets annotated.
//! 2. **Required fields** - every required field must be non-blank after
//!    trimming. Failing fields are flagged and annotated; fields that pass
//!    lose any earlier annotation.
//!
//! Passing both computes a delivery date a fixed number of days out and
//! clears the ledger.

use chrono::{Days, NaiveDate};
use tracing::info;

use crate::cart::{CartError, Ledger};
use crate::storage::KeyValueStore;

/// Inline annotation attached to a blank required field.
pub const REQUIRED_MESSAGE: &str = "This field is required.";

/// Days between payment and delivery.
pub const DEFAULT_DELIVERY_DAYS: u64 = 2;

/// One input of the checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub value: String,
    pub required: bool,
    error: Option<&'static str>,
}

impl FormField {
    /// A required field with an empty value.
    #[must_use]
    pub fn required(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            value: String::new(),
            required: true,
            error: None,
        }
    }

    /// An optional field with an empty value.
    #[must_use]
    pub fn optional(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, label)
        }
    }

    /// The inline annotation, if the field failed validation.
    #[must_use]
    pub const fn error(&self) -> Option<&'static str> {
        self.error
    }

    /// Whether the field is flagged (rendered with the error border).
    #[must_use]
    pub const fn is_flagged(&self) -> bool {
        self.error.is_some()
    }

    /// Check the field, setting or clearing its annotation.
    ///
    /// Idempotent: validating twice never stacks annotations.
    pub fn validate(&mut self) -> bool {
        let valid = !self.required || !self.value.trim().is_empty();
        self.error = if valid { None } else { Some(REQUIRED_MESSAGE) };
        valid
    }
}

/// The checkout ("reservation") form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutForm {
    fields: Vec<FormField>,
}

impl CheckoutForm {
    #[must_use]
    pub const fn new(fields: Vec<FormField>) -> Self {
        Self { fields }
    }

    /// Copy submitted values into matching fields; unknown names are ignored.
    pub fn fill<'a, I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (name, value) in values {
            if let Some(field) = self.fields.iter_mut().find(|f| f.name == name) {
                field.value = value.to_string();
            }
        }
    }

    #[must_use]
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate every field. Returns `true` if all passed.
    pub fn validate(&mut self) -> bool {
        self.fields
            .iter_mut()
            .fold(true, |all_valid, field| field.validate() && all_valid)
    }
}

/// Proof of a completed (simulated) payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub delivery_date: NaiveDate,
}

impl Receipt {
    /// Delivery date as `Weekday, Month D, YYYY`.
    #[must_use]
    pub fn formatted_delivery_date(&self) -> String {
        format_delivery_date(self.delivery_date)
    }

    /// The thank-you notice shown after payment.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Thank you for your purchase! Your order will be delivered by {}.",
            self.formatted_delivery_date()
        )
    }
}

/// Format a date like `Monday, October 19, 2026`.
#[must_use]
pub fn format_delivery_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// Runs the checkout gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkout {
    delivery_days: u64,
}

impl Default for Checkout {
    fn default() -> Self {
        Self::new(DEFAULT_DELIVERY_DAYS)
    }
}

impl Checkout {
    #[must_use]
    pub const fn new(delivery_days: u64) -> Self {
        Self { delivery_days }
    }

    /// Delivery date for an order paid on `today`.
    #[must_use]
    pub fn delivery_date(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_days(Days::new(self.delivery_days))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Attempt payment.
    ///
    /// On success the ledger is cleared (including its stored record) and the
    /// receipt carries the delivery date.
    ///
    /// # Errors
    ///
    /// - [`CartError::EmptyCartAtPayment`] if the ledger has no lines; the
    ///   form is left as it was.
    /// - [`CartError::MissingRequiredFields`] if any required field is blank;
    ///   fields are annotated and the ledger is untouched.
    /// - A storage error if clearing the stored cart fails.
    pub fn pay<S: KeyValueStore + ?Sized>(
        &self,
        ledger: &mut Ledger,
        form: &mut CheckoutForm,
        store: &mut S,
        today: NaiveDate,
    ) -> Result<Receipt, CartError> {
        if ledger.is_empty() {
            return Err(CartError::EmptyCartAtPayment);
        }
        if !form.validate() {
            return Err(CartError::MissingRequiredFields);
        }

        let receipt = Receipt {
            delivery_date: self.delivery_date(today),
        };
        ledger.clear(store)?;
        info!(delivery_date = %receipt.delivery_date, "Payment completed");
        Ok(receipt)
    }
}
