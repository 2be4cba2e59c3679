//! Medicart Core - cart ledger, catalog and checkout logic.
//!
//! This crate provides the storage-agnostic pieces shared by:
//! - `storefront` - The HTTP server that renders the catalog and cart pages
//! - `integration-tests` - End-to-end tests against the storefront router
//!
//! # Architecture
//!
//! The core crate contains only types, traits and synchronous logic - no
//! network, no filesystem, no HTTP. Persistence goes through the
//! [`KeyValueStore`] port, which the storefront backs with the visitor's
//! session.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product ids, prices and quantities
//! - [`catalog`] - Product catalog document model
//! - [`storage`] - Key-value persistence port and an in-memory implementation
//! - [`cart`] - The cart ledger and its persisted record shape
//! - [`checkout`] - Checkout form validation and payment simulation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod storage;
pub mod types;

pub use cart::{AddOutcome, CartError, CartRecord, Confirmation, Ledger, LineItem, OrderRow};
pub use catalog::{Catalog, CatalogError, Category, Product};
pub use checkout::{Checkout, CheckoutForm, FormField, Receipt};
pub use storage::{Change, KeyValueStore, MemoryStore, StorageError};
pub use types::*;
