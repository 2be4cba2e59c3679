//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog page (categories + order table)
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Cart
//! POST /cart/add               - Ask for add confirmation (renders prompt)
//! POST /cart/add/confirm       - Accept or cancel a pending add
//! POST /cart/remove            - Remove one line
//! POST /cart/reset             - Clear the cart
//! POST /cart/favourite         - Save current cart as favorite
//! POST /cart/favourite/apply   - Apply saved favorite
//! POST /cart/buy-now           - Save and go to the cart page
//!
//! # Checkout
//! GET  /cart                   - Cart page (order table + reservation form)
//! POST /cart/pay               - Run the checkout gates
//! ```
//!
//! Every POST redirects (303) back to a page, carrying its outcome as a
//! one-shot notice, except `/cart/add` (renders the prompt) and a rejected
//! `/cart/pay` (re-renders the form with annotations).

pub mod cart;
pub mod catalog;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/add/confirm", post(cart::confirm_add))
        .route("/remove", post(cart::remove))
        .route("/reset", post(cart::reset))
        .route("/favourite", post(cart::save_favourite))
        .route("/favourite/apply", post(cart::apply_favourite))
        .route("/buy-now", post(cart::buy_now))
        .route("/pay", post(cart::pay))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Catalog page
        .route("/", get(catalog::index))
        // Cart, favorites and checkout
        .nest("/cart", cart_routes())
}
